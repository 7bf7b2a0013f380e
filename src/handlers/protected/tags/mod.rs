pub mod collection;
pub mod contacts;
pub mod record;

pub use collection::get as tags_get;
pub use collection::post as tags_post;
pub use record::delete as tag_delete;
pub use record::put as tag_put;

pub use contacts::available_get as tag_available_contacts_get;
pub use contacts::bulk_post as tag_contacts_bulk_post;
pub use contacts::delete as tag_contact_delete;
pub use contacts::get as tag_contacts_get;
pub use contacts::post as tag_contacts_post;
