pub mod collection;
pub mod record;

pub use collection::get as contacts_get;
pub use collection::post as contacts_post;
pub use record::delete as contact_delete;
pub use record::put as contact_put;
