pub mod password;

pub use password::update_password_put;
