pub mod auth;
pub mod odb;
pub mod user;
pub mod validators;

pub use auth::AuthController;
pub use odb::OdbController;
pub use user::UserController;
