pub mod service;

pub use service::UserService;

pub const USERS_COLLECTION: &str = "users";
