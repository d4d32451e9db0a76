pub mod dto;
pub mod handler;
pub mod service;

pub use dto::{GovernmentDto, LookupQueryDto};
pub use handler::{handle_get_government, handle_get_members, handle_get_petitions};
pub use service::{GovernmentService, MemberSource, PetitionSource};

pub const GOVERNMENTS_COLLECTION: &str = "governments";
