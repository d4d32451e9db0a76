pub mod service;

pub use service::PetitionService;

pub const PETITIONS_COLLECTION: &str = "petitions";
