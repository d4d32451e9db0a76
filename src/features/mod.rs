pub mod governments;
pub mod petitions;
pub mod users;

use crate::core::store::Store;
use crate::features::governments::GOVERNMENTS_COLLECTION;
use crate::features::petitions::PETITIONS_COLLECTION;
use crate::features::users::USERS_COLLECTION;

/// Registers the reference fields that `populate` can resolve.
pub fn register_references(store: Store) -> Store {
    store
        .with_reference(PETITIONS_COLLECTION, "government", GOVERNMENTS_COLLECTION)
        .with_reference(PETITIONS_COLLECTION, "author", USERS_COLLECTION)
        .with_reference(PETITIONS_COLLECTION, "cosigners", USERS_COLLECTION)
}
