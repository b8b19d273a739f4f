use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Name of the cookie carrying the caller's address.
pub const ADDRESS_COOKIE: &str = "address";

/// Cookie lifetime in days.
pub const ADDRESS_COOKIE_DAYS: i64 = 60;

/// Issue a fresh opaque address: hex SHA-256 of a random UUID.
///
/// This is an identifier only. It is not derived from any key and proves
/// nothing about who holds it.
pub fn new_address() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    hex::encode(hasher.finalize())
}
