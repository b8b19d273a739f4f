//! In-memory proof-of-work ledger: hash-linked blocks of transfers, a
//! background nonce search, and an HTTP surface to drive it.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod node;
pub mod transaction;
pub mod wallet;

pub use blockchain::{Block, Blockchain};
pub use error::{LedgerError, ValidationError};
pub use node::Node;
pub use transaction::Transaction;
