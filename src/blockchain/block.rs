use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::pow::{MiningControl, meets_difficulty};
use crate::error::LedgerError;
use crate::transaction::Transaction;

/// A single block in the chain holding an ordered batch of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub previous_hash: String,
    pub timestamp: i64, // Unix epoch milliseconds (UTC)
    pub transactions: Vec<Transaction>,
    pub nonce: u64,   // Proof-of-Work nonce
    pub hash: String, // Cached hash of the block
    /// Difficulty in force when the block was mined (0 for genesis).
    /// Recorded for validation; not part of the hash preimage.
    pub difficulty: u32,
}

impl Block {
    /// Create the genesis block (first block in the chain). Never mined.
    pub fn genesis(timestamp: i64) -> Self {
        Self::new_with_timestamp(String::from("0"), Vec::new(), timestamp)
    }

    /// Create a new block stamped with the current time (not mined yet).
    /// Call `mine()` to perform PoW.
    pub fn new(previous_hash: String, transactions: Vec<Transaction>) -> Self {
        Self::new_with_timestamp(previous_hash, transactions, Utc::now().timestamp_millis())
    }

    pub fn new_with_timestamp(
        previous_hash: String,
        transactions: Vec<Transaction>,
        timestamp: i64,
    ) -> Self {
        let mut block = Self {
            previous_hash,
            timestamp,
            transactions,
            nonce: 0,
            hash: String::new(),
            difficulty: 0,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Compute the SHA-256 hash of this block from
    /// `previous_hash ‖ timestamp ‖ transactions-as-JSON ‖ nonce`.
    /// The cached `hash` field is not refreshed by this call.
    pub fn compute_hash(&self) -> String {
        let txs_json = serde_json::to_string(&self.transactions).expect("serialize txs");
        let preimage = format!(
            "{}{}{}{}",
            self.previous_hash, self.timestamp, txs_json, self.nonce
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        let digest = hasher.finalize();
        hex::encode(digest)
    }

    /// Perform Proof-of-Work by finding a nonce that yields a hash
    /// starting with `difficulty` leading zeros (in hex). Blocks until found.
    pub fn mine(&mut self, difficulty: u32) {
        self.difficulty = difficulty;
        loop {
            self.hash = self.compute_hash();
            if meets_difficulty(&self.hash, difficulty) {
                break;
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
    }

    /// Same search as [`Block::mine`], but gives up when `control` says so.
    /// Returns the number of hashes evaluated.
    pub fn mine_with(
        &mut self,
        difficulty: u32,
        control: &MiningControl,
    ) -> Result<u64, LedgerError> {
        self.difficulty = difficulty;
        let mut attempts: u64 = 0;
        loop {
            self.hash = self.compute_hash();
            attempts += 1;
            if meets_difficulty(&self.hash, difficulty) {
                return Ok(attempts);
            }
            control.check(attempts)?;
            self.nonce = self.nonce.wrapping_add(1);
        }
    }

    /// Cached `hash` matches the content and satisfies `difficulty`.
    /// (Does NOT validate chain linkage.)
    pub fn is_valid(&self, difficulty: u32) -> bool {
        self.hash == self.compute_hash() && meets_difficulty(&self.hash, difficulty)
    }
}
