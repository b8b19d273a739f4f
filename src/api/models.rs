use serde::{Deserialize, Serialize};

use crate::blockchain::Block;
use crate::config::Settings;
use crate::node::Node;
use crate::transaction::Transaction;

/// Shared application state: one ledger owner plus the settings it was built from.
pub struct AppState {
    pub node: Node,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            node: Node::new(settings.difficulty, settings.mining),
            settings,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/* ---------- Ledger API Models ---------- */

#[derive(Deserialize)]
pub struct NewLedgerRequest {
    pub difficulty: Option<u32>,
}

#[derive(Serialize)]
pub struct LedgerResponse {
    pub length: usize,
    pub difficulty: u32,
    pub mining_reward: i64,
    pub genesis_hash: String,
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub difficulty: u32,
    pub mining_reward: i64,
    pub chain: &'a [Block],
}

#[derive(Serialize)]
pub struct BlockResponse<'a> {
    pub index: usize,
    pub block: &'a Block,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct NewTxRequest {
    /// Falls back to the caller's address cookie.
    pub from: Option<String>,
    #[serde(default)]
    pub to: String,
    pub amount: i64,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub transaction: Transaction,
    pub pending_size: usize,
}

#[derive(Serialize)]
pub struct PendingResponse<'a> {
    pub size: usize,
    pub transactions: &'a [Transaction],
}

/* ---------- Mining API Models ---------- */

#[derive(Deserialize)]
pub struct MineRequest {
    /// Falls back to the caller's address cookie.
    pub reward_address: Option<String>,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub mined_index: usize,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub transactions: usize,
    pub next_difficulty: u32,
    pub mining_reward: i64,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/* ---------- Query API Models ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: i128,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub mined_blocks: u64,
    pub difficulty: u32,
    pub initial_difficulty: u32,
    pub mining_reward: i64,
    pub adjustment_interval: u64,
    pub next_adjustment_height: u64,
    pub pending_size: usize,
    pub mining_in_progress: bool,
    pub last_interval_ms: Option<i64>,
}

#[derive(Serialize)]
pub struct NewWalletResponse {
    pub address: String,
}
