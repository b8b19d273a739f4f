use actix_web::{HttpRequest, HttpResponse, Responder, post, web};
use log::{info, warn};

use super::caller_address;
use super::models::{AppState, CancelResponse, MineRequest, MineResponse};
use crate::error::LedgerError;

/// Mine the pending pool into a new block.
///
/// The nonce search runs on a worker thread, so this handler never blocks
/// the server's event loop. Readers keep working while it runs.
#[post("/mine/")]
pub async fn mine_block(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<MineRequest>>,
) -> Result<HttpResponse, LedgerError> {
    let reward_address = body
        .and_then(|b| b.into_inner().reward_address)
        .filter(|a| !a.trim().is_empty())
        .or_else(|| caller_address(&req))
        .ok_or(LedgerError::MissingRewardAddress)?;

    let round = state.node.start_mining(&reward_address)?;
    let worker = state.clone();
    // A round the pool never ran is dropped with the closure, which frees the slot.
    let (mined_index, block) = match web::block(move || worker.node.finish_mining(round)).await {
        Ok(result) => result?,
        Err(e) => {
            warn!("MINER - worker pool unavailable: {e}");
            return Err(LedgerError::WorkerFailed);
        }
    };

    let (next_difficulty, mining_reward) = {
        let bc = state.node.ledger();
        (bc.difficulty(), bc.mining_reward())
    };
    info!(
        "MINER - sealed block #{} (hash={}, nonce={})",
        mined_index, block.hash, block.nonce
    );

    Ok(HttpResponse::Ok().json(MineResponse {
        mined_index,
        hash: block.hash,
        nonce: block.nonce,
        difficulty: block.difficulty,
        transactions: block.transactions.len(),
        next_difficulty,
        mining_reward,
    }))
}

/// Abort the mining round in flight, if any.
#[post("/mine/cancel/")]
pub async fn cancel_mining(state: web::Data<AppState>) -> impl Responder {
    let cancelled = state.node.cancel_mining();
    HttpResponse::Ok().json(CancelResponse { cancelled })
}
