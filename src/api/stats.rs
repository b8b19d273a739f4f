use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    // Mining flag first: lock order is mining slot before ledger.
    let mining_in_progress = state.node.is_mining();

    let bc = state.node.ledger();
    let height = bc.len();

    // last interval between the two newest blocks
    let last_interval_ms = if height >= 2 {
        let newer = &bc.chain[height - 1];
        let older = &bc.chain[height - 2];
        Some((newer.timestamp - older.timestamp).max(0))
    } else {
        None
    };

    HttpResponse::Ok().json(StatsResponse {
        height,
        mined_blocks: bc.mined_blocks(),
        difficulty: bc.difficulty(),
        initial_difficulty: bc.initial_difficulty(),
        mining_reward: bc.mining_reward(),
        adjustment_interval: bc.adjustment_interval(),
        next_adjustment_height: bc.next_adjustment_height(),
        pending_size: bc.pending_transactions().len(),
        mining_in_progress,
        last_interval_ms,
    })
}
