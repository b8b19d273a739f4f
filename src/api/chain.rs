use actix_web::{HttpResponse, Responder, get, post, web};
use log::info;

use super::models::{
    AppState, BlockResponse, ChainResponse, ErrorResponse, LedgerResponse, NewLedgerRequest,
    ValidateResponse,
};
use crate::error::LedgerError;

/// Create a fresh ledger, discarding the current one.
#[post("/ledger/")]
pub async fn create_ledger(
    state: web::Data<AppState>,
    body: Option<web::Json<NewLedgerRequest>>,
) -> Result<HttpResponse, LedgerError> {
    let difficulty = body
        .and_then(|b| b.into_inner().difficulty)
        .unwrap_or(state.settings.difficulty);
    state.node.reset(difficulty)?;

    let bc = state.node.ledger();
    info!("LEDGER - created (difficulty={})", bc.difficulty());
    Ok(HttpResponse::Ok().json(LedgerResponse {
        length: bc.len(),
        difficulty: bc.difficulty(),
        mining_reward: bc.mining_reward(),
        genesis_hash: bc.chain[0].hash.clone(),
    }))
}

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.node.ledger();
    let resp = ChainResponse {
        length: bc.len(),
        difficulty: bc.difficulty(),
        mining_reward: bc.mining_reward(),
        chain: &bc.chain,
    };
    HttpResponse::Ok().json(resp)
}

/// One block with its transactions.
#[get("/chain/{index}/")]
pub async fn get_block(state: web::Data<AppState>, path: web::Path<(usize,)>) -> impl Responder {
    let index = path.into_inner().0;
    let bc = state.node.ledger();
    match bc.chain.get(index) {
        Some(block) => HttpResponse::Ok().json(BlockResponse { index, block }),
        None => HttpResponse::NotFound().json(ErrorResponse {
            error: format!("no block at index {index} (length {})", bc.len()),
        }),
    }
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.node.ledger();
    let resp = ValidateResponse {
        valid: bc.is_valid_chain(),
        length: bc.len(),
        difficulty: bc.difficulty(),
    };
    HttpResponse::Ok().json(resp)
}
