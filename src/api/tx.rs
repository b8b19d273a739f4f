use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use log::{debug, info};

use super::caller_address;
use super::models::{AppState, NewTxRequest, NewTxResponse, PendingResponse};
use crate::error::LedgerError;
use crate::transaction::Transaction;

/// Submit a new transaction into the pending pool.
#[post("/tx/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<NewTxRequest>,
) -> Result<HttpResponse, LedgerError> {
    let body = body.into_inner();
    let from = body
        .from
        .filter(|f| !f.trim().is_empty())
        .or_else(|| caller_address(&req));
    debug!("POST /tx/ - received: from={:?} to={} amount={}", from, body.to, body.amount);

    let tx = Transaction::new(from, body.to, body.amount);
    let pending_size = state.node.submit_transaction(tx.clone())?;

    info!("POST /tx/ - accepted (pending size {})", pending_size);
    Ok(HttpResponse::Ok().json(NewTxResponse {
        transaction: tx,
        pending_size,
    }))
}

/// List the pending pool.
#[get("/pending/")]
pub async fn get_pending(state: web::Data<AppState>) -> impl Responder {
    let bc = state.node.ledger();
    let pending = bc.pending_transactions();
    HttpResponse::Ok().json(PendingResponse {
        size: pending.len(),
        transactions: pending,
    })
}
