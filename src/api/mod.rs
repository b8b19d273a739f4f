mod balance;
mod chain;
mod health;
mod mining;
pub mod models;
mod stats;
mod tx;
mod wallet;

use actix_web::http::StatusCode;
use actix_web::web::{self, ServiceConfig};
use actix_web::{HttpRequest, HttpResponse, ResponseError};

pub use models::AppState;

use crate::error::LedgerError;
use crate::wallet::ADDRESS_COOKIE;
use models::ErrorResponse;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::create_ledger)
            .service(chain::get_chain)
            .service(chain::get_block)
            .service(chain::validate_chain)
            .service(tx::post_transaction)
            .service(tx::get_pending)
            .service(mining::mine_block)
            .service(mining::cancel_mining)
            .service(balance::get_balance)
            .service(stats::get_stats)
            .service(wallet::create_wallet),
    );
}

/// Address stored in the caller's cookie by `/wallet/new/`, if any.
fn caller_address(req: &HttpRequest) -> Option<String> {
    req.cookie(ADDRESS_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::InvalidTransaction(_)
            | LedgerError::MissingRewardAddress
            | LedgerError::DifficultyOutOfRange(_) => StatusCode::BAD_REQUEST,
            LedgerError::MiningInProgress
            | LedgerError::MiningCancelled { .. }
            | LedgerError::StaleBlock => StatusCode::CONFLICT,
            LedgerError::MiningTimedOut { .. } | LedgerError::MiningExhausted { .. } => {
                StatusCode::REQUEST_TIMEOUT
            }
            LedgerError::InvalidProof | LedgerError::WorkerFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
