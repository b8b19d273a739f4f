use actix_web::cookie::{Cookie, time::Duration};
use actix_web::{HttpResponse, Responder, post};
use log::debug;

use super::models::NewWalletResponse;
use crate::wallet::{ADDRESS_COOKIE, ADDRESS_COOKIE_DAYS, new_address};

/// Issue an opaque address and remember it in the caller's cookie.
#[post("/wallet/new/")]
pub async fn create_wallet() -> impl Responder {
    let address = new_address();
    let cookie = Cookie::build(ADDRESS_COOKIE, address.clone())
        .path("/")
        .max_age(Duration::days(ADDRESS_COOKIE_DAYS))
        .http_only(true)
        .finish();
    debug!("WALLET - issued {}", address);

    HttpResponse::Ok()
        .cookie(cookie)
        .json(NewWalletResponse { address })
}
