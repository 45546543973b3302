pub mod advert;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/adverts",
            get(advert::list_adverts).post(advert::create_advert),
        )
        .route("/api/adverts/states", get(advert::list_states))
        .route(
            "/api/adverts/:id",
            get(advert::get_advert).patch(advert::update_advert),
        )
        .route("/api/adverts/:id/advertise", post(advert::advertise))
        .route("/api/adverts/:id/bump", post(advert::bump))
        .route(
            "/api/adverts/:id/premium-upgrade",
            post(advert::premium_upgrade),
        )
        .route("/api/adverts/:id/archive", post(advert::archive))
        .route("/api/adverts/:id/unarchive", post(advert::unarchive))
        .route("/api/adverts/:id/short-url", get(advert::short_url))
        .route("/api/adverts/:id/contact", get(advert::contact))
}
