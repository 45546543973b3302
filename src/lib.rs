pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    advert_repository::PgAdvertRepository,
    advert_service::AdvertService,
    short_link_service::{BitlyShortener, UrlShortener},
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub advert_service: AdvertService,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        let shortener = config.bitly_access_token.clone().map(|token| {
            Arc::new(BitlyShortener::new(
                http_client,
                config.bitly_api_url.clone(),
                token,
            )) as Arc<dyn UrlShortener>
        });

        let advert_service = AdvertService::new(
            Arc::new(PgAdvertRepository::new(pool)),
            shortener,
            config.lifecycle_windows(),
            config.default_url_host.clone(),
            config.site_name.clone(),
        );

        Ok(Self::from_service(advert_service))
    }

    pub fn from_service(advert_service: AdvertService) -> Self {
        Self { advert_service }
    }
}
