/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

use std::sync::Arc;

use actix::Actor;
use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing::info;
use wp_api::{
    actors::registry::ChannelRegistry,
    api::configure_api_routes,
    config::Config,
    media_duration::{DurationProvider, HlsDurationFetcher},
    models::AppState,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    let registry = ChannelRegistry::new().start();
    let durations: Arc<dyn DurationProvider> = Arc::new(HlsDurationFetcher::new());
    let state = web::Data::new(AppState {
        registry,
        durations,
    });

    let allow_origins = config.allow_origins.clone();
    info!(port = config.port, origins = ?allow_origins, "starting watch-party server");

    HttpServer::new(move || {
        let cors = if allow_origins.is_empty() {
            Cors::permissive()
        } else {
            let mut cors = Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allow_any_header();
            for origin in &allow_origins {
                cors = cors.allowed_origin(origin);
            }
            cors
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure_api_routes)
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
