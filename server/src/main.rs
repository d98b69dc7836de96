// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderName;
use server::config::{Config, StorageBackend};
use server::database::{self, DatabaseStorage};
use server::memory::MemStorage;
use server::routes;
use server::storage::{SharedStorage, Storage};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

async fn open_storage(config: &Config) -> anyhow::Result<SharedStorage> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::info!("Using the in-memory storage with demo data.");
            Ok(Arc::new(MemStorage::seeded()))
        }
        StorageBackend::Database => {
            config.database.warn_if_passwordless();
            let pool = database::establish_connection_pool(&config.database).await?;
            tracing::info!("Database connection was made successfully.");
            Ok(Arc::new(DatabaseStorage::new(pool)))
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let storage = open_storage(&config).await?;
    tracing::info!("Storage backend ready: {}", storage.backend_tag());

    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
        ])
        .allow_origin(Any);

    let app = routes::create_router(storage)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("The server listens on http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!("Server stopped: {:?}", e);
        std::process::exit(1);
    }
}
