mod api;
mod classifier;
mod config;
mod model;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::post, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::classifier::{BertForAdClassification, Device};
use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ad_classifier=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    let device = Device::cuda_if_available(0).expect("Failed to initialise compute device");
    tracing::info!(
        "Loading model from {} on {:?}",
        config.model_path.display(),
        device
    );
    let classifier = BertForAdClassification::load(&config.model_path, device)
        .expect("Failed to load model artifacts");
    tracing::info!("Model loaded");

    let state = Arc::new(AppState { classifier });

    let app = Router::new()
        .route("/analyze", post(api::analyze_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .await
        .expect("Server error");
}
