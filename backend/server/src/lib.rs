//! Documentation of the lost and found desk backend.
//!
//!
//!
//! # General Infrastructure
//! - One axum process holds every listed item, claim and photo in memory
//! - Student records come from a CSV file read once at startup and served back as-is
//! - The kiosk and any browser frontend talk to the same routes
//! - Restarting the process forgets every item and claim
//!
//!
//!
//! # Claim Flow
//!
//! **Goal**: An item leaves the listing exactly once, and only with a face capture attached.
//!
//! - Kiosk opens a claim session for a listed item and waits for a face or the manual override
//! - Kiosk posts the claimant's student number, name and the captured frame to `/api/claim/{id}`
//! - Server resolves the student number against the directory, rejects unknown students
//! - Server rejects a claim without a photo
//! - Item moves from the listing into the claimed list under the next `C-` id
//! - A second claim on the same item gets `409 Conflict`
//!
//!
//!
//! # Routes
//!
//! | Method | Path | Body | Returns |
//! |--------|------|------|---------|
//! | GET | `/students.csv` | | directory CSV |
//! | GET | `/api/items?q=&category=&location=` | | unclaimed items |
//! | POST | `/api/submit` | multipart form | item, `201` |
//! | POST | `/api/items/{id}/verify` | JSON credentials | item or `403` |
//! | PUT | `/api/items/{id}` | JSON credentials and edit | item |
//! | POST | `/api/claim/{id}` | multipart claim | claim receipt |
//! | GET | `/api/claimed-items` | | claimed items |
//! | POST | `/api/claimed-items/{id}/appeal` | JSON appeal | appeal ticket |
//! | GET | `/api/photos/{key}` | | photo bytes |
//!
//!
//!
//! # Notes
//!
//! ## Passwords
//! Reporter passwords sit next to the item inside the store and never reach a response body.
//! They only gate the two-step edit.
//!
//! ## Appeals
//! Appeals produce a ticket and a log line. Nothing reviews them yet.
//!
//!
//!
//! # Setup
//!
//! Run with logs.
//! ```sh
//! RUST_LOG=info STUDENTS_CSV=students.csv cargo run -p lostfound
//! ```
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Error;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post, put},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use config::Config;
use routes::{
    appeal_handler, claim_handler, claimed_items_handler, items_handler, photo_handler,
    students_handler, submit_handler, update_handler, verify_handler,
};
use state::State;

pub async fn start_server() -> Result<(), Error> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new(Config::load())?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/students.csv", get(students_handler))
        .route("/api/items", get(items_handler))
        .route("/api/submit", post(submit_handler))
        .route("/api/items/{id}/verify", post(verify_handler))
        .route("/api/items/{id}", put(update_handler))
        .route("/api/claim/{id}", post(claim_handler))
        .route("/api/claimed-items", get(claimed_items_handler))
        .route("/api/claimed-items/{id}/appeal", post(appeal_handler))
        .route("/api/photos/{key}", get(photo_handler))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
