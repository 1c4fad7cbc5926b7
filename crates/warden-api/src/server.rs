//! HTTP server configuration and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response logging
//! 3. Timeout enforcement (`request_timeout`, 60s default)
//! 4. Handler execution
//!
//! # Graceful Shutdown
//!
//! On SIGTERM or CTRL+C the server stops accepting connections and lets
//! in-flight requests finish. A deletion that is interrupted mid-pipeline
//! is not resumed; rerunning it is safe because every step tolerates rows
//! that are already gone.

use std::{net::SocketAddr, time::Duration};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{handlers, AppState};

/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Creates the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use warden_api::{create_router, AppState, Config};
///
/// fn build(config: &Config) -> anyhow::Result<axum::Router> {
///     let state = AppState::from_config(config)?;
///     Ok(create_router(state, config.request_timeout()))
/// }
/// ```
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let service_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health_check));

    let admin_routes = Router::new().route("/api/admin/users/delete", post(handlers::delete_user));

    let auth_routes = Router::new()
        .route("/api/auth/check-blacklist", post(handlers::check_blacklist))
        .route("/api/auth/status", post(handlers::auth_status))
        .route("/api/auth/test", get(handlers::auth_test));

    let payment_routes = Router::new()
        .route("/api/create-checkout-session", post(handlers::create_checkout_session))
        .route("/api/payment/verify", post(handlers::verify_payment))
        .route("/api/webhooks/stripe", post(handlers::stripe_webhook));

    let blast_routes = Router::new()
        .route("/api/blast/send", post(handlers::send_blast))
        .route("/api/blast/test", get(handlers::blast_test));

    let activity_routes = Router::new()
        .route("/api/recruiter-activity/log", post(handlers::log_activity))
        .route("/api/recruiter-activity/admin/all", get(handlers::list_all_activities))
        .route("/api/recruiter-activity/{recruiter_id}", get(handlers::list_activities));

    Router::new()
        .merge(service_routes)
        .merge(admin_routes)
        .merge(auth_routes)
        .merge(payment_routes)
        .merge(blast_routes)
        .merge(activity_routes)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Middleware to inject request ID into all responses.
async fn inject_request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let mut req = req;
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Starts the HTTP server with graceful shutdown support.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound.
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
    request_timeout: Duration,
) -> Result<(), std::io::Error> {
    let app = create_router(state, request_timeout);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Waiting for in-flight requests to complete");
}
