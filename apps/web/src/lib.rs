//! # Hopline Web
//!
//! The wholesale storefront and admin console, served over HTTP.
//!
//! ## Module Organization
//! ```text
//! hopline_web/
//! ├── lib.rs          ◄─── You are here (startup & router)
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState and mutate-then-persist
//! │   ├── store.rs    ◄─── Mutex<AppStore>
//! │   ├── db.rs       ◄─── Database wrapper
//! │   ├── challenge.rs◄─── Pending login code
//! │   └── config.rs   ◄─── Environment configuration
//! ├── middleware/
//! │   └── auth.rs     ◄─── RequireCustomer / RequireAdmin guards
//! ├── commands/       ◄─── Route handlers
//! └── error.rs        ◄─── API error type
//! ```
//!
//! ## State Management
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppState (Clone, one per request)                                      │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌────────────────┐ ┌─────────────┐  │
//! │  │ StoreState   │ │ DbState      │ │ ChallengeState │ │ ConfigState │  │
//! │  │ theme, auth, │ │ local_store  │ │ one pending    │ │ bind, ns,   │  │
//! │  │ catalog,     │ │ blobs        │ │ OTP challenge  │ │ admins,     │  │
//! │  │ users, carts │ │              │ │                │ │ issuer      │  │
//! │  └──────────────┘ └──────────────┘ └────────────────┘ └─────────────┘  │
//! │                                                                         │
//! │  RemoteServices: hosted table mirror + code mailer                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod middleware;
pub mod state;

#[cfg(test)]
mod test_support;

use axum::routing::{delete, get, post, put};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hopline_db::{Database, DbConfig, DbError};
use hopline_sync::{RemoteConfig, RemoteServices};

use commands::{admin, auth, config, pages, storefront};
use state::{AppState, ConfigState};

/// Why the server could not start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("could not open the local database: {0}")]
    Database(#[from] DbError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Runs the server until Ctrl+C.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Initialize logging (RUST_LOG, default info)                         │
/// │  2. Read HOPLINE_* environment into ConfigState                         │
/// │  3. Load remote config (defaults → hopline.toml → env), build clients,  │
/// │     falling back to local only when they cannot be built                │
/// │  4. Open SQLite (WAL, migrations) under the configured namespace        │
/// │  5. Load every slice, falling back to the seed catalog                  │
/// │  6. Build the Router and serve with graceful shutdown                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), StartupError> {
    init_tracing();
    info!("Starting Hopline");

    let config = ConfigState::from_env();

    let remote_config = RemoteConfig::load_or_default(None);
    let remote = connect_remote(&remote_config);

    let db_path = config.resolve_database_path()?;
    info!(?db_path, namespace = %config.namespace, "Database path determined");
    let db = Database::new(DbConfig::new(db_path).namespace(config.namespace.clone())).await?;
    let store = db.state().load_store().await?;

    let bind = config.bind;
    let state = AppState::new(store, db, remote, config);
    let router = build_router(state);

    let listener = TcpListener::bind(bind).await?;
    info!(%bind, "Listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Builds the remote clients. Settings that cannot be used leave the app
/// running local only.
pub fn connect_remote(config: &RemoteConfig) -> RemoteServices {
    match RemoteServices::connect(config) {
        Ok(remote) => remote,
        Err(e) => {
            warn!(
                error = %e,
                config_error = e.is_config_error(),
                "Remote services unusable, running local only"
            );
            RemoteServices::local_only()
        }
    }
}

/// Every route, with request tracing.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route("/health", get(config::health))
        .route("/login", get(pages::login))
        .route("/signup", get(pages::signup))
        .route("/storefront", get(pages::storefront))
        .route("/admin", get(pages::admin))
        .route("/admin/merchants/{id}", get(pages::merchant));

    let public_api = Router::new()
        .route("/api/auth/request-code", post(auth::request_code))
        .route("/api/auth/verify", post(auth::verify_code))
        .route("/api/auth/signup", post(auth::request_signup))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/forget-device", post(auth::forget_device))
        .route("/api/session", get(auth::get_session))
        .route("/api/theme", get(config::get_theme).put(config::put_theme))
        .route("/api/config", get(config::get_config));

    let customer_api = Router::new()
        .route("/api/catalog", get(storefront::catalog))
        .route("/api/cart", get(storefront::get_cart))
        .route("/api/cart/items", post(storefront::add_item))
        .route("/api/cart/items/{id}", delete(storefront::remove_item))
        .route("/api/cart/items/{id}/increment", post(storefront::increment_item))
        .route("/api/cart/items/{id}/decrement", post(storefront::decrement_item))
        .route("/api/cart/checkout", post(storefront::checkout))
        .route("/api/orders", get(storefront::my_orders))
        .route("/api/orders/{id}/invoice", get(storefront::my_invoice));

    let admin_api = Router::new()
        .route("/api/admin/analytics", get(admin::analytics))
        .route("/api/admin/merchants", get(admin::merchants))
        .route("/api/admin/merchants/refresh", post(admin::refresh_merchants))
        .route("/api/admin/merchants/{id}", get(admin::merchant_detail))
        .route("/api/admin/merchants/{id}/approve", post(admin::approve_merchant))
        .route(
            "/api/admin/products",
            get(admin::products).post(admin::create_product),
        )
        .route("/api/admin/products/{id}", delete(admin::delete_product))
        .route("/api/admin/products/{id}/increment", post(admin::increment_stock))
        .route("/api/admin/products/{id}/decrement", post(admin::decrement_stock))
        .route("/api/admin/products/{id}/stock", put(admin::set_stock))
        .route("/api/admin/pos/products", get(admin::pos_products))
        .route("/api/admin/pos/cart", get(admin::pos_cart))
        .route("/api/admin/pos/items", post(admin::pos_add_item))
        .route("/api/admin/pos/items/{id}", delete(admin::pos_remove_item))
        .route("/api/admin/pos/items/{id}/increment", post(admin::pos_increment_item))
        .route("/api/admin/pos/items/{id}/decrement", post(admin::pos_decrement_item))
        .route("/api/admin/pos/items/{id}/price", put(admin::pos_set_price))
        .route("/api/admin/pos/checkout", post(admin::pos_checkout))
        .route("/api/admin/counter-sales", get(admin::counter_sales))
        .route("/api/admin/orders", get(admin::all_orders))
        .route("/api/admin/invoices/{id}", get(admin::invoice));

    Router::new()
        .merge(page_routes)
        .merge(public_api)
        .merge(customer_api)
        .merge(admin_api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=hopline=trace` - Trace for the hopline crates only
/// - Default: INFO, with DEBUG for hopline
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hopline=debug,sqlx=warn,tower_http=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use hopline_sync::config::{FileConfig, RawTables};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unusable_remote_key_runs_local_only() {
        let config = FileConfig {
            tables: RawTables {
                url: Some("https://tables.example.com".to_string()),
                key: Some("anon\nkey".to_string()),
            },
            ..FileConfig::default()
        }
        .resolve()
        .unwrap();
        assert!(RemoteServices::connect(&config).is_err());

        let remote = connect_remote(&config);
        assert!(!remote.mirror.is_enabled());

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = db.state().load_store().await.unwrap();
        let router = build_router(AppState::new(store, db, remote, ConfigState::default()));

        let response = router
            .oneshot(Request::get("/api/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["hostedTables"], false);
    }
}
