//! # Hopline Server Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load app and remote configuration
//! 3. Open the local store and run migrations
//! 4. Load the persisted AppStore
//! 5. Build the router and serve

#[tokio::main]
async fn main() {
    if let Err(e) = hopline_web::run().await {
        eprintln!("hopline: {e}");
        std::process::exit(1);
    }
}
