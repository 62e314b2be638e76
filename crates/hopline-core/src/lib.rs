//! # hopline-core: Pure Business Logic for Hopline
//!
//! Everything the storefront and the admin console decide lives here as
//! plain functions and data over an in-memory [`AppStore`]. Persistence and
//! network calls belong to `hopline-db` and `hopline-sync`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hopline Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser client                               │   │
//! │  │    Login ──► Storefront / Cart ──► Checkout ──► Invoice         │   │
//! │  │    Admin: Analytics │ Merchants │ Vault │ POS                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP (apps/web)                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ hopline-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │ identity │ │ catalog  │ │  ledger  │ │ storefront/admin │  │   │
//! │  │   │ OTP,     │ │ stock    │ │ orders,  │ │ workflows over   │  │   │
//! │  │   │ trusted  │ │ filters  │ │ counter  │ │ the AppStore     │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        hopline-db (blobs)        hopline-sync (remote)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Product, Order, CounterSale, ...)
//! - [`money`] - Integer currency units and display
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`cart`] - Cart lines shared by the storefront and the POS
//! - [`catalog`] - Catalog & inventory manager
//! - [`ledger`] - Orders and counter sales
//! - [`identity`] - OTP challenges, admin allow-list, subject resolution
//! - [`storefront`] - Catalog filtering and checkout
//! - [`admin`] - Analytics, merchant queue, POS checkout
//! - [`invoice`] - Printable invoice projection
//! - [`seed`] - First-run catalog
//! - [`store`] - The application-state container
//!
//! ## Example Usage
//!
//! ```rust
//! use hopline_core::store::AppStore;
//! use hopline_core::cart::Cart;
//!
//! let store = AppStore::seeded();
//! let tuborg = store.catalog.get("4").unwrap().clone();
//!
//! let mut cart = Cart::new();
//! cart.add_product(&tuborg);
//! assert_eq!(cart.total().units(), 420);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod invoice;
pub mod ledger;
pub mod money;
pub mod seed;
pub mod store;
pub mod storefront;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering from a stuck increment button.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price accepted by the product form and the POS override.
pub const MAX_UNIT_PRICE: i64 = 10_000_000;

/// Largest stock level, either sign, an admin can enter.
pub const MAX_STOCK: i64 = 1_000_000;

/// Seconds a merchant must wait before asking for another code.
pub const RESEND_COOLDOWN_SECS: i64 = 30;

/// Seconds the post-checkout confirmation stays on screen.
pub const CONFIRMATION_WINDOW_SECS: i64 = 5;
