//! # Repository Module
//!
//! ```text
//! handler
//!    │  db.state().save_slice(&store, Slice::Orders)
//!    ▼
//! StateRepository ──┐
//!                   ├──► BlobRepository ──► local_store (key, value, updated_at)
//! TrustedDevices ───┘
//! ```
//!
//! - [`blob::BlobRepository`] - JSON get / put / delete by key
//! - [`state::StateRepository`] - AppStore slices with first-run defaults
//! - [`trusted::TrustedDeviceRepository`] - OTP bypass flags

pub mod blob;
pub mod state;
pub mod trusted;
