//! # Localizard
//!
//! A multi-tenant localization-string management service, usable both as a
//! standalone binary and as a library. Projects own locales and labels
//! (dotted translation keys); each label holds at most one translation per
//! locale. Published translations are served over a REST API gated by an
//! owner session, a per-project API key, or a public-project flag.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use localizard::server::{AppState, create_router};
//! use localizard::store::SqliteStore;
//!
//! let store = SqliteStore::new("./data/localizard.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState { store: Arc::new(store) });
//! let router = create_router(state);
//! // Serve with axum...
//! ```

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod resolve;
pub mod server;
pub mod store;
pub mod types;
