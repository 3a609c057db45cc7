//! # lumi
//!
//! Client library for the Lumi+ social feed: a persisted session store, a
//! JSON-over-HTTP API client for the auth and posts endpoints, and the small
//! state machines (auth, post composition, feed) that a front-end drives.
//!
//! The `cli` crate is the reference front-end; anything with a screen can
//! wire the same [`app::App`] facade.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod flows;
pub mod notify;
pub mod session;
pub mod types;

pub use api::{Backend, HttpApi};
pub use app::App;
pub use config::{ClientConfig, Endpoints};
pub use error::{ApiError, ConfigError, DraftError, ErrorCode, StoreError};
pub use notify::{Level, Notification};
pub use session::{FileStore, KeyValueStore, MemoryStore, Session, SessionStore};
