//! GitHook - GitLab-style webhook receiver with multiplexed dispatch.
//!
//! Accepts HTTP POST notifications from a source-control host, validates
//! and parses the payload, and republishes each event under five derived
//! keys so listeners can subscribe at different granularities.
//!
//! ## Pipeline
//!
//! ```text
//! POST body → decode → validate shape → derive (event, repo, ref) → HookHub
//! ```
//!
//! The hub delivers synchronously and in-process; there is no persistence
//! and no redelivery. Listener registration is the only state that outlives
//! a request.

pub mod config;
pub mod event;
pub mod hub;
pub mod payload;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use event::{HookEvent, QueryParams, ShapeError};
pub use hub::{HookHub, ListenerId};
pub use payload::{decode, DecodeError};
pub use web::AppState;
