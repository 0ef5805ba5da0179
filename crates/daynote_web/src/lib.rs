//! HTTP surface for Daynote.
//! Handlers translate requests into `daynote_core` calls and nothing more.

pub mod api;
pub mod reply;
pub mod session;
pub mod state;

pub use api::config;
pub use state::AppState;
