//! # api-adapters
//!
//! The HTTP layer of the board. With `web-axum` enabled this exposes an
//! axum router over [`services::BoardService`]; the DTOs and metrics are
//! transport-agnostic and always compiled.

pub mod dto;
pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod cookies;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
pub mod router;
#[cfg(feature = "web-axum")]
pub mod state;

#[cfg(feature = "web-axum")]
pub use router::build_router;
#[cfg(feature = "web-axum")]
pub use state::AppState;
