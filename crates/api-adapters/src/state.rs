//! State shared across all request handlers.

use std::sync::Arc;

use auth_adapters::IdentityCookieCodec;
use services::BoardService;

use crate::metrics::BoardMetrics;

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<BoardService>,
    pub cookies: Arc<IdentityCookieCodec>,
    pub metrics: Arc<BoardMetrics>,
    /// Adds `Secure` to the identity cookie.
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(board: Arc<BoardService>, cookies: IdentityCookieCodec, secure_cookies: bool) -> Self {
        Self {
            board,
            cookies: Arc::new(cookies),
            metrics: Arc::new(BoardMetrics::new()),
            secure_cookies,
        }
    }
}
