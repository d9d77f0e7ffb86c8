//! Role lookup with the BLUE default applied at a single boundary.

use std::sync::Arc;

use domains::{Identity, Role, RoleStore};
use tracing::warn;

#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn RoleStore>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// Effective role of `identity`. Absence and store failures both yield
    /// BLUE; failures are logged and never propagated.
    pub async fn role_of(&self, identity: &Identity) -> Role {
        match self.store.get(identity).await {
            Ok(Some(role)) => role,
            Ok(None) => Role::Blue,
            Err(err) => {
                warn!(%identity, error = %err, "role lookup failed; treating identity as blue");
                Role::Blue
            }
        }
    }
}
