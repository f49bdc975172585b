use std::sync::Arc;

use crate::optimizer::PromptOptimizer;
use crate::store::{IdentityVerifier, RecordStore};

/// Shared state handed to every handler. The identity and store seams are
/// trait objects so the boundary never learns which backend is behind them.
#[derive(Clone)]
pub struct AppState {
    pub optimizer: Arc<PromptOptimizer>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(
        optimizer: Arc<PromptOptimizer>,
        identity: Arc<dyn IdentityVerifier>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            optimizer,
            identity,
            store,
        }
    }
}
