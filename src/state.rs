use std::sync::Arc;

use crate::auth::TokenService;
use crate::database::{MeasurementStore, MemoryStore, UserStore};
use crate::services::{AccountService, AthleteService, MeasurementService};

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub measurements: Arc<dyn MeasurementStore>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        measurements: Arc<dyn MeasurementStore>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            measurements,
            tokens: Arc::new(tokens),
        }
    }

    /// State backed by a single in-process store
    pub fn in_memory(tokens: TokenService) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store, tokens)
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.users.clone(), self.tokens.clone())
    }

    pub fn athletes(&self) -> AthleteService {
        AthleteService::new(self.users.clone())
    }

    pub fn measurement_service(&self) -> MeasurementService {
        MeasurementService::new(self.users.clone(), self.measurements.clone())
    }
}
