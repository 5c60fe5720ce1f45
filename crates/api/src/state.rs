//! Shared application state.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::services::payment::PaymentGateway;
use crate::store::Store;

/// Cheaply cloneable handle passed to every handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: ApiConfig,
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ApiConfig, store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                gateway,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.inner.gateway.as_ref()
    }
}
