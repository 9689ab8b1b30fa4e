//! Shared application state for the Podium gateway.
//!
//! Wires the presentation store (seeded from config), the session registry,
//! and the protocol dispatcher. Startup errors are explicit (Result instead
//! of panic).

use std::sync::Arc;

use podium_core::error::{PodiumError, Result};

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::obs::GatewayMetrics;
use crate::session::SessionRegistry;
use crate::store::{MemoryStore, PresentationStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    registry: Arc<SessionRegistry>,
    dispatcher: Dispatcher,
    metrics: GatewayMetrics,
}

impl AppState {
    /// Build application state from a validated config.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let mut store = MemoryStore::new();
        for seed in &cfg.presentations {
            if store.presentation_by_id(&seed.id).is_some() {
                return Err(PodiumError::BadRequest(format!(
                    "duplicate presentation id in config: {}",
                    seed.id
                )));
            }
            store.insert(&seed.id, &seed.presenter_id, seed.slide_id.clone());
        }
        let store: Arc<dyn PresentationStore> = Arc::new(store);

        let registry = Arc::new(SessionRegistry::new());
        let dispatcher = Dispatcher::new(store, registry.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                dispatcher,
                metrics: GatewayMetrics::default(),
            }),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    /// Scrape-time gauges derived from live state.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![(
            "podium_sessions_active",
            self.inner.registry.session_count() as u64,
        )]
    }
}
