//! Module wiring: configuration, record store, service and clients

use crate::api::native::NativeClient;
use crate::config::Config;
use crate::contract::BookingApi;
use crate::domain::{RecordStore, Service};
use crate::infra::crm::HttpRecordStore;
use anyhow::Result;
use std::sync::Arc;

/// Booking service module
pub struct BookingServiceModule {
    service: Arc<Service>,
}

impl BookingServiceModule {
    /// Build the module against the configured HTTP record store
    pub fn init(config: Config) -> Result<Self> {
        let store = Arc::new(HttpRecordStore::new(
            &config.backend,
            config.request_timeout,
        )?);

        tracing::info!(
            base_url = %config.backend.base_url,
            api_version = %config.backend.api_version,
            "Booking service using HTTP record store"
        );
        Ok(Self::with_store(config, store))
    }

    /// Build the module against any record store
    pub fn with_store(config: Config, store: Arc<dyn RecordStore>) -> Self {
        let service = Arc::new(Service::new(store, &config));
        tracing::info!(
            max_groups = config.max_groups,
            max_group_size = config.max_group_size,
            "Booking service initialized"
        );
        Self { service }
    }

    /// Native client for in-process calls
    pub fn client(&self) -> Arc<dyn BookingApi> {
        Arc::new(NativeClient::new(self.service.clone()))
    }

    /// Mount the REST routes onto `router`
    pub fn register_rest(&self, router: axum::Router) -> Result<axum::Router> {
        tracing::info!("Registering booking service REST routes");
        crate::api::rest::routes::register_routes(router, self.service.clone())
    }
}
