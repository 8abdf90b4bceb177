use crate::config::ServiceConfig;
use crate::service::{ServiceError, TrashManagementService};
use crate::transport::{CallDispatcher, Transport};
use std::sync::Arc;
use tokio::task::JoinHandle;
use topic_bus::MessageBus;
use tracing::info;

/// A running service: the bus it listens on plus the dispatcher task behind it.
pub struct TrashSystem {
    pub bus: MessageBus,
    service: TrashManagementService,
    handles: Vec<JoinHandle<()>>,
}

impl TrashSystem {
    /// Starts on a fresh bus. Must be called inside a Tokio runtime.
    pub fn start(config: ServiceConfig, transport: Arc<dyn Transport>) -> Self {
        Self::start_on(MessageBus::new(), config, transport)
    }

    /// Starts on an existing bus shared with other components.
    pub fn start_on(bus: MessageBus, config: ServiceConfig, transport: Arc<dyn Transport>) -> Self {
        let (dispatcher, client) =
            CallDispatcher::new(config.dispatch_buffer, transport, bus.clone());
        let dispatcher_handle = tokio::spawn(dispatcher.run());

        let service = TrashManagementService::new(bus.clone(), config, client);
        let topics = service.register_subscriptions();
        info!(topics, "Trash management started");

        Self {
            bus,
            service,
            handles: vec![dispatcher_handle],
        }
    }

    pub fn service(&self) -> &TrashManagementService {
        &self.service
    }

    /// Stops serving requests and waits for every issued call to resolve.
    pub async fn shutdown(self) -> Result<(), ServiceError> {
        self.service.unregister_subscriptions();
        let pending = self.service.registry().pending_count();
        drop(self.service);
        info!(pending, "Shutting down, waiting for in-flight calls");

        for handle in self.handles {
            handle
                .await
                .map_err(|e| ServiceError::Shutdown(e.to_string()))?;
        }
        info!("Trash management stopped");
        Ok(())
    }
}
