use std::sync::Arc;

use tracing::{error, info, instrument};

use super::SystemError;
use crate::backend::{AuthBackend, InMemoryBackend, RemoteOrderStore, SupabaseBackend};
use crate::clients::{InventoryClient, OrderClient};
use crate::config::Config;
use crate::dashboard::DashboardFeed;
use crate::domain::{InventoryRecord, Order};
use crate::lifecycle::OrderService;
use crate::repository::{CartStore, DualWriteOrderRepository, FileSlotStore, LocalOrderRepository, SlotStore};
use crate::session::SessionManager;

/// The running shop: the inventory actor, the order service and the
/// session of the current user.
///
/// Responsible for starting the services, wiring them together, and
/// handling shutdown.
pub struct ShopSystem {
    pub config: Config,
    pub inventory_client: InventoryClient,
    pub order_client: OrderClient,
    pub session: SessionManager,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl ShopSystem {
    /// Starts every service against the given storage and backend.
    ///
    /// **Startup Order:**
    /// 1. Inventory actor (no dependencies)
    /// 2. Order service with the inventory client and the dual-write repository
    /// 3. Session manager over the order client and the cart slot
    #[instrument(name = "shop_system", skip_all)]
    pub fn start(
        config: Config,
        slots: Arc<dyn SlotStore>,
        auth: Arc<dyn AuthBackend>,
        remote: Arc<dyn RemoteOrderStore>,
    ) -> Self {
        info!("Starting shop system");
        let mut handles = Vec::new();

        let (inventory_actor, inventory_client) = crate::inventory::new(config.mailbox_size);
        handles.push(tokio::spawn(inventory_actor.run()));

        let repository = DualWriteOrderRepository::new(LocalOrderRepository::new(slots.clone()), remote);
        let (order_service, order_client) =
            OrderService::new(config.mailbox_size, Arc::new(repository), inventory_client.clone());
        handles.push(tokio::spawn(order_service.run()));

        let session = SessionManager::new(auth, order_client.clone(), CartStore::new(slots));

        info!("Shop system started");
        Self {
            config,
            inventory_client,
            order_client,
            session,
            handles,
        }
    }

    /// Starts with file-backed slots under the configured data directory, and
    /// the hosted backend when one is configured.
    pub fn from_config(config: Config) -> Self {
        let slots: Arc<dyn SlotStore> = Arc::new(FileSlotStore::new(config.data_dir.clone()));
        match config.supabase.clone() {
            Some(supabase) => {
                let backend = Arc::new(SupabaseBackend::new(supabase.url, supabase.anon_key));
                Self::start(config, slots, backend.clone(), backend)
            }
            None => {
                let backend = Arc::new(InMemoryBackend::new());
                Self::start(config, slots, backend.clone(), backend)
            }
        }
    }

    /// Live dashboard stats, recomputed on every order change.
    pub async fn dashboard_feed(&self) -> Result<DashboardFeed, SystemError> {
        Ok(DashboardFeed::new(self.order_client.subscribe().await?))
    }

    /// The configured number of newest orders.
    pub async fn recent_orders(&self) -> Result<Vec<Order>, SystemError> {
        Ok(self.order_client.recent_orders(self.config.recent_orders_limit).await?)
    }

    /// Products at or below the configured threshold.
    pub async fn low_stock(&self) -> Result<Vec<InventoryRecord>, SystemError> {
        Ok(self
            .inventory_client
            .low_stock_products(self.config.low_stock_threshold)
            .await?)
    }

    /// Gracefully shuts the system down.
    ///
    /// The order service is stopped first; the inventory actor stops once
    /// the last inventory client is dropped.
    #[instrument(skip(self))]
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down shop system");

        if let Err(e) = self.order_client.shutdown().await {
            error!(error = %e, "Order service already stopped");
        }
        drop(self.session);
        drop(self.order_client);
        drop(self.inventory_client);

        let mut failure = None;
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = ?e, "Service shutdown error");
                failure = Some(SystemError::TaskFailed(e.to_string()));
            }
        }

        info!("Shop system shutdown complete");
        failure.map_or(Ok(()), Err)
    }
}
