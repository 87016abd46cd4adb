use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};

use super::{check_transition, OrderError};
use crate::clients::{InventoryClient, OrderClient};
use crate::domain::{CancelledBy, Order, OrderDraft, OrderOwner, OrderStatus};
use crate::listing::{sort_newest_first, OrderFilter};
use crate::messages::{OrderRequest, OrderSnapshot, ServiceResponse};
use crate::repository::{OrderRepository, Persisted};

/// Stock credited back for one line item of a cancelled order.
#[derive(Debug, Clone, PartialEq)]
pub struct StockReversion {
    pub product_id: String,
    pub quantity: u32,
    /// Stock level after the credit.
    pub current: u32,
}

/// A line item whose stock could not be credited back.
#[derive(Debug, Clone, PartialEq)]
pub struct RevertFailure {
    pub product_id: String,
    pub quantity: u32,
    pub reason: String,
}

/// Outcome of a status update.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    /// The order as it now stands.
    pub order: Order,
    pub previous: OrderStatus,
    /// `false` when the order already had the requested status.
    pub changed: bool,
    pub reverted: Vec<StockReversion>,
    pub revert_failures: Vec<RevertFailure>,
}

impl StatusUpdate {
    fn unchanged(order: Order) -> Self {
        Self {
            previous: order.status,
            order,
            changed: false,
            reverted: Vec::new(),
            revert_failures: Vec::new(),
        }
    }
}

/// Owns the order collection and applies every change to it.
///
/// The collection is kept newest first. After each mutation the whole
/// collection is written back through the repository and a fresh snapshot
/// is published to subscribers. A collection that failed to save stays
/// marked unsaved and is written again by the next request that touches it.
pub struct OrderService {
    receiver: mpsc::Receiver<OrderRequest>,
    repository: Arc<dyn OrderRepository>,
    inventory: InventoryClient,
    orders: Vec<Order>,
    selected: Option<Order>,
    snapshots: watch::Sender<OrderSnapshot>,
    unsaved: bool,
}

impl OrderService {
    pub fn new(
        buffer_size: usize,
        repository: Arc<dyn OrderRepository>,
        inventory: InventoryClient,
    ) -> (Self, OrderClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (snapshots, _) = watch::channel(OrderSnapshot::default());
        let service = Self {
            receiver,
            repository,
            inventory,
            orders: Vec::new(),
            selected: None,
            snapshots,
            unsaved: false,
        };
        (service, OrderClient::new(sender))
    }

    #[instrument(name = "order_service", skip(self))]
    pub async fn run(mut self) {
        info!("OrderService starting");

        if let Err(e) = self.load().await {
            error!(error = %e, "Could not load orders, starting empty");
        }

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                OrderRequest::CreateOrder { owner, draft, respond_to } => {
                    self.handle_create_order(owner, draft, respond_to).await;
                }
                OrderRequest::UpdateStatus { id, status, respond_to } => {
                    self.handle_update_status(id, status, respond_to).await;
                }
                OrderRequest::GetOrder { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.orders.iter().find(|o| o.id == id).cloned()));
                }
                OrderRequest::ListOrders { respond_to } => {
                    let _ = respond_to.send(Ok(self.orders.clone()));
                }
                OrderRequest::SearchOrders { filter, respond_to } => {
                    self.handle_search_orders(filter, respond_to);
                }
                OrderRequest::OrdersForUser { user_id, respond_to } => {
                    let mine = self.orders.iter().filter(|o| o.user_id == user_id).cloned().collect();
                    let _ = respond_to.send(Ok(mine));
                }
                OrderRequest::SelectOrder { id, respond_to } => {
                    self.handle_select_order(id, respond_to);
                }
                OrderRequest::SelectedOrder { respond_to } => {
                    let _ = respond_to.send(Ok(self.selected.clone()));
                }
                OrderRequest::CloseDetail { respond_to } => {
                    self.selected = None;
                    let _ = respond_to.send(Ok(()));
                }
                OrderRequest::Reload { respond_to } => {
                    let _ = respond_to.send(self.load().await);
                }
                OrderRequest::Subscribe { respond_to } => {
                    let _ = respond_to.send(Ok(self.snapshots.subscribe()));
                }
                OrderRequest::Shutdown => {
                    info!("OrderService shutting down");
                    break;
                }
            }
        }

        info!("OrderService stopped");
    }

    /// Replaces the in-memory collection with the repository's.
    async fn load(&mut self) -> Result<usize, OrderError> {
        if self.unsaved {
            // The slot is behind memory; reading it back would lose changes.
            self.persist().await?;
        }
        let mut orders = self.repository.list().await?;
        sort_newest_first(&mut orders);
        self.orders = orders;
        if let Some(open_id) = self.selected.as_ref().map(|o| o.id.clone()) {
            self.selected = self.orders.iter().find(|o| o.id == open_id).cloned();
        }
        self.publish();
        info!(count = self.orders.len(), "Orders loaded");
        Ok(self.orders.len())
    }

    fn publish(&self) {
        self.snapshots.send_replace(Arc::new(self.orders.clone()));
    }

    /// Writes the whole collection back.
    async fn persist(&mut self) -> Result<(), OrderError> {
        match self.repository.save_all(&self.orders).await {
            Ok(()) => {
                self.unsaved = false;
                Ok(())
            }
            Err(e) => {
                self.unsaved = true;
                error!(error = %e, "Could not save orders, keeping them unsaved");
                Err(e.into())
            }
        }
    }

    #[instrument(
        fields(user_id = %owner.user_id, items = draft.items.len(), total = %draft.total),
        skip(self, owner, draft, respond_to)
    )]
    async fn handle_create_order(
        &mut self,
        owner: OrderOwner,
        draft: OrderDraft,
        respond_to: ServiceResponse<Persisted<Order>, OrderError>,
    ) {
        info!("Processing create_order request");
        let result = self.create_order(owner, draft).await;
        match &result {
            Ok(persisted) => info!(order_id = %persisted.get().id, remote = persisted.is_remote(), "Order created"),
            Err(e) => error!(error = %e, "Order creation failed"),
        }
        let _ = respond_to.send(result);
    }

    async fn create_order(&mut self, owner: OrderOwner, draft: OrderDraft) -> Result<Persisted<Order>, OrderError> {
        if draft.items.is_empty() {
            return Err(OrderError::ValidationError("Order has no items".to_string()));
        }
        if let Some(item) = draft.items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::ValidationError(format!("Zero quantity for {}", item.product.id)));
        }
        if draft.status.is_terminal() {
            return Err(OrderError::ValidationError(format!("Cannot place an order as {}", draft.status)));
        }

        let mut reserved: Vec<(String, u32)> = Vec::with_capacity(draft.items.len());
        for item in &draft.items {
            let product_id = item.product.id.clone();
            match self.inventory.reserve_stock(product_id.clone(), item.quantity).await {
                Ok(remaining) => {
                    debug!(%product_id, quantity = item.quantity, remaining, "Stock reserved");
                    reserved.push((product_id, item.quantity));
                }
                Err(e) => {
                    warn!(%product_id, error = %e, "Stock reservation failed");
                    self.release(&reserved).await;
                    return Err(e.into());
                }
            }
        }

        let persisted = match self.repository.create(&owner, draft).await {
            Ok(persisted) => persisted,
            Err(e) => {
                self.release(&reserved).await;
                return Err(e.into());
            }
        };

        self.orders.push(persisted.get().clone());
        sort_newest_first(&mut self.orders);
        self.publish();
        // The repository appended to the slot as stored; rewrite it from
        // memory so earlier changes are not lost.
        if let Err(e) = self.persist().await {
            warn!(order_id = %persisted.get().id, error = %e, "Order placed but collection left unsaved");
        }
        Ok(persisted)
    }

    /// Gives back stock reserved for an order that was not placed.
    async fn release(&self, reserved: &[(String, u32)]) {
        for (product_id, quantity) in reserved {
            if let Err(e) = self.inventory.revert_stock(product_id.clone(), *quantity).await {
                error!(%product_id, quantity, error = %e, "Could not release reserved stock");
            }
        }
    }

    #[instrument(fields(order_id = %id), skip(self, respond_to))]
    async fn handle_update_status(
        &mut self,
        id: String,
        status: OrderStatus,
        respond_to: ServiceResponse<StatusUpdate, OrderError>,
    ) {
        info!("Processing update_status request");
        let result = self.update_status(&id, status).await;
        if let Err(e) = &result {
            warn!(error = %e, "Status update refused");
        }
        let _ = respond_to.send(result);
    }

    async fn update_status(&mut self, id: &str, status: OrderStatus) -> Result<StatusUpdate, OrderError> {
        let Some(index) = self.orders.iter().position(|o| o.id == id) else {
            return Err(OrderError::NotFound(id.to_string()));
        };
        let previous = self.orders[index].status;
        if previous == status {
            debug!("Status unchanged");
            let order = self.orders[index].clone();
            if self.unsaved {
                self.persist().await?;
            }
            return Ok(StatusUpdate::unchanged(order));
        }
        check_transition(id, previous, status)?;

        let (reverted, revert_failures) = if status == OrderStatus::Cancelled {
            let items: Vec<(String, u32)> = self.orders[index]
                .items
                .iter()
                .map(|item| (item.product.id.clone(), item.quantity))
                .collect();
            self.revert_items(items).await
        } else {
            (Vec::new(), Vec::new())
        };

        let order = &mut self.orders[index];
        order.status = status;
        if status == OrderStatus::Cancelled {
            order.cancelled_by = Some(CancelledBy::Admin);
        }
        let order = order.clone();

        sort_newest_first(&mut self.orders);
        if self.selected.as_ref().is_some_and(|open| open.id == order.id) {
            self.selected = Some(order.clone());
        }
        self.publish();
        self.persist().await?;

        info!(%previous, reverted = reverted.len(), failed = revert_failures.len(), "Status updated");
        Ok(StatusUpdate {
            order,
            previous,
            changed: true,
            reverted,
            revert_failures,
        })
    }

    /// Credits each item's quantity back, in item order. A failure does not
    /// stop the remaining items.
    async fn revert_items(&self, items: Vec<(String, u32)>) -> (Vec<StockReversion>, Vec<RevertFailure>) {
        let mut reverted = Vec::new();
        let mut failures = Vec::new();
        for (product_id, quantity) in items {
            match self.inventory.revert_stock(product_id.clone(), quantity).await {
                Ok(current) => {
                    debug!(%product_id, quantity, current, "Stock reverted");
                    reverted.push(StockReversion { product_id, quantity, current });
                }
                Err(e) => {
                    error!(%product_id, quantity, error = %e, "Stock reversion failed");
                    failures.push(RevertFailure { product_id, quantity, reason: e.to_string() });
                }
            }
        }
        (reverted, failures)
    }

    #[instrument(skip(self, respond_to))]
    fn handle_search_orders(&self, filter: OrderFilter, respond_to: ServiceResponse<Vec<Order>, OrderError>) {
        let hits = filter.apply(&self.orders);
        debug!(hits = hits.len(), "Search complete");
        let _ = respond_to.send(Ok(hits));
    }

    #[instrument(fields(order_id = %id), skip(self, respond_to))]
    fn handle_select_order(&mut self, id: String, respond_to: ServiceResponse<Order, OrderError>) {
        let result = match self.orders.iter().find(|o| o.id == id) {
            Some(order) => {
                self.selected = Some(order.clone());
                Ok(order.clone())
            }
            None => Err(OrderError::NotFound(id)),
        };
        let _ = respond_to.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use crate::actor_framework::FrameworkError;
    use crate::domain::{InventoryRecord, LineItem, ProductRef};
    use crate::inventory::{InventoryAction, InventoryActionResult};
    use crate::listing::StatusFilter;
    use crate::mock_framework::{create_mock_client, expect_action};
    use crate::repository::{write_json, LocalOrderRepository, MemorySlotStore, RepositoryError, SlotStore, ORDERS_SLOT};

    fn item(product_id: &str, quantity: u32) -> LineItem {
        let product = ProductRef { id: product_id.into(), name: product_id.into(), price: 50.0, image: None };
        LineItem::new(product, quantity)
    }

    fn owner() -> OrderOwner {
        OrderOwner::new("user_1", Some("ana@example.com".into()))
    }

    fn stored_order(id: &str, minutes: i64, items: Vec<LineItem>) -> Order {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes);
        Order::from_draft(id, "user_1", None, created, OrderDraft::new(items))
    }

    async fn spawn_inventory() -> InventoryClient {
        let (actor, client) = crate::inventory::new(16);
        tokio::spawn(actor.run());
        for (id, limit) in [("choco", 10), ("glazed", 20)] {
            client.create_record(InventoryRecord::new(id, id, limit).into()).await.unwrap();
        }
        client
    }

    async fn spawn_service(slots: Arc<dyn SlotStore>, inventory: InventoryClient) -> OrderClient {
        let repository = Arc::new(LocalOrderRepository::new(slots));
        let (service, client) = OrderService::new(16, repository, inventory);
        tokio::spawn(service.run());
        client
    }

    #[tokio::test]
    async fn test_create_reserves_stock_and_persists() {
        let slots = Arc::new(MemorySlotStore::new());
        let inventory = spawn_inventory().await;
        let orders = spawn_service(slots.clone(), inventory.clone()).await;

        let draft = OrderDraft::new(vec![item("choco", 3), item("glazed", 2)]);
        let placed = orders.create_order(owner(), draft).await.unwrap();
        assert!(!placed.is_remote());
        assert_eq!(placed.get().total, 250.0);

        assert_eq!(inventory.check_stock("choco".into()).await, Ok(7));
        assert_eq!(inventory.check_stock("glazed".into()).await, Ok(18));
        assert_eq!(orders.list_orders().await.unwrap().len(), 1);
        assert!(slots.read(ORDERS_SLOT).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_reservation_releases_earlier_items() {
        let inventory = spawn_inventory().await;
        let orders = spawn_service(Arc::new(MemorySlotStore::new()), inventory.clone()).await;

        let draft = OrderDraft::new(vec![item("glazed", 5), item("choco", 11)]);
        let err = orders.create_order(owner(), draft).await.unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock(ref detail) if detail.starts_with("choco")));
        assert_eq!(inventory.check_stock("glazed".into()).await, Ok(20));

        let draft = OrderDraft::new(vec![item("glazed", 1), item("mystery", 1)]);
        assert_eq!(
            orders.create_order(owner(), draft).await,
            Err(OrderError::InvalidProduct("mystery".into()))
        );
        assert_eq!(inventory.check_stock("glazed".into()).await, Ok(20));

        assert!(matches!(
            orders.create_order(owner(), OrderDraft::default()).await,
            Err(OrderError::ValidationError(_))
        ));
        assert!(orders.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_credits_stock_exactly_once() {
        let inventory = spawn_inventory().await;
        let orders = spawn_service(Arc::new(MemorySlotStore::new()), inventory.clone()).await;

        let draft = OrderDraft::new(vec![item("choco", 4), item("glazed", 6)]);
        let id = orders.create_order(owner(), draft).await.unwrap().into_inner().id;
        assert_eq!(inventory.check_stock("choco".into()).await, Ok(6));

        let update = orders.update_status(id.clone(), OrderStatus::Cancelled).await.unwrap();
        assert!(update.changed);
        assert_eq!(update.previous, OrderStatus::Pending);
        assert_eq!(update.order.cancelled_by, Some(CancelledBy::Admin));
        assert_eq!(update.order.status_label(), "Cancelled by SimpleDough");
        assert_eq!(
            update.reverted,
            vec![
                StockReversion { product_id: "choco".into(), quantity: 4, current: 10 },
                StockReversion { product_id: "glazed".into(), quantity: 6, current: 20 },
            ]
        );

        let again = orders.update_status(id.clone(), OrderStatus::Cancelled).await.unwrap();
        assert!(!again.changed);
        assert!(again.reverted.is_empty());
        assert_eq!(inventory.check_stock("choco".into()).await, Ok(10));
        assert_eq!(inventory.check_stock("glazed".into()).await, Ok(20));

        assert_eq!(
            orders.update_status(id.clone(), OrderStatus::Confirmed).await,
            Err(OrderError::TerminalStatus { id, status: OrderStatus::Cancelled })
        );
    }

    #[tokio::test]
    async fn test_update_touches_exactly_one_order() {
        let slots = Arc::new(MemorySlotStore::new());
        let seeded = vec![
            stored_order("a", 0, vec![item("glazed", 1)]),
            stored_order("b", 10, vec![item("glazed", 1)]),
            stored_order("c", 20, vec![item("glazed", 1)]),
        ];
        write_json(slots.as_ref(), ORDERS_SLOT, &seeded).await.unwrap();
        let orders = spawn_service(slots.clone(), spawn_inventory().await).await;
        let before = orders.list_orders().await.unwrap();
        assert_eq!(before.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(), vec!["c", "b", "a"]);

        orders.update_status("b".into(), OrderStatus::Preparing).await.unwrap();
        let after = orders.list_orders().await.unwrap();
        assert_eq!(after.len(), before.len());
        let differing: Vec<&str> = before
            .iter()
            .zip(&after)
            .filter(|(old, new)| old.status != new.status)
            .map(|(_, new)| new.id.as_str())
            .collect();
        assert_eq!(differing, vec!["b"]);

        assert_eq!(
            orders.update_status("zzz".into(), OrderStatus::Ready).await,
            Err(OrderError::NotFound("zzz".into()))
        );
        assert_eq!(orders.list_orders().await.unwrap(), after);

        assert_eq!(
            orders.update_status("b".into(), OrderStatus::Confirmed).await,
            Err(OrderError::InvalidTransition { from: OrderStatus::Preparing, to: OrderStatus::Confirmed })
        );

        let repo = LocalOrderRepository::new(slots);
        let stored = repo.list().await.unwrap();
        assert_eq!(stored.iter().find(|o| o.id == "b").unwrap().status, OrderStatus::Preparing);
    }

    #[tokio::test]
    async fn test_partial_reversion_still_cancels() {
        let slots = Arc::new(MemorySlotStore::new());
        let seeded = vec![stored_order("legacy", 0, vec![item("retired", 2), item("choco", 3)])];
        write_json(slots.as_ref(), ORDERS_SLOT, &seeded).await.unwrap();
        let inventory = spawn_inventory().await;
        let orders = spawn_service(slots, inventory.clone()).await;

        let update = orders.update_status("legacy".into(), OrderStatus::Cancelled).await.unwrap();
        assert_eq!(update.order.status, OrderStatus::Cancelled);
        assert_eq!(update.revert_failures.len(), 1);
        assert_eq!(update.revert_failures[0].product_id, "retired");
        assert_eq!(update.reverted.len(), 1);
        assert_eq!(inventory.check_stock("choco".into()).await, Ok(13));
    }

    #[tokio::test]
    async fn test_detail_view_follows_updates() {
        let inventory = spawn_inventory().await;
        let orders = spawn_service(Arc::new(MemorySlotStore::new()), inventory).await;
        let id = orders
            .create_order(owner(), OrderDraft::new(vec![item("glazed", 1)]).with_phone("09171234567"))
            .await
            .unwrap()
            .into_inner()
            .id;

        assert_eq!(orders.selected_order().await, Ok(None));
        orders.select_order(id.clone()).await.unwrap();
        orders.update_status(id.clone(), OrderStatus::Ready).await.unwrap();
        assert_eq!(orders.selected_order().await.unwrap().unwrap().status, OrderStatus::Ready);

        orders.close_detail().await.unwrap();
        assert_eq!(orders.selected_order().await, Ok(None));
        assert_eq!(orders.select_order("nope".into()).await, Err(OrderError::NotFound("nope".into())));

        let hits = orders
            .search_orders(OrderFilter::new("1234", StatusFilter::Only(OrderStatus::Ready)))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(orders.orders_for_user("user_1".into()).await.unwrap().len(), 1);
        assert!(orders.orders_for_user("user_2".into()).await.unwrap().is_empty());
        assert!(orders.get_order(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_subscribers_see_every_mutation_and_reload() {
        let slots = Arc::new(MemorySlotStore::new());
        let orders = spawn_service(slots.clone(), spawn_inventory().await).await;
        let mut snapshots = orders.subscribe().await.unwrap();

        orders.create_order(owner(), OrderDraft::new(vec![item("choco", 1)])).await.unwrap();
        snapshots.changed().await.unwrap();
        assert_eq!(snapshots.borrow_and_update().len(), 1);

        let extra = vec![stored_order("x", 0, Vec::new()), stored_order("y", 5, Vec::new())];
        write_json(slots.as_ref(), ORDERS_SLOT, &extra).await.unwrap();
        assert_eq!(orders.reload().await, Ok(2));
        snapshots.changed().await.unwrap();
        assert_eq!(snapshots.borrow_and_update()[0].id, "y");
    }

    /// Slot store whose writes can be made to fail.
    #[derive(Default)]
    struct BrokenWrites {
        inner: MemorySlotStore,
        broken: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl SlotStore for BrokenWrites {
        async fn read(&self, key: &str) -> Result<Option<String>, RepositoryError> {
            self.inner.read(key).await
        }

        async fn write(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
            if self.broken.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.write(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), RepositoryError> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_persist_failure_is_reported() {
        let slots = Arc::new(BrokenWrites::default());
        let inventory = spawn_inventory().await;
        let orders = spawn_service(slots.clone(), inventory.clone()).await;
        let id = orders
            .create_order(owner(), OrderDraft::new(vec![item("glazed", 2)]))
            .await
            .unwrap()
            .into_inner()
            .id;

        slots.broken.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(matches!(
            orders.create_order(owner(), OrderDraft::new(vec![item("glazed", 3)])).await,
            Err(OrderError::Persistence(_))
        ));
        assert_eq!(inventory.check_stock("glazed".into()).await, Ok(18));

        assert!(matches!(
            orders.update_status(id.clone(), OrderStatus::Confirmed).await,
            Err(OrderError::Persistence(_))
        ));
        let current = orders.get_order(id).await.unwrap().unwrap();
        assert_eq!(current.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_unsaved_cancellation_is_written_on_retry() {
        let slots = Arc::new(BrokenWrites::default());
        let inventory = spawn_inventory().await;
        let orders = spawn_service(slots.clone(), inventory.clone()).await;
        let id = orders
            .create_order(owner(), OrderDraft::new(vec![item("glazed", 2)]))
            .await
            .unwrap()
            .into_inner()
            .id;

        slots.broken.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(matches!(
            orders.update_status(id.clone(), OrderStatus::Cancelled).await,
            Err(OrderError::Persistence(_))
        ));
        assert_eq!(inventory.check_stock("glazed".into()).await, Ok(20));
        assert!(matches!(orders.reload().await, Err(OrderError::Persistence(_))));

        slots.broken.store(false, std::sync::atomic::Ordering::SeqCst);
        let retry = orders.update_status(id.clone(), OrderStatus::Cancelled).await.unwrap();
        assert!(!retry.changed);
        let stored = LocalOrderRepository::new(slots.clone()).list().await.unwrap();
        assert_eq!(stored[0].status, OrderStatus::Cancelled);

        orders.create_order(owner(), OrderDraft::new(vec![item("glazed", 1)])).await.unwrap();
        assert_eq!(orders.reload().await, Ok(2));
        let again = orders.update_status(id.clone(), OrderStatus::Cancelled).await.unwrap();
        assert!(!again.changed);
        assert!(again.reverted.is_empty());
        assert_eq!(inventory.check_stock("glazed".into()).await, Ok(19));
    }

    #[tokio::test]
    async fn test_unsaved_changes_ride_along_with_next_placement() {
        let slots = Arc::new(BrokenWrites::default());
        let inventory = spawn_inventory().await;
        let orders = spawn_service(slots.clone(), inventory.clone()).await;
        let id = orders
            .create_order(owner(), OrderDraft::new(vec![item("choco", 3)]))
            .await
            .unwrap()
            .into_inner()
            .id;

        slots.broken.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(orders.update_status(id.clone(), OrderStatus::Cancelled).await.is_err());
        slots.broken.store(false, std::sync::atomic::Ordering::SeqCst);

        orders.create_order(owner(), OrderDraft::new(vec![item("glazed", 1)])).await.unwrap();
        let stored = LocalOrderRepository::new(slots).list().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored.iter().find(|o| o.id == id).unwrap().status, OrderStatus::Cancelled);
        assert_eq!(inventory.check_stock("choco".into()).await, Ok(10));
    }

    #[tokio::test]
    async fn test_terminal_drafts_are_refused_before_reserving() {
        let inventory = spawn_inventory().await;
        let orders = spawn_service(Arc::new(MemorySlotStore::new()), inventory.clone()).await;

        for status in [OrderStatus::Cancelled, OrderStatus::Delivered] {
            let mut draft = OrderDraft::new(vec![item("choco", 4)]);
            draft.status = status;
            assert!(matches!(
                orders.create_order(owner(), draft).await,
                Err(OrderError::ValidationError(_))
            ));
        }
        assert_eq!(inventory.check_stock("choco".into()).await, Ok(10));
        assert!(orders.list_orders().await.unwrap().is_empty());

        let mut confirmed = OrderDraft::new(vec![item("choco", 4)]);
        confirmed.status = OrderStatus::Confirmed;
        let placed = orders.create_order(owner(), confirmed).await.unwrap().into_inner();
        assert_eq!(placed.status, OrderStatus::Confirmed);
        assert_eq!(inventory.check_stock("choco".into()).await, Ok(6));
    }

    #[tokio::test]
    async fn test_cancellation_requests_reversions_in_item_order() {
        let slots = Arc::new(MemorySlotStore::new());
        let seeded = vec![stored_order("o1", 0, vec![item("ube", 2), item("choco", 5)])];
        write_json(slots.as_ref(), ORDERS_SLOT, &seeded).await.unwrap();

        let (inner, mut inventory_rx) = create_mock_client::<InventoryRecord>(4);
        let orders = spawn_service(slots, InventoryClient::new(inner)).await;
        let task = tokio::spawn(async move { orders.update_status("o1".into(), OrderStatus::Cancelled).await });

        let (id, action, responder) = expect_action(&mut inventory_rx).await.expect("Expected Action");
        assert_eq!((id.as_str(), action), ("ube", InventoryAction::RevertStock(2)));
        responder.send(Err(FrameworkError::ActorClosed)).unwrap();

        let (id, action, responder) = expect_action(&mut inventory_rx).await.expect("Expected Action");
        assert_eq!((id.as_str(), action), ("choco", InventoryAction::RevertStock(5)));
        responder.send(Ok(InventoryActionResult::RevertStock { current: 9 })).unwrap();

        let update = task.await.unwrap().unwrap();
        assert_eq!(update.reverted.len(), 1);
        assert_eq!(update.revert_failures[0].product_id, "ube");
    }
}
