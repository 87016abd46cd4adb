use anyhow::{Context, Result};
use tracing::{info, warn, Instrument};

use simple_dough::app_system::{setup_tracing, ShopSystem};
use simple_dough::config::Config;
use simple_dough::domain::{Credentials, InventoryRecord, LineItem, OrderDraft, OrderStatus, ProductRef, Registration};
use simple_dough::listing::{OrderFilter, StatusFilter};
use simple_dough::session::SessionError;

fn product(id: &str, name: &str, price: f64) -> ProductRef {
    ProductRef { id: id.into(), name: name.into(), price, image: None }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let config = Config::load().context("Invalid configuration")?;
    info!(data_dir = %config.data_dir.display(), "Starting SimpleDough back office");
    let mut system = ShopSystem::from_config(config);

    for (id, name, limit) in [("glazed", "Classic Glazed", 24), ("choco", "Choco Dream", 12), ("ube", "Ube Halaya", 8)] {
        system
            .inventory_client
            .create_record(InventoryRecord::new(id, name, limit).into())
            .await
            .with_context(|| format!("Could not stock {}", id))?;
    }

    let registration = Registration {
        name: "Ana Cruz".into(),
        email: "ana@example.com".into(),
        phone: "09171234567".into(),
        address: "12 Mabini St, Quezon City".into(),
        password: "donuts4ever".into(),
    };
    let credentials = Credentials { email: registration.email.clone(), password: registration.password.clone() };
    if let Err(e) = system.session.register(registration).await {
        warn!(error = %e, "Registration failed, trying to log in");
    }
    if system.session.user().is_none() {
        system.session.login(credentials).await.context("Could not log in")?;
    }

    let span = tracing::info_span!("order_placement");
    let (pickup, delivery) = async {
        let pickup = OrderDraft::new(vec![
            LineItem::new(product("glazed", "Classic Glazed", 45.0), 6),
            LineItem::new(product("ube", "Ube Halaya", 60.0), 2),
        ])
        .with_phone("09171234567")
        .with_payment_method("gcash");
        let pickup = system.session.add_order(pickup).await?;

        let delivery = OrderDraft::new(vec![LineItem::new(product("choco", "Choco Dream", 55.0), 4)])
            .for_delivery("12 Mabini St, Quezon City", system.config.delivery_fee)
            .with_phone("09171234567")
            .with_payment_method("cod");
        let delivery = system.session.add_order(delivery).await?;
        Ok::<_, SessionError>((pickup.into_inner(), delivery.into_inner()))
    }
    .instrument(span)
    .await?;
    info!(pickup = %pickup.short_ref(), delivery = %delivery.short_ref(), "Orders placed");

    let orders = system.order_client.clone();
    orders.update_status(pickup.id.clone(), OrderStatus::Confirmed).await?;
    orders.update_status(pickup.id.clone(), OrderStatus::Ready).await?;
    if let Err(e) = orders.update_status(pickup.id.clone(), OrderStatus::Pending).await {
        warn!(error = %e, "Backward move refused");
    }

    let cancelled = orders.update_status(delivery.id.clone(), OrderStatus::Cancelled).await?;
    for reversion in &cancelled.reverted {
        info!(product_id = %reversion.product_id, quantity = reversion.quantity, stock = reversion.current, "Stock returned");
    }
    info!(label = %cancelled.order.status_label(), "Delivery order cancelled");

    let feed = system.dashboard_feed().await?;
    let stats = feed.current();
    info!(
        today_orders = stats.today_orders,
        today_revenue = stats.today_revenue,
        avg_order_value = stats.avg_order_value,
        total_customers = stats.total_customers,
        "Dashboard"
    );

    for order in system.recent_orders().await? {
        info!(
            order = %order.short_ref(),
            status = %order.status_label(),
            total = order.total,
            payment = %order.payment_label(),
            "Recent order"
        );
    }
    for record in system.low_stock().await? {
        warn!(product_id = %record.product_id, stock = record.current_stock, "Low stock");
    }

    let hits = orders
        .search_orders(OrderFilter::new("4567", StatusFilter::Only(OrderStatus::Ready)))
        .await?;
    info!(hits = hits.len(), "Ready orders for 0917-123-4567");

    system.session.logout().await?;
    drop(orders);
    system.shutdown().await?;

    info!("SimpleDough back office stopped");
    Ok(())
}
