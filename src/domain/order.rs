use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Name shown when the shop itself cancelled an order.
pub const SHOP_NAME: &str = "SimpleDough";

/// Lifecycle status of an order.
///
/// The forward sequence is `Pending → Confirmed → Preparing → Ready →
/// OutForDelivery → Delivered`. `Cancelled` can be reached from any
/// non-terminal status. See [`crate::lifecycle::can_transition`] for the
/// enforced table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in dropdown order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// `Delivered` and `Cancelled` accept no further edits.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown order status: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    #[default]
    Pickup,
    Delivery,
}

impl DeliveryMethod {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryMethod::Pickup => "Pickup",
            DeliveryMethod::Delivery => "Delivery",
        }
    }
}

/// Who cancelled an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelledBy {
    Admin,
    Customer,
}

/// Reference to the product a line item was ordered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Topping selections, one per tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Toppings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customizations {
    #[serde(default)]
    pub flavors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toppings: Option<Toppings>,
}

/// One product selection within an order. Not mutated after the order is placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product: ProductRef,
    pub quantity: u32,
    #[serde(default)]
    pub customizations: Customizations,
    #[serde(default)]
    pub total_price: f64,
}

impl LineItem {
    /// Creates a line item priced at `product.price * quantity`.
    pub fn new(product: ProductRef, quantity: u32) -> Self {
        let total_price = product.price * f64::from(quantity);
        Self {
            product,
            quantity,
            customizations: Customizations::default(),
            total_price,
        }
    }

    pub fn with_customizations(mut self, customizations: Customizations) -> Self {
        self.customizations = customizations;
        self
    }
}

/// A placed order, as stored in the local order slot.
///
/// Field names follow the storefront's camelCase JSON so existing slot
/// contents deserialize unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<CancelledBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

/// The account an order is placed for.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOwner {
    pub user_id: String,
    pub email: Option<String>,
}

impl OrderOwner {
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self { user_id: user_id.into(), email }
    }
}

/// Payload for placing a new order.
///
/// The id, owner and creation timestamp are assigned when the order is
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    pub items: Vec<LineItem>,
    pub total: f64,
    pub status: OrderStatus,
    pub delivery_method: DeliveryMethod,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub delivery_address: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub phone: Option<String>,
    pub metadata: serde_json::Value,
}

impl OrderDraft {
    /// Creates a pickup draft whose total is the sum of the line totals.
    pub fn new(items: Vec<LineItem>) -> Self {
        let total = items.iter().map(|item| item.total_price).sum();
        Self {
            items,
            total,
            ..Self::default()
        }
    }

    /// Switches the draft to delivery and adds `fee` to the total.
    pub fn for_delivery(mut self, address: impl Into<String>, fee: f64) -> Self {
        self.delivery_method = DeliveryMethod::Delivery;
        self.delivery_address = Some(address.into());
        self.total += fee;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }
}

impl Order {
    /// Builds the full order from a draft.
    ///
    /// # Arguments
    /// * `id` - Identifier assigned by the repository
    /// * `user_id` - Owning user
    /// * `email` - Owner's email, if known
    /// * `created_at` - Creation timestamp
    /// * `draft` - Everything the customer chose
    pub fn from_draft(
        id: impl Into<String>,
        user_id: impl Into<String>,
        email: Option<String>,
        created_at: DateTime<Utc>,
        draft: OrderDraft,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            email,
            items: draft.items,
            total: draft.total,
            status: draft.status,
            created_at,
            delivery_method: draft.delivery_method,
            payment_method: draft.payment_method,
            cancelled_by: None,
            notes: draft.notes,
            delivery_address: draft.delivery_address,
            customer_name: draft.customer_name,
            customer_email: draft.customer_email,
            phone: draft.phone,
            metadata: draft.metadata,
        }
    }

    /// Calendar date of creation as seen in `tz`.
    pub fn created_on<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.created_at.with_timezone(tz).date_naive()
    }

    /// Status label; admin cancellations are attributed to the shop.
    pub fn status_label(&self) -> String {
        match (self.status, self.cancelled_by) {
            (OrderStatus::Cancelled, Some(CancelledBy::Admin)) => format!("Cancelled by {}", SHOP_NAME),
            (status, _) => status.label().to_string(),
        }
    }

    /// Total without the delivery fee.
    pub fn subtotal(&self, delivery_fee: f64) -> f64 {
        match self.delivery_method {
            DeliveryMethod::Delivery => self.total - delivery_fee,
            DeliveryMethod::Pickup => self.total,
        }
    }

    pub fn payment_label(&self) -> String {
        self.payment_method
            .as_deref()
            .map(str::to_uppercase)
            .unwrap_or_else(|| "N/A".to_string())
    }

    /// Last six characters of the id, used in compact listings.
    pub fn short_ref(&self) -> &str {
        let start = self
            .id
            .char_indices()
            .rev()
            .nth(5)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.id[start..]
    }
}
