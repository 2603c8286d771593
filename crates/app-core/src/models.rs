//! Wire models shared by the BuyLocal descriptors
//!
//! Field names follow the backend's camelCase JSON.

use api_client::{ApiError, Envelope, RawResponse, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A BuyLocal account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend id (`_id` on some endpoints)
    #[serde(alias = "_id")]
    pub id: String,
    /// Login email
    pub email: String,
    /// Given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Contact number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Whether the email has been confirmed
    #[serde(default)]
    pub is_verified: bool,
}

/// A product listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product id
    #[serde(alias = "_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Long description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price in major currency units
    pub price: f64,
    /// Image shown in listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Owning brand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    /// Category slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Availability
    #[serde(default = "default_true")]
    pub in_stock: bool,
}

fn default_true() -> bool {
    true
}

/// A local seller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    /// Brand id
    #[serde(alias = "_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// About text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Logo image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Town or neighbourhood
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// One line of a cart or order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product id
    pub product_id: String,
    /// Product name at the time it was added
    pub name: String,
    /// Price per unit
    pub unit_price: f64,
    /// Units, at least one
    pub quantity: u32,
}

impl LineItem {
    /// Price times quantity
    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// The signed-in user's cart
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in the cart
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Cart {
    /// Sum of all line totals
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Total number of units
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Order lifecycle as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, awaiting payment or confirmation
    Pending,
    /// Accepted by the seller
    Confirmed,
    /// Being packed
    Processing,
    /// Out for delivery
    Shipped,
    /// Handed over
    Delivered,
    /// Cancelled by buyer or seller
    Cancelled,
    /// A status this client does not know yet
    #[serde(other)]
    Unknown,
}

/// A placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order id
    #[serde(alias = "_id")]
    pub id: String,
    /// Current status
    pub status: OrderStatus,
    /// Ordered lines
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Amount charged
    pub total: f64,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
    /// Where it is delivered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
}

/// A step in an order's delivery history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    /// Status reached
    pub status: OrderStatus,
    /// Human-readable note
    pub description: String,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

/// Delivery progress of one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
    /// Order id
    pub order_id: String,
    /// Latest status
    pub status: OrderStatus,
    /// History, oldest first
    #[serde(default)]
    pub events: Vec<TrackingEvent>,
    /// Expected hand-over time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// An in-app notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification id
    #[serde(alias = "_id")]
    pub id: String,
    /// Headline
    pub title: String,
    /// Body text
    #[serde(default)]
    pub body: String,
    /// Whether the user opened it
    #[serde(default)]
    pub read: bool,
    /// When it was sent
    pub created_at: DateTime<Utc>,
}

/// Plain acknowledgement carrying the backend's message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Message to show the user
    pub message: String,
}

impl Ack {
    /// Create an acknowledgement
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Read the envelope's message, falling back when the backend sent none
    pub fn from_response(response: &RawResponse, fallback: &str) -> Result<Self> {
        let envelope = Envelope::parse(response)?;
        let message = envelope
            .message()
            .filter(|message| !message.is_empty())
            .unwrap_or(fallback);
        Ok(Self::new(message))
    }
}

/// Decode a list at `pointer`, accepting a bare payload array as well
pub(crate) fn list_at<T: serde::de::DeserializeOwned>(response: &RawResponse, pointer: &str) -> Result<Vec<T>> {
    let envelope = Envelope::parse(response)?;
    if let Some(list) = envelope.optional(pointer)? {
        return Ok(list);
    }
    match envelope.payload() {
        Some(value) if value.is_array() => envelope.require_payload(),
        _ => Err(ApiError::malformed(format!("missing required field {}", pointer))),
    }
}
