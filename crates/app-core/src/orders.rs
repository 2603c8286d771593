//! Orders, delivery tracking and payment initialization

use crate::fixtures;
use crate::models::{list_at, LineItem, Order, OrderStatus, Tracking, TrackingEvent};
use crate::validation;
use api_client::descriptor::{MockEnv, RequestDescriptor};
use api_client::{ApiError, ApiRequest, Envelope, RawResponse, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

fn order_from(response: &RawResponse) -> Result<Order> {
    let envelope = Envelope::parse(response)?;
    match envelope.optional("/data/order")? {
        Some(order) => Ok(order),
        None => envelope.require_payload(),
    }
}

/// `GET /orders`
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOrders;

impl RequestDescriptor for ListOrders {
    type Input = ();
    type Output = Vec<Order>;
    const NAME: &'static str = "orders.list";

    fn mock(&self, _input: &(), env: &MockEnv) -> Result<Vec<Order>> {
        let line = |id: &str, quantity| -> Result<LineItem> {
            let product = fixtures::product(id)?;
            Ok(LineItem { product_id: product.id, name: product.name, unit_price: product.price, quantity })
        };

        let delivered = vec![line("prod_sourdough", 1)?, line("prod_honey", 1)?];
        let pending = vec![line("prod_eggs", 2)?];

        Ok(vec![
            Order {
                id: env.synthetic_id("order"),
                status: OrderStatus::Pending,
                total: pending.iter().map(LineItem::line_total).sum(),
                items: pending,
                created_at: env.now(),
                delivery_address: Some("12 Market Street".to_string()),
            },
            Order {
                id: format!("order_{}", env.timestamp_millis() - Duration::days(3).num_milliseconds()),
                status: OrderStatus::Delivered,
                total: delivered.iter().map(LineItem::line_total).sum(),
                items: delivered,
                created_at: env.now() - Duration::days(3),
                delivery_address: Some("12 Market Street".to_string()),
            },
        ])
    }

    fn request(&self, _input: &()) -> Result<ApiRequest> {
        Ok(ApiRequest::get("/orders"))
    }

    fn normalize(&self, response: &RawResponse) -> Result<Vec<Order>> {
        list_at(response, "/data/orders")
    }
}

/// `GET /orders/{id}/track`
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackOrder;

impl RequestDescriptor for TrackOrder {
    type Input = String;
    type Output = Tracking;
    const NAME: &'static str = "orders.track";

    fn validate(&self, order_id: &String) -> Result<()> {
        validation::path_id("Order id", order_id)
    }

    fn mock(&self, order_id: &String, env: &MockEnv) -> Result<Tracking> {
        let now = env.now();
        Ok(Tracking {
            order_id: order_id.clone(),
            status: OrderStatus::Shipped,
            events: vec![
                TrackingEvent {
                    status: OrderStatus::Confirmed,
                    description: "Seller confirmed your order".to_string(),
                    timestamp: now - Duration::hours(26),
                },
                TrackingEvent {
                    status: OrderStatus::Processing,
                    description: "Packed at the farm shop".to_string(),
                    timestamp: now - Duration::hours(20),
                },
                TrackingEvent {
                    status: OrderStatus::Shipped,
                    description: "Out with a local courier".to_string(),
                    timestamp: now - Duration::hours(2),
                },
            ],
            estimated_delivery: Some(now + Duration::hours(4)),
        })
    }

    fn request(&self, order_id: &String) -> Result<ApiRequest> {
        Ok(ApiRequest::get(format!("/orders/{}/track", order_id)))
    }

    fn normalize(&self, response: &RawResponse) -> Result<Tracking> {
        let envelope = Envelope::parse(response)?;
        match envelope.optional("/data/tracking")? {
            Some(tracking) => Ok(tracking),
            None => envelope.require_payload(),
        }
    }
}

/// One product line of a new order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Product id
    pub product_id: String,
    /// Units
    pub quantity: u32,
}

/// Checkout request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderInput {
    /// What to buy
    pub items: Vec<OrderLine>,
    /// Where to deliver
    pub delivery_address: String,
    /// Note for the seller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// `POST /orders`
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceOrder;

impl RequestDescriptor for PlaceOrder {
    type Input = PlaceOrderInput;
    type Output = Order;
    const NAME: &'static str = "orders.place";

    fn validate(&self, input: &PlaceOrderInput) -> Result<()> {
        if input.items.is_empty() {
            return Err(ApiError::validation("Your cart is empty"));
        }
        for line in &input.items {
            validation::path_id("Product id", &line.product_id)?;
            if line.quantity == 0 {
                return Err(ApiError::validation("Quantity must be at least 1"));
            }
        }
        validation::require_non_empty("Delivery address", &input.delivery_address)
    }

    fn mock(&self, input: &PlaceOrderInput, env: &MockEnv) -> Result<Order> {
        let items = input
            .items
            .iter()
            .map(|line| {
                let product = fixtures::product(&line.product_id)?;
                Ok(LineItem {
                    product_id: product.id,
                    name: product.name,
                    unit_price: product.price,
                    quantity: line.quantity,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Order {
            id: env.synthetic_id("order"),
            status: OrderStatus::Pending,
            total: items.iter().map(LineItem::line_total).sum(),
            items,
            created_at: env.now(),
            delivery_address: Some(input.delivery_address.clone()),
        })
    }

    fn request(&self, input: &PlaceOrderInput) -> Result<ApiRequest> {
        ApiRequest::post("/orders").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> Result<Order> {
        order_from(response)
    }
}

/// Start paying for an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    /// Order being paid
    pub order_id: String,
    /// Receipt address
    pub email: String,
    /// Amount in minor currency units (kobo, cents)
    pub amount: u64,
    /// Where the checkout page sends the user afterwards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

impl PaymentInput {
    /// Pay the full total of `order`
    ///
    /// The total is rounded to the nearest minor unit; a negative or
    /// non-finite total becomes zero and fails validation.
    pub fn for_order(order: &Order, email: impl Into<String>) -> Self {
        Self {
            order_id: order.id.clone(),
            email: email.into(),
            amount: (order.total * 100.0).round() as u64,
            callback_url: None,
        }
    }
}

/// Hosted checkout session returned by the payment gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Page to open for the user
    #[serde(alias = "authorizationUrl")]
    pub authorization_url: String,
    /// Gateway reference for later verification
    pub reference: String,
    /// Gateway access code, when provided
    #[serde(default, alias = "accessCode", skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
}

/// `POST /payments/initialize`
#[derive(Debug, Clone, Copy, Default)]
pub struct InitializePayment;

impl RequestDescriptor for InitializePayment {
    type Input = PaymentInput;
    type Output = PaymentSession;
    const NAME: &'static str = "payments.initialize";

    fn validate(&self, input: &PaymentInput) -> Result<()> {
        validation::require_non_empty("Order id", &input.order_id)?;
        validation::email(&input.email)?;
        if input.amount == 0 {
            return Err(ApiError::validation("Amount must be greater than zero"));
        }
        Ok(())
    }

    fn mock(&self, _input: &PaymentInput, env: &MockEnv) -> Result<PaymentSession> {
        let reference = env.synthetic_id("ref");
        Ok(PaymentSession {
            authorization_url: format!("https://checkout.buylocal.test/pay/{}", reference),
            access_code: Some(env.synthetic_id("access")),
            reference,
        })
    }

    fn request(&self, input: &PaymentInput) -> Result<ApiRequest> {
        ApiRequest::post("/payments/initialize").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> Result<PaymentSession> {
        Envelope::parse(response)?.require_payload()
    }
}
