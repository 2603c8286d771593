//! BuyLocal domain operations
//!
//! Each backend operation is a [`RequestDescriptor`](api_client::RequestDescriptor)
//! grouped by area: authentication, catalog, cart, orders and payments,
//! notifications, feedback and account management. Invoke them through an
//! [`ApiContext`](api_client::ApiContext); [`auth::AuthService`] handles the
//! calls that change who is signed in.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod feedback;
pub mod models;
pub mod notifications;
pub mod orders;
pub mod validation;

mod fixtures;

pub use auth::{AuthError, AuthService};
pub use models::{Ack, Brand, Cart, LineItem, Notification, Order, OrderStatus, Product, Tracking, TrackingEvent, User};
