//! Shopping cart
//!
//! Every cart call answers with the full cart so screens can re-render from
//! the response alone. Offline, the mock cart only reflects the call being
//! made; there is no stored cart behind it.

use crate::fixtures;
use crate::models::{Cart, LineItem};
use crate::validation;
use api_client::descriptor::{MockEnv, RequestDescriptor};
use api_client::{ApiError, ApiRequest, Envelope, RawResponse, Result};
use serde::{Deserialize, Serialize};

fn cart_from(response: &RawResponse) -> Result<Cart> {
    let envelope = Envelope::parse(response)?;
    match envelope.optional("/data/cart")? {
        Some(cart) => Ok(cart),
        None => envelope.require_payload(),
    }
}

fn quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(ApiError::validation("Quantity must be at least 1"));
    }
    Ok(())
}

fn single_line(product_id: &str, quantity: u32) -> Result<Cart> {
    let product = fixtures::product(product_id)?;
    Ok(Cart {
        items: vec![LineItem {
            product_id: product.id,
            name: product.name,
            unit_price: product.price,
            quantity,
        }],
    })
}

/// `GET /cart`
#[derive(Debug, Clone, Copy, Default)]
pub struct GetCart;

impl RequestDescriptor for GetCart {
    type Input = ();
    type Output = Cart;
    const NAME: &'static str = "cart.get";

    fn mock(&self, _input: &(), _env: &MockEnv) -> Result<Cart> {
        Ok(Cart::default())
    }

    fn request(&self, _input: &()) -> Result<ApiRequest> {
        Ok(ApiRequest::get("/cart"))
    }

    fn normalize(&self, response: &RawResponse) -> Result<Cart> {
        cart_from(response)
    }
}

/// A product and how many of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Product id
    pub product_id: String,
    /// Units, at least one
    pub quantity: u32,
}

impl CartLineInput {
    /// Create a line
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self { product_id: product_id.into(), quantity }
    }
}

/// `POST /cart/items`
#[derive(Debug, Clone, Copy, Default)]
pub struct AddToCart;

impl RequestDescriptor for AddToCart {
    type Input = CartLineInput;
    type Output = Cart;
    const NAME: &'static str = "cart.add";

    fn validate(&self, input: &CartLineInput) -> Result<()> {
        validation::path_id("Product id", &input.product_id)?;
        quantity(input.quantity)
    }

    fn mock(&self, input: &CartLineInput, _env: &MockEnv) -> Result<Cart> {
        single_line(&input.product_id, input.quantity)
    }

    fn request(&self, input: &CartLineInput) -> Result<ApiRequest> {
        ApiRequest::post("/cart/items").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> Result<Cart> {
        cart_from(response)
    }
}

/// `PATCH /cart/items/{productId}`
///
/// Setting a quantity of zero is rejected; use [`RemoveCartItem`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateCartItem;

impl RequestDescriptor for UpdateCartItem {
    type Input = CartLineInput;
    type Output = Cart;
    const NAME: &'static str = "cart.update";

    fn validate(&self, input: &CartLineInput) -> Result<()> {
        validation::path_id("Product id", &input.product_id)?;
        quantity(input.quantity)
    }

    fn mock(&self, input: &CartLineInput, _env: &MockEnv) -> Result<Cart> {
        single_line(&input.product_id, input.quantity)
    }

    fn request(&self, input: &CartLineInput) -> Result<ApiRequest> {
        ApiRequest::patch(format!("/cart/items/{}", input.product_id))
            .json(&serde_json::json!({ "quantity": input.quantity }))
    }

    fn normalize(&self, response: &RawResponse) -> Result<Cart> {
        cart_from(response)
    }
}

/// `DELETE /cart/items/{productId}`
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveCartItem;

impl RequestDescriptor for RemoveCartItem {
    type Input = String;
    type Output = Cart;
    const NAME: &'static str = "cart.remove";

    fn validate(&self, product_id: &String) -> Result<()> {
        validation::path_id("Product id", product_id)
    }

    fn mock(&self, product_id: &String, _env: &MockEnv) -> Result<Cart> {
        fixtures::product(product_id)?;
        Ok(Cart::default())
    }

    fn request(&self, product_id: &String) -> Result<ApiRequest> {
        Ok(ApiRequest::delete(format!("/cart/items/{}", product_id)))
    }

    fn normalize(&self, response: &RawResponse) -> Result<Cart> {
        cart_from(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::test_utils::TestHarness;
    use api_client::{HttpMethod, Session};
    use serde_json::json;

    #[tokio::test]
    async fn test_zero_quantity_rejected_before_request() {
        let harness = TestHarness::new();

        let err = harness.ctx.invoke(&AddToCart, CartLineInput::new("prod_eggs", 0)).await.unwrap_err();
        assert_eq!(err, ApiError::validation("Quantity must be at least 1"));
        assert!(harness.ctx.invoke(&UpdateCartItem, CartLineInput::new("prod_eggs", 0)).await.is_err());
        assert_eq!(harness.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_add_uses_catalog_price() {
        let harness = TestHarness::mocked();

        let cart = harness.ctx.invoke(&AddToCart, CartLineInput::new("prod_honey", 3)).await.unwrap();
        assert_eq!(cart.items[0].name, "Wildflower Honey");
        assert_eq!(cart.subtotal(), 24.0);

        let err = harness.ctx.invoke(&AddToCart, CartLineInput::new("prod_ghost", 1)).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn test_mock_unknown_product_is_404_for_update_and_remove() {
        let harness = TestHarness::mocked();

        let err = harness.ctx.invoke(&UpdateCartItem, CartLineInput::new("prod_ghost", 2)).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        let err = harness.ctx.invoke(&RemoveCartItem, "prod_ghost".to_string()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));

        let cart = harness.ctx.invoke(&RemoveCartItem, "prod_eggs".to_string()).await.unwrap();
        assert!(cart.items.is_empty());
    }

    #[tokio::test]
    async fn test_live_add_sends_bearer_and_body() {
        let harness = TestHarness::new();
        harness.session.set_session(Session::new("tok_cart"));
        harness.transport.respond_json(
            200,
            json!({"data": {"cart": {"items": [
                {"productId": "p1", "name": "Jam", "unitPrice": 3.0, "quantity": 2}
            ]}}}),
        );

        let cart = harness.ctx.invoke(&AddToCart, CartLineInput::new("p1", 2)).await.unwrap();

        assert_eq!(cart.item_count(), 2);
        let request = harness.transport.last_request().unwrap();
        assert_eq!(request.header("Authorization"), Some("Bearer tok_cart"));
        let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(body, json!({"productId": "p1", "quantity": 2}));
    }

    #[tokio::test]
    async fn test_live_update_and_remove_paths() {
        let harness = TestHarness::new();
        harness.transport.respond_json(200, json!({"data": {"items": []}}));
        harness.transport.respond_json(200, json!({"data": {"cart": {"items": []}}}));

        harness.ctx.invoke(&UpdateCartItem, CartLineInput::new("p1", 5)).await.unwrap();
        let cart = harness.ctx.invoke(&RemoveCartItem, "p1".to_string()).await.unwrap();

        assert_eq!(cart, Cart::default());
        let requests = harness.transport.requests();
        assert_eq!(requests[0].method, HttpMethod::Patch);
        assert!(requests[0].url.ends_with("/cart/items/p1"));
        assert_eq!(requests[1].method, HttpMethod::Delete);
    }

    #[tokio::test]
    async fn test_live_cart_missing_payload_is_malformed() {
        let harness = TestHarness::new();
        harness.transport.respond_json(200, json!({"message": "ok"}));

        let err = harness.ctx.invoke(&GetCart, ()).await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }
}
