//! Catalog served while test mode is on

use crate::models::{Brand, Product};
use api_client::ApiError;

const BRANDS: [(&str, &str, &str); 3] = [
    ("brand_green_acres", "Green Acres Farm", "Riverside"),
    ("brand_hive", "Hill Hive Apiary", "Northgate"),
    ("brand_crumb", "Corner Crumb Bakery", "Old Town"),
];

// id, name, price, brand, category
const PRODUCTS: [(&str, &str, f64, &str, &str); 6] = [
    ("prod_eggs", "Free-range Eggs (12)", 4.50, "brand_green_acres", "dairy"),
    ("prod_spinach", "Baby Spinach", 2.25, "brand_green_acres", "produce"),
    ("prod_tomatoes", "Heirloom Tomatoes", 3.80, "brand_green_acres", "produce"),
    ("prod_honey", "Wildflower Honey", 8.00, "brand_hive", "pantry"),
    ("prod_sourdough", "Sourdough Loaf", 5.50, "brand_crumb", "bakery"),
    ("prod_croissant", "Butter Croissant", 2.75, "brand_crumb", "bakery"),
];

pub(crate) fn brands() -> Vec<Brand> {
    BRANDS
        .iter()
        .map(|(id, name, location)| Brand {
            id: (*id).to_string(),
            name: (*name).to_string(),
            description: Some(format!("Local goods from {}", name)),
            logo_url: None,
            location: Some((*location).to_string()),
        })
        .collect()
}

pub(crate) fn products() -> Vec<Product> {
    PRODUCTS
        .iter()
        .map(|(id, name, price, brand_id, category)| Product {
            id: (*id).to_string(),
            name: (*name).to_string(),
            description: None,
            price: *price,
            image_url: None,
            brand_id: Some((*brand_id).to_string()),
            category: Some((*category).to_string()),
            in_stock: true,
        })
        .collect()
}

pub(crate) fn product(id: &str) -> api_client::Result<Product> {
    products()
        .into_iter()
        .find(|product| product.id == id)
        .ok_or_else(|| not_found("Product not found"))
}

pub(crate) fn brand(id: &str) -> api_client::Result<Brand> {
    brands()
        .into_iter()
        .find(|brand| brand.id == id)
        .ok_or_else(|| not_found("Brand not found"))
}

/// Same shape the backend sends for an unknown id
pub(crate) fn not_found(message: &str) -> ApiError {
    ApiError::http(404, serde_json::json!({ "message": message }).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_product_has_a_brand() {
        for product in products() {
            let brand_id = product.brand_id.unwrap();
            assert!(brand(&brand_id).is_ok(), "{} has unknown brand", product.id);
        }
    }

    #[test]
    fn test_unknown_product_is_404() {
        let err = product("prod_missing").unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }
}
