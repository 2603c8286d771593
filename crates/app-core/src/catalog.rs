//! Product and brand browsing
//!
//! Catalog reads do not need a session; they are sent without a bearer
//! token so a signed-out visitor can browse.

use crate::fixtures;
use crate::models::{list_at, Brand, Product};
use crate::validation;
use api_client::descriptor::{MockEnv, RequestDescriptor};
use api_client::{ApiError, ApiRequest, Envelope, RawResponse, Result};
use serde::{Deserialize, Serialize};

/// Largest page the backend serves
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filters and paging for product listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    /// Free-text search on the product name
    pub search: Option<String>,
    /// Restrict to one brand
    pub brand_id: Option<String>,
    /// Restrict to one category
    pub category: Option<String>,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self { search: None, brand_id: None, category: None, page: 1, limit: 20 }
    }
}

impl ProductQuery {
    /// Search by name
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Only products from `brand_id`
    pub fn brand(mut self, brand_id: impl Into<String>) -> Self {
        self.brand_id = Some(brand_id.into());
        self
    }

    /// Only products in `category`
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Select a page
    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    fn matches(&self, product: &Product) -> bool {
        let search = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        search.map_or(true, |term| product.name.to_lowercase().contains(&term.to_lowercase()))
            && self.brand_id.as_ref().map_or(true, |id| product.brand_id.as_ref() == Some(id))
            && self.category.as_ref().map_or(true, |c| product.category.as_ref() == Some(c))
    }
}

/// One page of products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Products on this page
    pub products: Vec<Product>,
    /// Page number reported by the backend
    pub page: u32,
    /// Total matching products, when reported
    pub total: Option<u64>,
}

/// `GET /products`
#[derive(Debug, Clone, Copy, Default)]
pub struct ListProducts;

impl RequestDescriptor for ListProducts {
    type Input = ProductQuery;
    type Output = ProductPage;
    const NAME: &'static str = "catalog.listProducts";

    fn authenticated(&self) -> bool {
        false
    }

    fn validate(&self, input: &ProductQuery) -> Result<()> {
        if input.page == 0 {
            return Err(ApiError::validation("Page must be at least 1"));
        }
        if input.limit == 0 || input.limit > MAX_PAGE_SIZE {
            return Err(ApiError::validation(format!(
                "Page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    fn mock(&self, input: &ProductQuery, _env: &MockEnv) -> Result<ProductPage> {
        let matching: Vec<Product> = fixtures::products()
            .into_iter()
            .filter(|product| input.matches(product))
            .collect();
        let total = matching.len() as u64;
        let skip = (input.page.saturating_sub(1) as usize).saturating_mul(input.limit as usize);

        Ok(ProductPage {
            products: matching.into_iter().skip(skip).take(input.limit as usize).collect(),
            page: input.page,
            total: Some(total),
        })
    }

    fn request(&self, input: &ProductQuery) -> Result<ApiRequest> {
        Ok(ApiRequest::get("/products")
            .query_opt("search", input.search.as_ref())
            .query_opt("brandId", input.brand_id.as_ref())
            .query_opt("category", input.category.as_ref())
            .query("page", input.page.to_string())
            .query("limit", input.limit.to_string()))
    }

    fn normalize(&self, response: &RawResponse) -> Result<ProductPage> {
        let envelope = Envelope::parse(response)?;
        Ok(ProductPage {
            products: list_at(response, "/data/products")?,
            page: envelope.optional("/data/page")?.unwrap_or(1),
            total: envelope.optional("/data/total")?,
        })
    }
}

/// `GET /products/{id}`
#[derive(Debug, Clone, Copy, Default)]
pub struct GetProduct;

impl RequestDescriptor for GetProduct {
    type Input = String;
    type Output = Product;
    const NAME: &'static str = "catalog.getProduct";

    fn authenticated(&self) -> bool {
        false
    }

    fn validate(&self, id: &String) -> Result<()> {
        validation::path_id("Product id", id)
    }

    fn mock(&self, id: &String, _env: &MockEnv) -> Result<Product> {
        fixtures::product(id)
    }

    fn request(&self, id: &String) -> Result<ApiRequest> {
        Ok(ApiRequest::get(format!("/products/{}", id)))
    }

    fn normalize(&self, response: &RawResponse) -> Result<Product> {
        let envelope = Envelope::parse(response)?;
        match envelope.optional("/data/product")? {
            Some(product) => Ok(product),
            None => envelope.require_payload(),
        }
    }
}

/// `GET /brands`
#[derive(Debug, Clone, Copy, Default)]
pub struct ListBrands;

impl RequestDescriptor for ListBrands {
    /// Optional name search
    type Input = Option<String>;
    type Output = Vec<Brand>;
    const NAME: &'static str = "catalog.listBrands";

    fn authenticated(&self) -> bool {
        false
    }

    fn mock(&self, search: &Option<String>, _env: &MockEnv) -> Result<Vec<Brand>> {
        let term = search.as_deref().unwrap_or_default().trim().to_lowercase();
        Ok(fixtures::brands()
            .into_iter()
            .filter(|brand| brand.name.to_lowercase().contains(&term))
            .collect())
    }

    fn request(&self, search: &Option<String>) -> Result<ApiRequest> {
        Ok(ApiRequest::get("/brands").query_opt("search", search.as_ref()))
    }

    fn normalize(&self, response: &RawResponse) -> Result<Vec<Brand>> {
        list_at(response, "/data/brands")
    }
}

/// A brand page: the seller and what it sells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandDetail {
    /// The seller
    pub brand: Brand,
    /// Its products; empty when the backend omits them
    pub products: Vec<Product>,
}

/// `GET /brands/{id}`
#[derive(Debug, Clone, Copy, Default)]
pub struct GetBrand;

impl RequestDescriptor for GetBrand {
    type Input = String;
    type Output = BrandDetail;
    const NAME: &'static str = "catalog.getBrand";

    fn authenticated(&self) -> bool {
        false
    }

    fn validate(&self, id: &String) -> Result<()> {
        validation::path_id("Brand id", id)
    }

    fn mock(&self, id: &String, _env: &MockEnv) -> Result<BrandDetail> {
        let brand = fixtures::brand(id)?;
        let products = fixtures::products()
            .into_iter()
            .filter(|product| product.brand_id.as_deref() == Some(id.as_str()))
            .collect();
        Ok(BrandDetail { brand, products })
    }

    fn request(&self, id: &String) -> Result<ApiRequest> {
        Ok(ApiRequest::get(format!("/brands/{}", id)))
    }

    fn normalize(&self, response: &RawResponse) -> Result<BrandDetail> {
        let envelope = Envelope::parse(response)?;
        Ok(BrandDetail {
            brand: envelope.require("/data/brand")?,
            products: envelope.optional("/data/products")?.unwrap_or_default(),
        })
    }
}
