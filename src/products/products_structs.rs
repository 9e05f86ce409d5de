// src/products/products_structs.rs

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

/// Jewelry category of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Necklace,
    Bracelet,
    Earrings,
    Watch,
    Ring,
}

/// A product as stored in the `products` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchasable configuration (SKU) of a product.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub variant_name: String,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProductWithVariants {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

/// Variant at or below its low-stock threshold.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LowStockItem {
    pub id: Uuid,
    pub sku: String,
    pub variant_name: String,
    pub product_name: String,
    pub category: ProductCategory,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
    pub price: BigDecimal,
}

/// Payload of `POST /products`: the product and its first variant.
#[derive(Debug, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub image_url: Option<String>,
    pub variant_name: String,
    pub sku: String,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
}

/// Payload of `POST /variants`.
#[derive(Debug, Deserialize)]
pub struct NewVariant {
    pub product_id: Uuid,
    pub variant_name: String,
    pub sku: String,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
}

/// Payload of `PUT /variants/{id}`. Missing fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateVariant {
    pub variant_name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<BigDecimal>,
    pub stock_quantity: Option<i32>,
    pub low_stock_threshold: Option<i32>,
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn check_variant_numbers(
    price: Option<&BigDecimal>,
    stock_quantity: Option<i32>,
    low_stock_threshold: Option<i32>,
) -> Result<(), AppError> {
    if price.is_some_and(|p| *p < BigDecimal::from(0)) {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    if price.is_some_and(|p| p.with_scale(2) != *p) {
        return Err(AppError::Validation("price must have at most two decimal places".into()));
    }
    if stock_quantity.is_some_and(|q| q < 0) {
        return Err(AppError::Validation("stock_quantity must not be negative".into()));
    }
    if low_stock_threshold.is_some_and(|t| t < 0) {
        return Err(AppError::Validation("low_stock_threshold must not be negative".into()));
    }
    Ok(())
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("name", &self.name)?;
        require_text("variant_name", &self.variant_name)?;
        require_text("sku", &self.sku)?;
        check_variant_numbers(Some(&self.price), Some(self.stock_quantity), Some(self.low_stock_threshold))
    }
}

impl NewVariant {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("variant_name", &self.variant_name)?;
        require_text("sku", &self.sku)?;
        check_variant_numbers(Some(&self.price), Some(self.stock_quantity), Some(self.low_stock_threshold))
    }
}

impl UpdateVariant {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.variant_name {
            require_text("variant_name", name)?;
        }
        if let Some(sku) = &self.sku {
            require_text("sku", sku)?;
        }
        check_variant_numbers(self.price.as_ref(), self.stock_quantity, self.low_stock_threshold)
    }
}

/// Group variants under their product, keeping product order.
pub fn group_variants(products: Vec<Product>, variants: Vec<ProductVariant>) -> Vec<ProductWithVariants> {
    let mut by_product: HashMap<Uuid, Vec<ProductVariant>> = HashMap::new();
    for v in variants {
        by_product.entry(v.product_id).or_default().push(v);
    }
    products
        .into_iter()
        .map(|product| ProductWithVariants {
            variants: by_product.remove(&product.id).unwrap_or_default(),
            product,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            category: ProductCategory::Necklace,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variant(product_id: Uuid, sku: &str) -> ProductVariant {
        ProductVariant {
            id: Uuid::new_v4(),
            product_id,
            sku: sku.into(),
            variant_name: "Gold".into(),
            price: BigDecimal::from(120),
            stock_quantity: 3,
            low_stock_threshold: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn variants_are_grouped_by_product() {
        let a = product("Aurora");
        let b = product("Lune");
        let (a_id, b_id) = (a.id, b.id);
        let grouped = group_variants(
            vec![a, b],
            vec![variant(a_id, "AUR-G"), variant(b_id, "LUN-S"), variant(a_id, "AUR-S")],
        );

        assert_eq!(grouped[0].product.name, "Aurora");
        assert_eq!(grouped[0].variants.len(), 2);
        assert_eq!(grouped[1].variants[0].sku, "LUN-S");
    }

    #[test]
    fn product_json_is_flattened() {
        let p = product("Aurora");
        let json = serde_json::to_value(ProductWithVariants {
            product: p,
            variants: vec![],
        })
        .unwrap();
        assert_eq!(json["name"], "Aurora");
        assert_eq!(json["category"], "necklace");
        assert_eq!(json["variants"], serde_json::json!([]));
    }

    #[test]
    fn update_rejects_negative_numbers_and_blank_text() {
        assert!(UpdateVariant::default().validate().is_ok());
        assert!(UpdateVariant {
            stock_quantity: Some(-1),
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(UpdateVariant {
            price: Some(BigDecimal::from(-3)),
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(UpdateVariant {
            price: Some("12.345".parse().unwrap()),
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(UpdateVariant {
            sku: Some("  ".into()),
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn new_variant_requires_sku() {
        let form = NewVariant {
            product_id: Uuid::new_v4(),
            variant_name: "Silver".into(),
            sku: "".into(),
            price: BigDecimal::from(10),
            stock_quantity: 1,
            low_stock_threshold: 0,
        };
        assert!(matches!(form.validate(), Err(AppError::Validation(_))));
    }
}
