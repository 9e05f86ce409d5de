// src/sales/sales_structs.rs

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::products::products_structs::ProductCategory;

/// One line of the cart submitted at checkout.
///
/// `price_at_sale` is the price the seller charged, not the live catalog price.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CartLine {
    pub variant_id: Uuid,
    pub quantity: i32,
    pub price_at_sale: BigDecimal,
}

/// Body of `POST /sales`. The seller is always the authenticated user.
#[derive(Debug, Deserialize)]
pub struct RecordSaleRequest {
    pub items: Vec<CartLine>,
}

/// Sale header as stored in the `sales` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// Line item as stored in the `sale_items` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub variant_id: Uuid,
    /// Position of the line in the cart, starting at 1.
    pub line_number: i32,
    pub quantity_sold: i32,
    pub price_at_sale: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub sale_id: Uuid,
    pub variant_id: Uuid,
    pub line_number: i32,
    pub quantity_sold: i32,
    pub price_at_sale: BigDecimal,
}

/// Query string of `GET /sales`.
#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    pub limit: Option<i64>,
}

/// Sale header joined with the seller's name.
#[derive(Debug, Clone, FromRow)]
pub struct SaleHeaderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub seller_name: String,
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// Line item joined with its variant and product.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleItemDetail {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub variant_id: Uuid,
    pub quantity_sold: i32,
    pub price_at_sale: BigDecimal,
    pub sku: String,
    pub variant_name: String,
    pub product_name: String,
    pub category: ProductCategory,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleWithItems {
    pub id: Uuid,
    pub user_id: Uuid,
    pub seller_name: String,
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleItemDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub total_revenue: BigDecimal,
    pub total_sales: usize,
}

/// Body of `GET /sales`.
#[derive(Debug, Serialize)]
pub struct SalesPage {
    pub summary: SalesSummary,
    pub sales: Vec<SaleWithItems>,
}

/// Attach line items to their headers, keeping header order.
pub fn attach_items(headers: Vec<SaleHeaderRow>, items: Vec<SaleItemDetail>) -> Vec<SaleWithItems> {
    let mut by_sale: HashMap<Uuid, Vec<SaleItemDetail>> = HashMap::new();
    for item in items {
        by_sale.entry(item.sale_id).or_default().push(item);
    }

    headers
        .into_iter()
        .map(|h| SaleWithItems {
            items: by_sale.remove(&h.id).unwrap_or_default(),
            id: h.id,
            user_id: h.user_id,
            seller_name: h.seller_name,
            total_amount: h.total_amount,
            created_at: h.created_at,
        })
        .collect()
}

pub fn summarize(sales: &[SaleWithItems]) -> SalesSummary {
    SalesSummary {
        total_revenue: sales
            .iter()
            .fold(BigDecimal::from(0), |acc, s| acc + &s.total_amount),
        total_sales: sales.len(),
    }
}
