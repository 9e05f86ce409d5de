// src/dashboard/dashboard_structs.rs

use std::collections::{BTreeMap, HashMap};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::products::products_structs::{LowStockItem, ProductCategory};

/// Number of rows in the best-selling table.
pub const BEST_SELLING_LIMIT: usize = 10;

#[derive(Debug, Clone, FromRow)]
pub struct SaleTotalRow {
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// A sold line with enough catalog context to rank variants.
#[derive(Debug, Clone, FromRow)]
pub struct SoldItemRow {
    pub variant_id: Uuid,
    pub variant_name: String,
    pub product_name: String,
    pub category: ProductCategory,
    pub quantity_sold: i32,
    pub price_at_sale: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_revenue: BigDecimal,
    pub total_sales: usize,
    pub total_items_sold: i64,
    pub low_stock_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestSellingProduct {
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_name: String,
    pub category: ProductCategory,
    pub total_sold: i64,
    pub total_revenue: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub best_selling: Vec<BestSellingProduct>,
    pub low_stock_alerts: Vec<LowStockItem>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    Daily,
    Monthly,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    #[serde(default)]
    pub range: TimeRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataPoint {
    pub date: String,
    pub revenue: BigDecimal,
    pub sales: i64,
}

pub fn compute_stats(sales: &[SaleTotalRow], items: &[SoldItemRow], low_stock_count: usize) -> DashboardStats {
    DashboardStats {
        total_revenue: sales
            .iter()
            .fold(BigDecimal::from(0), |acc, s| acc + &s.total_amount),
        total_sales: sales.len(),
        total_items_sold: items.iter().map(|i| i64::from(i.quantity_sold)).sum(),
        low_stock_count,
    }
}

/// Variants ranked by units sold, highest first, at most `limit` of them.
///
/// Revenue uses the price recorded on each line, not the current catalog price.
pub fn best_selling(items: &[SoldItemRow], limit: usize) -> Vec<BestSellingProduct> {
    let mut by_variant: HashMap<Uuid, BestSellingProduct> = HashMap::new();
    for item in items {
        let entry = by_variant.entry(item.variant_id).or_insert_with(|| BestSellingProduct {
            variant_id: item.variant_id,
            product_name: item.product_name.clone(),
            variant_name: item.variant_name.clone(),
            category: item.category,
            total_sold: 0,
            total_revenue: BigDecimal::from(0),
        });
        entry.total_sold += i64::from(item.quantity_sold);
        entry.total_revenue += &item.price_at_sale * BigDecimal::from(item.quantity_sold);
    }

    let mut ranked: Vec<_> = by_variant.into_values().collect();
    // ties broken by name so the table is stable between refreshes
    ranked.sort_by(|a, b| {
        b.total_sold
            .cmp(&a.total_sold)
            .then_with(|| a.product_name.cmp(&b.product_name))
            .then_with(|| a.variant_name.cmp(&b.variant_name))
    });
    ranked.truncate(limit);
    ranked
}

/// Revenue and sale count per UTC day or month, oldest first.
pub fn chart_series(sales: &[SaleTotalRow], range: TimeRange) -> Vec<ChartDataPoint> {
    let format = match range {
        TimeRange::Daily => "%Y-%m-%d",
        TimeRange::Monthly => "%Y-%m",
    };

    let mut buckets: BTreeMap<String, (BigDecimal, i64)> = BTreeMap::new();
    for sale in sales {
        let bucket = buckets
            .entry(sale.created_at.format(format).to_string())
            .or_insert_with(|| (BigDecimal::from(0), 0));
        bucket.0 += sale.total_amount.clone();
        bucket.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(date, (revenue, sales))| ChartDataPoint { date, revenue, sales })
        .collect()
}
