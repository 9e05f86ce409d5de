// src/store/mod.rs

//! Data-store seam used by the sale recorder and the low-stock notifier.
//!
//! Each method is a typed equivalent of a single select / insert / update
//! against the backing store. Nothing here spans more than one statement;
//! callers that need atomicity go through [`TransactionalStore::begin`].

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::sales::sales_structs::{NewSaleItem, Sale, SaleItem};

pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Stock view of a variant, joined with its product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct VariantStock {
    pub id: Uuid,
    pub product_name: String,
    pub variant_name: String,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
}

/// Result of a single stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub previous: i32,
    pub current: i32,
    pub low_stock_threshold: i32,
}

impl StockChange {
    /// True when this change moved stock from above the threshold to at or below it.
    pub fn crossed_threshold(&self) -> bool {
        self.current <= self.low_stock_threshold && self.previous > self.low_stock_threshold
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_variant(&self, variant_id: Uuid) -> Result<Option<VariantStock>, StoreError>;

    async fn insert_sale(
        &self,
        user_id: Uuid,
        total_amount: &BigDecimal,
    ) -> Result<Sale, StoreError>;

    async fn insert_sale_item(&self, item: &NewSaleItem) -> Result<SaleItem, StoreError>;

    /// Unconditional write of a new stock level. The value may be negative.
    async fn set_stock(&self, variant_id: Uuid, stock_quantity: i32) -> Result<(), StoreError>;

    /// Atomic `stock -= quantity` guarded by `stock >= quantity`.
    ///
    /// Returns `None` when the variant is missing or does not hold enough stock.
    async fn decrement_stock(
        &self,
        variant_id: Uuid,
        quantity: i32,
    ) -> Result<Option<StockChange>, StoreError>;

    /// Phone numbers of every admin that has one.
    async fn admin_phone_numbers(&self) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
pub trait TransactionalStore: Store {
    type Transaction: Store + StoreTransaction;

    async fn begin(&self) -> Result<Self::Transaction, StoreError>;
}

#[async_trait]
pub trait StoreTransaction: Send + Sized {
    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
