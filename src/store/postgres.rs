// src/store/postgres.rs

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::postgres::PgExecutor;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{StockChange, Store, StoreError, StoreTransaction, TransactionalStore, VariantStock};
use crate::sales::sales_structs::{NewSaleItem, Sale, SaleItem};

/// [`Store`] backed by the PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

/// A store bound to one open transaction.
///
/// The mutex only serializes access to the connection; the recorder issues
/// statements one at a time anyway.
pub struct PgTransaction {
    tx: Mutex<Transaction<'static, Postgres>>,
}

async fn find_variant<'e, E>(executor: E, variant_id: Uuid) -> Result<Option<VariantStock>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, VariantStock>(
        "SELECT v.id, p.name AS product_name, v.variant_name, v.stock_quantity, v.low_stock_threshold \
         FROM product_variants v JOIN products p ON p.id = v.product_id \
         WHERE v.id = $1",
    )
    .bind(variant_id)
    .fetch_optional(executor)
    .await
}

async fn insert_sale<'e, E>(executor: E, user_id: Uuid, total_amount: &BigDecimal) -> Result<Sale, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Sale>(
        "INSERT INTO sales (user_id, total_amount) VALUES ($1, $2) \
         RETURNING id, user_id, total_amount, created_at",
    )
    .bind(user_id)
    .bind(total_amount)
    .fetch_one(executor)
    .await
}

async fn insert_sale_item<'e, E>(executor: E, item: &NewSaleItem) -> Result<SaleItem, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, SaleItem>(
        "INSERT INTO sale_items (sale_id, variant_id, line_number, quantity_sold, price_at_sale) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, sale_id, variant_id, line_number, quantity_sold, price_at_sale, created_at",
    )
    .bind(item.sale_id)
    .bind(item.variant_id)
    .bind(item.line_number)
    .bind(item.quantity_sold)
    .bind(&item.price_at_sale)
    .fetch_one(executor)
    .await
}

async fn set_stock<'e, E>(executor: E, variant_id: Uuid, stock_quantity: i32) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE product_variants SET stock_quantity = $1, updated_at = now() WHERE id = $2")
        .bind(stock_quantity)
        .bind(variant_id)
        .execute(executor)
        .await?;
    Ok(())
}

async fn decrement_stock<'e, E>(
    executor: E,
    variant_id: Uuid,
    quantity: i32,
) -> Result<Option<StockChange>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, (i32, i32, i32)>(
        "UPDATE product_variants \
         SET stock_quantity = stock_quantity - $1, updated_at = now() \
         WHERE id = $2 AND stock_quantity >= $1 \
         RETURNING stock_quantity + $1, stock_quantity, low_stock_threshold",
    )
    .bind(quantity)
    .bind(variant_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|(previous, current, low_stock_threshold)| StockChange {
        previous,
        current,
        low_stock_threshold,
    }))
}

async fn admin_phone_numbers<'e, E>(executor: E) -> Result<Vec<String>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, String>(
        "SELECT phone_number FROM users WHERE role = 'admin' AND phone_number IS NOT NULL",
    )
    .fetch_all(executor)
    .await
}

#[async_trait]
impl Store for PgStore {
    async fn find_variant(&self, variant_id: Uuid) -> Result<Option<VariantStock>, StoreError> {
        Ok(find_variant(&self.pool, variant_id).await?)
    }

    async fn insert_sale(&self, user_id: Uuid, total_amount: &BigDecimal) -> Result<Sale, StoreError> {
        Ok(insert_sale(&self.pool, user_id, total_amount).await?)
    }

    async fn insert_sale_item(&self, item: &NewSaleItem) -> Result<SaleItem, StoreError> {
        Ok(insert_sale_item(&self.pool, item).await?)
    }

    async fn set_stock(&self, variant_id: Uuid, stock_quantity: i32) -> Result<(), StoreError> {
        Ok(set_stock(&self.pool, variant_id, stock_quantity).await?)
    }

    async fn decrement_stock(&self, variant_id: Uuid, quantity: i32) -> Result<Option<StockChange>, StoreError> {
        Ok(decrement_stock(&self.pool, variant_id, quantity).await?)
    }

    async fn admin_phone_numbers(&self) -> Result<Vec<String>, StoreError> {
        Ok(admin_phone_numbers(&self.pool).await?)
    }
}

#[async_trait]
impl TransactionalStore for PgStore {
    type Transaction = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Unavailable("connection pool is closed".into()));
        }
        let tx = self.pool.begin().await?;
        Ok(PgTransaction { tx: Mutex::new(tx) })
    }
}

#[async_trait]
impl Store for PgTransaction {
    async fn find_variant(&self, variant_id: Uuid) -> Result<Option<VariantStock>, StoreError> {
        let mut tx = self.tx.lock().await;
        Ok(find_variant(&mut **tx, variant_id).await?)
    }

    async fn insert_sale(&self, user_id: Uuid, total_amount: &BigDecimal) -> Result<Sale, StoreError> {
        let mut tx = self.tx.lock().await;
        Ok(insert_sale(&mut **tx, user_id, total_amount).await?)
    }

    async fn insert_sale_item(&self, item: &NewSaleItem) -> Result<SaleItem, StoreError> {
        let mut tx = self.tx.lock().await;
        Ok(insert_sale_item(&mut **tx, item).await?)
    }

    async fn set_stock(&self, variant_id: Uuid, stock_quantity: i32) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        Ok(set_stock(&mut **tx, variant_id, stock_quantity).await?)
    }

    async fn decrement_stock(&self, variant_id: Uuid, quantity: i32) -> Result<Option<StockChange>, StoreError> {
        let mut tx = self.tx.lock().await;
        Ok(decrement_stock(&mut **tx, variant_id, quantity).await?)
    }

    async fn admin_phone_numbers(&self) -> Result<Vec<String>, StoreError> {
        let mut tx = self.tx.lock().await;
        Ok(admin_phone_numbers(&mut **tx).await?)
    }
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn commit(self) -> Result<(), StoreError> {
        Ok(self.tx.into_inner().commit().await?)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(self.tx.into_inner().rollback().await?)
    }
}
