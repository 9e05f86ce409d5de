// src/store/memory.rs

//! In-memory [`Store`] for tests.
//!
//! Every operation yields to the scheduler first, so two recorders driven by
//! `tokio::join!` interleave the way concurrent requests against a real
//! database would. Transactions apply writes directly and keep an undo log.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use super::{StockChange, Store, StoreError, StoreTransaction, TransactionalStore, VariantStock};
use crate::sales::sales_structs::{NewSaleItem, Sale, SaleItem};

/// Operation that should fail with [`StoreError::Unavailable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertSale,
    /// Fail the nth (zero based) sale item insert.
    InsertSaleItem(usize),
    SetStock,
}

#[derive(Debug, Default)]
pub struct MemoryState {
    pub variants: HashMap<Uuid, VariantStock>,
    pub sales: Vec<Sale>,
    pub sale_items: Vec<SaleItem>,
    pub admin_phones: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    calls: Arc<AtomicUsize>,
    item_inserts: Arc<AtomicUsize>,
    fail_point: Arc<Mutex<Option<FailPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variant and return its id.
    pub fn add_variant(&self, product: &str, variant: &str, stock: i32, threshold: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.state().variants.insert(
            id,
            VariantStock {
                id,
                product_name: product.to_string(),
                variant_name: variant.to_string(),
                stock_quantity: stock,
                low_stock_threshold: threshold,
            },
        );
        id
    }

    pub fn add_admin_phone(&self, phone: &str) {
        self.state().admin_phones.push(phone.to_string());
    }

    pub fn fail_at(&self, point: FailPoint) {
        *self.fail_point.lock().unwrap() = Some(point);
    }

    pub fn stock(&self, variant_id: Uuid) -> i32 {
        self.state().variants[&variant_id].stock_quantity
    }

    pub fn sales(&self) -> Vec<Sale> {
        self.state().sales.clone()
    }

    pub fn sale_items(&self) -> Vec<SaleItem> {
        self.state().sale_items.clone()
    }

    /// Number of store operations issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }

    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        if *self.fail_point.lock().unwrap() == Some(point) {
            return Err(StoreError::Unavailable(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_variant(&self, variant_id: Uuid) -> Result<Option<VariantStock>, StoreError> {
        self.enter().await;
        Ok(self.state().variants.get(&variant_id).cloned())
    }

    async fn insert_sale(&self, user_id: Uuid, total_amount: &BigDecimal) -> Result<Sale, StoreError> {
        self.enter().await;
        self.check(FailPoint::InsertSale)?;
        let sale = Sale {
            id: Uuid::new_v4(),
            user_id,
            total_amount: total_amount.clone(),
            created_at: Utc::now(),
        };
        self.state().sales.push(sale.clone());
        Ok(sale)
    }

    async fn insert_sale_item(&self, item: &NewSaleItem) -> Result<SaleItem, StoreError> {
        self.enter().await;
        let nth = self.item_inserts.fetch_add(1, Ordering::SeqCst);
        self.check(FailPoint::InsertSaleItem(nth))?;
        let row = SaleItem {
            id: Uuid::new_v4(),
            sale_id: item.sale_id,
            variant_id: item.variant_id,
            line_number: item.line_number,
            quantity_sold: item.quantity_sold,
            price_at_sale: item.price_at_sale.clone(),
            created_at: Utc::now(),
        };
        self.state().sale_items.push(row.clone());
        Ok(row)
    }

    async fn set_stock(&self, variant_id: Uuid, stock_quantity: i32) -> Result<(), StoreError> {
        self.enter().await;
        self.check(FailPoint::SetStock)?;
        if let Some(v) = self.state().variants.get_mut(&variant_id) {
            v.stock_quantity = stock_quantity;
        }
        Ok(())
    }

    async fn decrement_stock(&self, variant_id: Uuid, quantity: i32) -> Result<Option<StockChange>, StoreError> {
        self.enter().await;
        self.check(FailPoint::SetStock)?;
        let mut state = self.state();
        let Some(v) = state.variants.get_mut(&variant_id) else {
            return Ok(None);
        };
        if v.stock_quantity < quantity {
            return Ok(None);
        }
        let previous = v.stock_quantity;
        v.stock_quantity -= quantity;
        Ok(Some(StockChange {
            previous,
            current: v.stock_quantity,
            low_stock_threshold: v.low_stock_threshold,
        }))
    }

    async fn admin_phone_numbers(&self) -> Result<Vec<String>, StoreError> {
        self.enter().await;
        Ok(self.state().admin_phones.clone())
    }
}

enum Undo {
    Sale(Uuid),
    SaleItem(Uuid),
    Stock(Uuid, i32),
}

pub struct MemoryTransaction {
    store: MemoryStore,
    undo: Mutex<Vec<Undo>>,
}

impl MemoryTransaction {
    fn push(&self, undo: Undo) {
        self.undo.lock().unwrap().push(undo);
    }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        self.enter().await;
        Ok(MemoryTransaction {
            store: self.clone(),
            undo: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Store for MemoryTransaction {
    async fn find_variant(&self, variant_id: Uuid) -> Result<Option<VariantStock>, StoreError> {
        self.store.find_variant(variant_id).await
    }

    async fn insert_sale(&self, user_id: Uuid, total_amount: &BigDecimal) -> Result<Sale, StoreError> {
        let sale = self.store.insert_sale(user_id, total_amount).await?;
        self.push(Undo::Sale(sale.id));
        Ok(sale)
    }

    async fn insert_sale_item(&self, item: &NewSaleItem) -> Result<SaleItem, StoreError> {
        let row = self.store.insert_sale_item(item).await?;
        self.push(Undo::SaleItem(row.id));
        Ok(row)
    }

    async fn set_stock(&self, variant_id: Uuid, stock_quantity: i32) -> Result<(), StoreError> {
        let previous = self.store.state().variants.get(&variant_id).map(|v| v.stock_quantity);
        self.store.set_stock(variant_id, stock_quantity).await?;
        if let Some(previous) = previous {
            self.push(Undo::Stock(variant_id, previous));
        }
        Ok(())
    }

    async fn decrement_stock(&self, variant_id: Uuid, quantity: i32) -> Result<Option<StockChange>, StoreError> {
        let change = self.store.decrement_stock(variant_id, quantity).await?;
        if let Some(change) = change {
            self.push(Undo::Stock(variant_id, change.previous));
        }
        Ok(change)
    }

    async fn admin_phone_numbers(&self) -> Result<Vec<String>, StoreError> {
        self.store.admin_phone_numbers().await
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        let undo = self.undo.into_inner().unwrap();
        let mut state = self.store.state();
        for step in undo.into_iter().rev() {
            match step {
                Undo::Sale(id) => state.sales.retain(|s| s.id != id),
                Undo::SaleItem(id) => state.sale_items.retain(|i| i.id != id),
                Undo::Stock(variant_id, previous) => {
                    if let Some(v) = state.variants.get_mut(&variant_id) {
                        v.stock_quantity = previous;
                    }
                }
            }
        }
        Ok(())
    }
}
