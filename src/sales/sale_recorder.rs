// src/sales/sale_recorder.rs

//! Sale recording: stock validation, sale persistence, stock decrement and
//! low-stock detection.
//!
//! With [`StockPolicy::Faithful`] the steps run as independent statements:
//! 1. Every cart line is checked against the stored stock (read only, nothing is reserved).
//! 2. The total is the sum of `price_at_sale * quantity`, rounded to cents.
//! 3. The sale header is inserted.
//! 4. For each line, in cart order: insert the sale item, re-read the
//!    variant, write `stock - quantity` and dispatch a low-stock alert when
//!    the write crossed the threshold.
//!
//! Nothing is rolled back. A failure in step 3 leaves no trace, a failure in
//! step 4 leaves the header and every line applied before it. Two concurrent
//! sales of the same variant can both pass step 1 and oversell.
//!
//! [`StockPolicy::Guarded`] runs the same steps inside one store transaction,
//! decrements with `stock >= quantity` as a condition, rolls back on any
//! failure and only dispatches alerts after commit.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::sales_structs::{CartLine, NewSaleItem, Sale};
use crate::notifications::{LowStockAlert, LowStockDispatcher};
use crate::store::{StockChange, Store, StoreError, StoreTransaction, TransactionalStore, VariantStock};
use crate::users::auth_middleware::AuthenticatedUser;

#[derive(Debug, Error)]
pub enum SaleError {
    #[error("{0}")]
    Validation(String),

    #[error("Product variant {0} not found")]
    NotFound(Uuid),

    #[error("Insufficient stock for {product_name} - {variant_name}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        product_name: String,
        variant_name: String,
        available: i32,
        requested: i32,
    },

    #[error("failed to persist sale: {0}")]
    Persistence(#[from] StoreError),
}

/// How stock is decremented when a sale is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockPolicy {
    /// Read, subtract and write back, outside any transaction.
    #[default]
    Faithful,
    /// One transaction with a conditional decrement per line.
    Guarded,
}

pub struct SaleRecorder<S> {
    store: Arc<S>,
    dispatcher: LowStockDispatcher,
    policy: StockPolicy,
}

impl<S> SaleRecorder<S>
where
    S: TransactionalStore + 'static,
{
    pub fn new(store: Arc<S>, dispatcher: LowStockDispatcher, policy: StockPolicy) -> Self {
        SaleRecorder {
            store,
            dispatcher,
            policy,
        }
    }

    pub fn dispatcher(&self) -> &LowStockDispatcher {
        &self.dispatcher
    }

    /// Record a sale made by `seller`.
    ///
    /// Calling this twice with the same cart records two sales and
    /// decrements stock twice. A `Persistence` error under the faithful
    /// policy means the sale may be partially applied.
    pub async fn record_sale(&self, lines: &[CartLine], seller: &AuthenticatedUser) -> Result<Sale, SaleError> {
        validate_cart(lines)?;

        let sale = match self.policy {
            StockPolicy::Faithful => {
                let dispatcher = &self.dispatcher;
                apply_sale(&*self.store, lines, seller.user_id, Decrement::ReadWrite, |alert| {
                    dispatcher.dispatch(alert)
                })
                .await?
            }
            StockPolicy::Guarded => {
                let tx = self.store.begin().await?;
                let mut pending = Vec::new();
                let applied = apply_sale(&tx, lines, seller.user_id, Decrement::Conditional, |alert| {
                    pending.push(alert)
                })
                .await;

                match applied {
                    Ok(sale) => {
                        tx.commit().await?;
                        for alert in pending {
                            self.dispatcher.dispatch(alert);
                        }
                        sale
                    }
                    Err(e) => {
                        if let Err(rollback) = tx.rollback().await {
                            tracing::error!(error = %rollback, "failed to roll back sale");
                        }
                        return Err(e);
                    }
                }
            }
        };

        tracing::info!(
            sale_id = %sale.id,
            seller = %seller.user_id,
            seller_name = %seller.name,
            total = %sale.total_amount,
            lines = lines.len(),
            "sale recorded"
        );
        Ok(sale)
    }
}

/// Reject carts that can never succeed, before touching the store.
pub fn validate_cart(lines: &[CartLine]) -> Result<(), SaleError> {
    if lines.is_empty() {
        return Err(SaleError::Validation(
            "The cart is empty. Add items before recording a sale.".into(),
        ));
    }
    for line in lines {
        if line.quantity <= 0 {
            return Err(SaleError::Validation(format!(
                "Quantity for variant {} must be a positive integer",
                line.variant_id
            )));
        }
        if line.price_at_sale < BigDecimal::from(0) {
            return Err(SaleError::Validation(format!(
                "Price for variant {} must not be negative",
                line.variant_id
            )));
        }
        // prices are stored as NUMERIC(12, 2); anything finer would make the
        // stored lines disagree with the stored total
        if line.price_at_sale.with_scale(2) != line.price_at_sale {
            return Err(SaleError::Validation(format!(
                "Price for variant {} must have at most two decimal places",
                line.variant_id
            )));
        }
    }
    Ok(())
}

/// Sum of `price_at_sale * quantity`, rounded to cents.
pub fn sale_total(lines: &[CartLine]) -> BigDecimal {
    lines
        .iter()
        .fold(BigDecimal::from(0), |acc, line| {
            acc + &line.price_at_sale * BigDecimal::from(line.quantity)
        })
        .round(2)
}

#[derive(Debug, Clone, Copy)]
enum Decrement {
    ReadWrite,
    Conditional,
}

fn insufficient(variant: &VariantStock, requested: i32) -> SaleError {
    SaleError::InsufficientStock {
        product_name: variant.product_name.clone(),
        variant_name: variant.variant_name.clone(),
        available: variant.stock_quantity,
        requested,
    }
}

async fn apply_sale<T>(
    store: &T,
    lines: &[CartLine],
    user_id: Uuid,
    decrement: Decrement,
    mut on_low_stock: impl FnMut(LowStockAlert),
) -> Result<Sale, SaleError>
where
    T: Store + ?Sized,
{
    // Lines are checked one by one against stored stock, so duplicate lines
    // for one variant each pass on their own.
    for line in lines {
        let variant = store
            .find_variant(line.variant_id)
            .await?
            .ok_or(SaleError::NotFound(line.variant_id))?;
        if variant.stock_quantity < line.quantity {
            return Err(insufficient(&variant, line.quantity));
        }
    }

    let total = sale_total(lines);
    let sale = store.insert_sale(user_id, &total).await?;

    for (line_number, line) in (1..).zip(lines) {
        store
            .insert_sale_item(&NewSaleItem {
                sale_id: sale.id,
                variant_id: line.variant_id,
                line_number,
                quantity_sold: line.quantity,
                price_at_sale: line.price_at_sale.clone(),
            })
            .await?;

        let current = store
            .find_variant(line.variant_id)
            .await?
            .ok_or(SaleError::NotFound(line.variant_id))?;

        let change = match decrement {
            Decrement::ReadWrite => {
                // no floor check here: a concurrent sale can drive this negative
                let new_quantity = current.stock_quantity - line.quantity;
                store.set_stock(line.variant_id, new_quantity).await?;
                StockChange {
                    previous: current.stock_quantity,
                    current: new_quantity,
                    low_stock_threshold: current.low_stock_threshold,
                }
            }
            Decrement::Conditional => store
                .decrement_stock(line.variant_id, line.quantity)
                .await?
                .ok_or_else(|| insufficient(&current, line.quantity))?,
        };

        tracing::debug!(
            variant = %line.variant_id,
            previous = change.previous,
            current = change.current,
            "stock decremented"
        );

        if change.crossed_threshold() {
            on_low_stock(LowStockAlert {
                variant_name: current.variant_name,
                remaining_stock: change.current,
                product_name: current.product_name,
            });
        }
    }

    Ok(sale)
}
