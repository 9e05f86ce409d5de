// src/notifications/mod.rs

//! Low-stock alerts.
//!
//! The recorder hands alerts to a [`LowStockDispatcher`], which runs the
//! notifier on a detached task. Whatever happens there is logged and never
//! reaches the sale that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tokio_util::task::TaskTracker;

use crate::store::{Store, StoreError};

pub mod twilio;

use twilio::TwilioClient;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to resolve alert recipients: {0}")]
    Recipients(#[from] StoreError),

    #[error("sms request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sms provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("{failed} of {total} low-stock messages failed")]
    PartialDelivery { failed: usize, total: usize },
}

/// A variant whose stock just dropped to or below its threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockAlert {
    pub variant_name: String,
    pub remaining_stock: i32,
    pub product_name: String,
}

impl LowStockAlert {
    pub fn message(&self) -> String {
        format!(
            "LOW STOCK ALERT: {} - {} is running low. Only {} left in stock.",
            self.product_name, self.variant_name, self.remaining_stock
        )
    }
}

#[async_trait]
pub trait LowStockNotifier: Send + Sync {
    async fn notify(&self, alert: &LowStockAlert) -> Result<(), NotifyError>;
}

/// Sends one SMS per admin phone number.
///
/// Without SMS credentials this is a no-op.
pub struct SmsLowStockNotifier<S> {
    store: Arc<S>,
    client: Option<TwilioClient>,
}

impl<S: Store + 'static> SmsLowStockNotifier<S> {
    pub fn new(store: Arc<S>, client: Option<TwilioClient>) -> Self {
        SmsLowStockNotifier { store, client }
    }
}

#[async_trait]
impl<S: Store + 'static> LowStockNotifier for SmsLowStockNotifier<S> {
    async fn notify(&self, alert: &LowStockAlert) -> Result<(), NotifyError> {
        let recipients = self.store.admin_phone_numbers().await?;
        if recipients.is_empty() {
            tracing::info!("no admin phone numbers configured, skipping low-stock alert");
            return Ok(());
        }

        let Some(client) = &self.client else {
            tracing::debug!("sms provider not configured, skipping low-stock alert");
            return Ok(());
        };

        let body = alert.message();
        let results = join_all(recipients.iter().map(|to| client.send(to, &body))).await;

        let mut failed = 0;
        for (to, result) in recipients.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(to = %to, error = %e, "low-stock sms failed");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(NotifyError::PartialDelivery {
                failed,
                total: recipients.len(),
            });
        }
        Ok(())
    }
}

/// Fire-and-forget delivery of low-stock alerts.
#[derive(Clone)]
pub struct LowStockDispatcher {
    notifier: Arc<dyn LowStockNotifier>,
    tracker: TaskTracker,
}

impl LowStockDispatcher {
    pub fn new(notifier: Arc<dyn LowStockNotifier>) -> Self {
        LowStockDispatcher {
            notifier,
            tracker: TaskTracker::new(),
        }
    }

    /// Spawn delivery and return immediately. Must be called inside a tokio runtime.
    pub fn dispatch(&self, alert: LowStockAlert) {
        tracing::info!(
            product = %alert.product_name,
            variant = %alert.variant_name,
            remaining = alert.remaining_stock,
            "stock crossed low-stock threshold"
        );
        let notifier = Arc::clone(&self.notifier);
        self.tracker.spawn(async move {
            if let Err(e) = notifier.notify(&alert).await {
                tracing::warn!(error = %e, variant = %alert.variant_name, "failed to send low-stock alert");
            }
        });
    }

    /// Wait for every alert dispatched so far. New alerts may still be dispatched afterwards.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
