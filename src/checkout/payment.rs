//! Payment gateway seam.

use std::future::Future;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use super::card::CardInfo;
use crate::domain::aggregates::PaymentMethod;

pub struct PaymentRequest<'a> {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub card: Option<&'a CardInfo>,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment declined: {0}")]
    Declined(String),
}

pub trait PaymentGateway: Send + Sync {
    fn authorize(&self, request: &PaymentRequest<'_>) -> impl Future<Output = Result<(), PaymentError>> + Send;
}

/// Mock gateway: waits out a simulated latency and approves everything.
#[derive(Clone, Copy, Debug)]
pub struct AlwaysSucceeds {
    latency: Duration,
}

impl AlwaysSucceeds {
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1200);

    pub fn new(latency: Duration) -> Self { Self { latency } }
    pub fn instant() -> Self { Self::new(Duration::ZERO) }
    pub fn latency(&self) -> Duration { self.latency }
}

impl Default for AlwaysSucceeds {
    fn default() -> Self { Self::new(Self::DEFAULT_LATENCY) }
}

impl PaymentGateway for AlwaysSucceeds {
    async fn authorize(&self, request: &PaymentRequest<'_>) -> Result<(), PaymentError> {
        if !self.latency.is_zero() { tokio::time::sleep(self.latency).await; }
        tracing::debug!(amount = %request.amount, method = ?request.method, "mock payment approved");
        Ok(())
    }
}
