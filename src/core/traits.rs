//! Core traits for the order form
//!
//! The form only ever talks to the outside world through these seams.

use async_trait::async_trait;

use crate::form::{Order, Receipt};

use super::error::OrderResult;

/// Trait for handing a validated order to whoever fulfils it
#[async_trait]
pub trait OrderSubmissionService: Send + Sync {
    /// Submit the order; `Err` means the order was not accepted
    async fn submit(&self, order: &Order) -> OrderResult<Receipt>;

    /// Service name used in logs
    fn name(&self) -> &str;
}
