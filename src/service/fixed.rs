use std::time::Duration;

use async_trait::async_trait;

use crate::{
    core::{OrderResult, OrderSubmissionService},
    form::{Order, Receipt},
    submission_error,
};

pub const SERVICE_NAME: &str = "fixed-outcome";

/// Answers every order the same way, after an optional delay.
#[derive(Clone, Debug)]
pub struct FixedOutcomeService {
    accept: bool,
    delay: Duration,
}

impl FixedOutcomeService {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            delay: Duration::ZERO,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept: false,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl OrderSubmissionService for FixedOutcomeService {
    async fn submit(&self, order: &Order) -> OrderResult<Receipt> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.accept {
            Ok(Receipt::for_order(order))
        } else {
            Err(submission_error!("order {} rejected", order.id))
        }
    }

    fn name(&self) -> &str {
        SERVICE_NAME
    }
}
