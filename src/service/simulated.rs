use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rand::Rng;

use crate::{
    core::{OrderResult, OrderSubmissionService},
    form::{Order, Receipt},
    submission_error,
};

pub const SERVICE_NAME: &str = "simulated";

/// Stands in for a real order backend: waits a little, then accepts a
/// configurable share of orders at random.
#[derive(Clone, Debug)]
pub struct SimulatedSubmissionService {
    success_percentage: u32,
    delay: Duration,
}

impl SimulatedSubmissionService {
    pub fn new(success_percentage: u32, delay: Duration) -> Self {
        Self {
            success_percentage: success_percentage.min(100),
            delay,
        }
    }

    /// Check if this attempt should succeed based on the configured percentage
    fn sample_hit(percentage: u32) -> bool {
        let mut rng = rand::thread_rng();
        rng.gen_range(1..=100) <= percentage
    }
}

#[async_trait]
impl OrderSubmissionService for SimulatedSubmissionService {
    async fn submit(&self, order: &Order) -> OrderResult<Receipt> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if Self::sample_hit(self.success_percentage) {
            let reference = format!("PZ-{:06}", rand::thread_rng().gen_range(0..1_000_000));
            debug!("simulated acceptance of order {} as {reference}", order.id);
            Ok(Receipt::for_order(order).with_reference(reference))
        } else {
            Err(submission_error!("simulated rejection of order {}", order.id))
        }
    }

    fn name(&self) -> &str {
        SERVICE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::PizzaSize;

    #[test]
    fn test_sample_hit_never_at_zero() {
        assert!((0..200).all(|_| !SimulatedSubmissionService::sample_hit(0)));
    }

    #[test]
    fn test_sample_hit_always_at_hundred() {
        assert!((0..200).all(|_| SimulatedSubmissionService::sample_hit(100)));
    }

    #[test]
    fn test_percentage_is_clamped() {
        let service = SimulatedSubmissionService::new(250, Duration::ZERO);
        assert_eq!(service.success_percentage, 100);
    }

    #[tokio::test]
    async fn test_submit_outcomes() {
        let order = Order::new("Alice", PizzaSize::Small, vec!["1".to_string()]);

        let receipt = SimulatedSubmissionService::new(100, Duration::ZERO)
            .submit(&order)
            .await
            .unwrap();
        assert_eq!(receipt.order_id, order.id);
        assert!(receipt.reference.unwrap().starts_with("PZ-"));

        assert!(SimulatedSubmissionService::new(0, Duration::ZERO)
            .submit(&order)
            .await
            .is_err());
    }
}
