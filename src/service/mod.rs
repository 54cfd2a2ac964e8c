//! Order submission services.
//!
//! The form never knows which one it talks to; [`build_submission_service`]
//! picks one from configuration.

pub mod fixed;
pub mod simulated;

use std::sync::Arc;

use log::info;

use crate::{
    config::{Submission, SubmissionMode},
    core::OrderSubmissionService,
};

pub use fixed::FixedOutcomeService;
pub use simulated::SimulatedSubmissionService;

pub fn build_submission_service(cfg: &Submission) -> Arc<dyn OrderSubmissionService> {
    let service: Arc<dyn OrderSubmissionService> = match cfg.mode {
        SubmissionMode::Accept => Arc::new(FixedOutcomeService::accepting().with_delay(cfg.delay())),
        SubmissionMode::Reject => Arc::new(FixedOutcomeService::rejecting().with_delay(cfg.delay())),
        SubmissionMode::Random => Arc::new(SimulatedSubmissionService::new(
            cfg.success_percentage,
            cfg.delay(),
        )),
    };
    info!(
        "using submission service '{}' ({:?}, {}ms delay)",
        service.name(),
        cfg.mode,
        cfg.delay_ms
    );
    service
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_mode() {
        let mut cfg = Submission::default();
        assert_eq!(build_submission_service(&cfg).name(), simulated::SERVICE_NAME);

        cfg.mode = SubmissionMode::Accept;
        assert_eq!(build_submission_service(&cfg).name(), fixed::SERVICE_NAME);

        cfg.mode = SubmissionMode::Reject;
        assert_eq!(build_submission_service(&cfg).name(), fixed::SERVICE_NAME);
    }
}
