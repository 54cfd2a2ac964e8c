//! Core abstractions shared by every layer of the order form

pub mod error;
pub mod traits;

pub use error::{ErrorContext, OrderError, OrderResult};
pub use traits::OrderSubmissionService;
