//! Runs the order form as an event-driven component on a tokio runtime.

pub mod driver;
pub mod timer;

pub use driver::{FormCommand, FormDriver, FormHandle};
pub use timer::DisplayTimer;
