//! A pizza order form with field validation, a submission state machine and a
//! transient outcome banner.
//!
//! It defines the modules for configuration, the form itself, the submission
//! services it talks to, and the runtime that drives it from a terminal.

pub mod config;
pub mod console;
pub mod core;
pub mod form;
pub mod logging;
pub mod orchestration;
pub mod service;
