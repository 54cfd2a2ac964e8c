//! The pizza order form: field state, validation and the submission state machine.
//!
//! [`OrderForm`] is synchronous and owns no timers or tasks. Whoever drives it
//! (see [`crate::orchestration`]) calls [`OrderForm::begin_submit`], runs the
//! returned order through a submission service, reports back with
//! [`OrderForm::complete_submission`], and later calls
//! [`OrderForm::expire_banner`] once the display timeout elapses.
//!
//! ```text
//! Idle -> Validating -> Blocked
//!                    -> Submitting -> Succeeded | Failed -> (timeout) -> Idle
//! ```

pub mod catalog;
pub mod order;
pub mod schema;
pub mod state;
pub mod view;

use log::{debug, info, warn};
use validator::Validate;

use crate::core::{OrderError, OrderResult};

pub use catalog::{Topping, ToppingCatalog};
pub use order::{describe_topping_count, Order, Receipt};
pub use schema::{Schema, ToppingsPolicy, ValidationErrors};
pub use state::{FormField, FormState, PizzaSize, Touched};
pub use view::{Banner, FormView, SizeOption, SubmissionPhase, ToppingOption};

pub const FAILURE_MESSAGE: &str = "Something went wrong";

/// Identifies one submission attempt.
pub type Ticket = u64;

/// Identifies the banner currently on display.
pub type BannerGeneration = u64;

/// An accepted submit: the order to hand to the service and its ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSubmission {
    pub ticket: Ticket,
    pub order: Order,
}

/// Why a submit did not start.
#[derive(Debug)]
pub enum SubmitRejection {
    /// The form has errors; they are now all visible.
    Blocked(ValidationErrors),
    /// Another submission is still outstanding.
    InFlight,
    /// The snapshot failed order validation.
    Invalid(OrderError),
}

#[derive(Clone, Debug)]
enum Status {
    Idle,
    Submitting { ticket: Ticket, order: Order },
    Displaying(Banner),
}

pub struct OrderForm {
    catalog: ToppingCatalog,
    schema: Schema,
    state: FormState,
    errors: ValidationErrors,
    touched: Touched,
    submit_attempted: bool,
    status: Status,
    last_ticket: Ticket,
    banner_generation: BannerGeneration,
}

impl OrderForm {
    pub fn new(catalog: ToppingCatalog, schema: Schema) -> Self {
        let state = FormState::default();
        let errors = schema.validate(&state);
        Self {
            catalog,
            schema,
            state,
            errors,
            touched: Touched::default(),
            submit_attempted: false,
            status: Status::Idle,
            last_ticket: 0,
            banner_generation: 0,
        }
    }

    pub fn catalog(&self) -> &ToppingCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn touched(&self) -> &Touched {
        &self.touched
    }

    pub fn submit_attempted(&self) -> bool {
        self.submit_attempted
    }

    pub fn set_full_name(&mut self, value: impl Into<String>) {
        self.state.full_name = value.into();
        self.after_change(FormField::FullName);
    }

    pub fn set_size(&mut self, value: impl Into<String>) {
        self.state.size = value.into();
        self.after_change(FormField::Size);
    }

    /// Flips a topping checkbox and returns whether it is now checked.
    pub fn toggle_topping(&mut self, id: &str) -> OrderResult<bool> {
        if !self.catalog.contains(id) {
            return Err(OrderError::UnknownTopping(id.to_string()));
        }
        let checked = if self.state.toppings.remove(id) {
            false
        } else {
            self.state.toppings.insert(id.to_string());
            true
        };
        self.after_change(FormField::Toppings);
        Ok(checked)
    }

    /// Replaces the whole topping selection; nothing changes if any id is unknown.
    pub fn set_toppings<I, S>(&mut self, ids: I) -> OrderResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if let Some(unknown) = ids.iter().find(|id| !self.catalog.contains(id)) {
            return Err(OrderError::UnknownTopping(unknown.clone()));
        }
        self.state.toppings = ids.into_iter().collect();
        self.after_change(FormField::Toppings);
        Ok(())
    }

    /// Blur handling.
    pub fn touch(&mut self, field: FormField) {
        self.touched.mark(field);
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Errors on fields that were touched, or all of them after a submit attempt.
    pub fn visible_errors(&self) -> ValidationErrors {
        if self.submit_attempted {
            return self.errors.clone();
        }
        self.errors.retain(|field| self.touched.contains(field))
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.status, Status::Submitting { .. })
    }

    pub fn submit_enabled(&self) -> bool {
        self.errors.is_empty() && !self.is_submitting()
    }

    pub fn phase(&self) -> SubmissionPhase {
        match &self.status {
            Status::Submitting { .. } => SubmissionPhase::Submitting,
            Status::Displaying(Banner::Success(_)) => SubmissionPhase::Succeeded,
            Status::Displaying(Banner::Failure(_)) => SubmissionPhase::Failed,
            Status::Idle if self.errors.is_empty() => SubmissionPhase::Idle,
            Status::Idle => SubmissionPhase::Blocked,
        }
    }

    pub fn banner(&self) -> Option<&Banner> {
        match &self.status {
            Status::Displaying(banner) => Some(banner),
            _ => None,
        }
    }

    /// Starts a submission if the form is valid and nothing is in flight.
    ///
    /// Any banner on display is dismissed, which also invalidates its pending
    /// expiry.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, SubmitRejection> {
        if self.is_submitting() {
            warn!("submit ignored: a submission is already in flight");
            return Err(SubmitRejection::InFlight);
        }

        self.dismiss_banner();
        self.submit_attempted = true;
        self.revalidate();

        if !self.errors.is_empty() {
            info!(
                "submit blocked by {} validation error(s)",
                self.errors.len()
            );
            return Err(SubmitRejection::Blocked(self.errors.clone()));
        }

        let order = self.snapshot().map_err(SubmitRejection::Invalid)?;

        self.last_ticket += 1;
        let ticket = self.last_ticket;
        info!("submitting order {} (ticket {ticket})", order.id);
        self.status = Status::Submitting {
            ticket,
            order: order.clone(),
        };

        Ok(PendingSubmission { ticket, order })
    }

    /// Applies the service's answer for `ticket`.
    ///
    /// Returns the generation of the banner now on display, or `None` when the
    /// ticket is not the outstanding one.
    pub fn complete_submission(
        &mut self,
        ticket: Ticket,
        result: OrderResult<Receipt>,
    ) -> Option<BannerGeneration> {
        let order = match &self.status {
            Status::Submitting { ticket: current, order } if *current == ticket => order.clone(),
            _ => {
                warn!("discarding result for stale submission ticket {ticket}");
                return None;
            }
        };

        let banner = match result {
            Ok(receipt) => {
                info!(
                    "order {} accepted{}",
                    receipt.order_id,
                    receipt
                        .reference
                        .as_deref()
                        .map(|r| format!(" ({r})"))
                        .unwrap_or_default()
                );
                self.reset();
                Banner::Success(order.confirmation_message())
            }
            Err(e) => {
                warn!("order {} failed: {e}", order.id);
                Banner::Failure(FAILURE_MESSAGE.to_string())
            }
        };

        self.banner_generation += 1;
        self.status = Status::Displaying(banner);
        Some(self.banner_generation)
    }

    /// Reverts a terminal display state to idle if `generation` is still current.
    pub fn expire_banner(&mut self, generation: BannerGeneration) -> bool {
        if generation != self.banner_generation || self.banner().is_none() {
            debug!("ignoring expiry for banner generation {generation}");
            return false;
        }
        debug!("banner generation {generation} expired");
        self.status = Status::Idle;
        true
    }

    pub fn view(&self) -> FormView {
        FormView {
            full_name: self.state.full_name.clone(),
            size_options: view::size_options(&self.state.size),
            toppings: self
                .catalog
                .iter()
                .map(|t| ToppingOption {
                    id: t.id.clone(),
                    label: t.label.clone(),
                    checked: self.state.toppings.contains(&t.id),
                })
                .collect(),
            errors: self.visible_errors().messages(),
            submit_enabled: self.submit_enabled(),
            phase: self.phase(),
            banner: self.banner().cloned(),
        }
    }

    fn after_change(&mut self, field: FormField) {
        debug!("field {field} changed");
        self.touched.mark(field);
        self.revalidate();
    }

    fn revalidate(&mut self) {
        self.errors = self.schema.validate(&self.state);
    }

    fn dismiss_banner(&mut self) {
        if let Status::Displaying(_) = self.status {
            self.status = Status::Idle;
            self.banner_generation += 1;
        }
    }

    fn reset(&mut self) {
        self.state = FormState::default();
        self.touched.clear();
        self.submit_attempted = false;
        self.revalidate();
    }

    fn snapshot(&self) -> OrderResult<Order> {
        let size: PizzaSize = self.state.size.parse().map_err(OrderError::Validation)?;
        let order = Order::new(
            &self.state.full_name,
            size,
            self.catalog.ordered(self.state.toppings.iter()),
        );
        order.validate()?;
        Ok(order)
    }
}
