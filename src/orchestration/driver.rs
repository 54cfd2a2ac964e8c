use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::AbortHandle,
};

use crate::{
    core::{OrderError, OrderResult, OrderSubmissionService},
    form::{
        BannerGeneration, FormField, FormView, OrderForm, PendingSubmission, Receipt,
        SubmitRejection, Ticket,
    },
};

use super::timer::DisplayTimer;

/// A user interaction with the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormCommand {
    SetFullName(String),
    SetSize(String),
    ToggleTopping(String),
    Blur(FormField),
    Submit,
}

#[derive(Debug)]
enum CommandOutcome {
    Applied,
    Rejected(OrderError),
    SubmitStarted(Ticket),
    SubmitRejected(SubmitRejection),
}

struct Envelope {
    command: FormCommand,
    reply: oneshot::Sender<CommandOutcome>,
}

/// Events the driver sends itself from spawned tasks.
#[derive(Debug)]
enum Internal {
    SubmissionFinished {
        ticket: Ticket,
        result: OrderResult<Receipt>,
    },
    BannerExpired(BannerGeneration),
}

fn driver_gone() -> OrderError {
    OrderError::Internal("order form driver has stopped".to_string())
}

/// Client side of a running [`FormDriver`].
#[derive(Clone)]
pub struct FormHandle {
    commands: mpsc::UnboundedSender<Envelope>,
    view: watch::Receiver<FormView>,
}

impl FormHandle {
    /// Latest published snapshot.
    pub fn view(&self) -> FormView {
        self.view.borrow().clone()
    }

    /// Waits until a published snapshot satisfies `predicate`.
    pub async fn wait_for<F>(&mut self, predicate: F) -> OrderResult<FormView>
    where
        F: FnMut(&FormView) -> bool,
    {
        self.view
            .wait_for(predicate)
            .await
            .map(|view| view.clone())
            .map_err(|_| driver_gone())
    }

    /// Waits for the next published snapshot.
    pub async fn changed(&mut self) -> OrderResult<FormView> {
        self.view.changed().await.map_err(|_| driver_gone())?;
        Ok(self.view.borrow_and_update().clone())
    }

    pub async fn set_full_name(&self, value: impl Into<String>) -> OrderResult<()> {
        self.apply(FormCommand::SetFullName(value.into())).await
    }

    pub async fn set_size(&self, value: impl Into<String>) -> OrderResult<()> {
        self.apply(FormCommand::SetSize(value.into())).await
    }

    pub async fn toggle_topping(&self, id: impl Into<String>) -> OrderResult<()> {
        self.apply(FormCommand::ToggleTopping(id.into())).await
    }

    pub async fn blur(&self, field: FormField) -> OrderResult<()> {
        self.apply(FormCommand::Blur(field)).await
    }

    /// Outer error: the driver is gone. Inner error: the form refused to submit.
    pub async fn submit(&self) -> OrderResult<Result<Ticket, SubmitRejection>> {
        match self.send(FormCommand::Submit).await? {
            CommandOutcome::SubmitStarted(ticket) => Ok(Ok(ticket)),
            CommandOutcome::SubmitRejected(rejection) => Ok(Err(rejection)),
            other => Err(OrderError::Internal(format!(
                "unexpected reply to submit: {other:?}"
            ))),
        }
    }

    /// Sends any command and reports whether the form accepted it.
    pub async fn apply(&self, command: FormCommand) -> OrderResult<()> {
        match self.send(command).await? {
            CommandOutcome::Applied
            | CommandOutcome::SubmitStarted(_) => Ok(()),
            CommandOutcome::Rejected(e) => Err(e),
            CommandOutcome::SubmitRejected(SubmitRejection::Invalid(e)) => Err(e),
            CommandOutcome::SubmitRejected(SubmitRejection::InFlight) => Err(OrderError::Submission(
                "a submission is already in flight".to_string(),
            )),
            CommandOutcome::SubmitRejected(SubmitRejection::Blocked(errors)) => {
                Err(OrderError::Validation(format!(
                    "form has {} validation error(s)",
                    errors.len()
                )))
            }
        }
    }

    async fn send(&self, command: FormCommand) -> OrderResult<CommandOutcome> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Envelope { command, reply })
            .map_err(|_| driver_gone())?;
        rx.await.map_err(|_| driver_gone())
    }
}

/// Runs an [`OrderForm`] as an event-driven component.
///
/// Commands are applied one at a time; submissions and banner expiries run as
/// spawned tasks that report back through an internal channel. Every change is
/// published as a fresh [`FormView`]. The driver stops, cancelling its timer
/// and any outstanding submission, once every [`FormHandle`] is dropped.
pub struct FormDriver {
    form: OrderForm,
    service: Arc<dyn OrderSubmissionService>,
    banner_timeout: Duration,
    commands: mpsc::UnboundedReceiver<Envelope>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    view_tx: watch::Sender<FormView>,
    timer: DisplayTimer,
    submission: Option<AbortHandle>,
}

impl FormDriver {
    pub fn new(
        form: OrderForm,
        service: Arc<dyn OrderSubmissionService>,
        banner_timeout: Duration,
    ) -> (Self, FormHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (view_tx, view) = watch::channel(form.view());

        let driver = Self {
            form,
            service,
            banner_timeout,
            commands,
            internal_tx,
            internal_rx,
            view_tx,
            timer: DisplayTimer::new(),
            submission: None,
        };
        let handle = FormHandle {
            commands: commands_tx,
            view,
        };
        (driver, handle)
    }

    pub async fn run(mut self) {
        info!(
            "order form running with submission service '{}'",
            self.service.name()
        );

        loop {
            tokio::select! {
                biased;

                Some(event) = self.internal_rx.recv() => {
                    self.handle_internal(event);
                    self.publish();
                }

                envelope = self.commands.recv() => {
                    match envelope {
                        Some(Envelope { command, reply }) => {
                            let outcome = self.handle_command(command);
                            self.publish();
                            let _ = reply.send(outcome);
                        }
                        None => {
                            debug!("all form handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        self.shutdown();
    }

    fn handle_command(&mut self, command: FormCommand) -> CommandOutcome {
        debug!("form command: {command:?}");
        match command {
            FormCommand::SetFullName(value) => self.form.set_full_name(value),
            FormCommand::SetSize(value) => self.form.set_size(value),
            FormCommand::ToggleTopping(id) => {
                if let Err(e) = self.form.toggle_topping(&id) {
                    warn!("{e}");
                    return CommandOutcome::Rejected(e);
                }
            }
            FormCommand::Blur(field) => self.form.touch(field),
            FormCommand::Submit => return self.submit(),
        }
        CommandOutcome::Applied
    }

    fn submit(&mut self) -> CommandOutcome {
        let result = self.form.begin_submit();
        // begin_submit dismisses any banner, so its expiry is moot
        if self.form.banner().is_none() {
            self.timer.cancel();
        }
        match result {
            Ok(pending) => {
                let ticket = pending.ticket;
                self.spawn_submission(pending);
                CommandOutcome::SubmitStarted(ticket)
            }
            Err(rejection) => CommandOutcome::SubmitRejected(rejection),
        }
    }

    fn spawn_submission(&mut self, pending: PendingSubmission) {
        let PendingSubmission { ticket, order } = pending;
        let service = self.service.clone();
        let task = tokio::spawn(async move { service.submit(&order).await });
        self.submission = Some(task.abort_handle());

        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = match task.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => return,
                Err(e) => Err(OrderError::Submission(format!(
                    "submission task failed: {e}"
                ))),
            };
            let _ = tx.send(Internal::SubmissionFinished { ticket, result });
        });
    }

    fn handle_internal(&mut self, event: Internal) {
        match event {
            Internal::SubmissionFinished { ticket, result } => {
                self.submission = None;
                if let Some(generation) = self.form.complete_submission(ticket, result) {
                    let tx = self.internal_tx.clone();
                    self.timer.schedule(self.banner_timeout, move || {
                        let _ = tx.send(Internal::BannerExpired(generation));
                    });
                }
            }
            Internal::BannerExpired(generation) => {
                self.form.expire_banner(generation);
            }
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.form.view());
    }

    fn shutdown(&mut self) {
        if self.timer.cancel() {
            debug!("cancelled pending banner expiry");
        }
        if let Some(task) = self.submission.take() {
            warn!("abandoning in-flight submission");
            task.abort();
        }
        info!("order form stopped");
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::{
        form::{Banner, Order, Schema, SubmissionPhase, ToppingCatalog, FAILURE_MESSAGE},
        service::FixedOutcomeService,
    };

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn init_log() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn start(service: FixedOutcomeService) -> (FormHandle, tokio::task::JoinHandle<()>) {
        init_log();
        let form = OrderForm::new(ToppingCatalog::default(), Schema::default());
        let (driver, handle) = FormDriver::new(form, Arc::new(service), TIMEOUT);
        (handle, tokio::spawn(driver.run()))
    }

    async fn fill_alice(handle: &FormHandle) {
        handle.set_full_name("Alice").await.unwrap();
        handle.set_size("S").await.unwrap();
        handle.toggle_topping("1").await.unwrap();
        handle.toggle_topping("3").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_banner_clears_after_timeout() {
        let (mut handle, _task) = start(FixedOutcomeService::accepting());
        fill_alice(&handle).await;

        let view = handle.view();
        assert!(view.errors.is_empty());
        assert!(view.submit_enabled);

        handle.submit().await.unwrap().unwrap();
        let view = handle.wait_for(|v| v.banner.is_some()).await.unwrap();
        let shown_at = Instant::now();

        assert_eq!(view.phase, SubmissionPhase::Succeeded);
        let banner = view.banner.clone().unwrap();
        assert!(banner.is_success());
        assert!(banner
            .message()
            .starts_with("Thank you for your order, Alice! Your small pizza with 2 toppings"));
        assert_eq!(view.full_name, "");
        assert!(view.checked_toppings().is_empty());
        assert!(view.errors.is_empty());

        let view = handle.wait_for(|v| v.banner.is_none()).await.unwrap();
        assert!(shown_at.elapsed() >= TIMEOUT);
        assert_eq!(view.phase, SubmissionPhase::Blocked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_fields() {
        let (mut handle, _task) = start(FixedOutcomeService::rejecting());
        fill_alice(&handle).await;

        handle.submit().await.unwrap().unwrap();
        let view = handle.wait_for(|v| v.banner.is_some()).await.unwrap();
        assert_eq!(view.banner, Some(Banner::Failure(FAILURE_MESSAGE.to_string())));
        assert_eq!(view.phase, SubmissionPhase::Failed);
        assert_eq!(view.full_name, "Alice");
        assert_eq!(view.checked_toppings(), vec!["1", "3"]);
        assert!(view.submit_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_banner_clears_back_to_idle() {
        let (mut handle, _task) = start(FixedOutcomeService::rejecting());
        fill_alice(&handle).await;

        handle.submit().await.unwrap().unwrap();
        handle.wait_for(|v| v.banner.is_some()).await.unwrap();
        let shown_at = Instant::now();

        let view = handle.wait_for(|v| v.banner.is_none()).await.unwrap();
        assert!(shown_at.elapsed() >= TIMEOUT);
        assert_eq!(view.phase, SubmissionPhase::Idle);
        assert_eq!(view.full_name, "Alice");
        assert_eq!(view.selected_size(), Some("S"));
        assert_eq!(view.checked_toppings(), vec!["1", "3"]);
        assert!(view.errors.is_empty());
        assert!(view.submit_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_disabled_while_in_flight() {
        let service = FixedOutcomeService::accepting().with_delay(Duration::from_secs(1));
        let (mut handle, _task) = start(service);
        fill_alice(&handle).await;

        handle.submit().await.unwrap().unwrap();
        let view = handle.view();
        assert_eq!(view.phase, SubmissionPhase::Submitting);
        assert!(!view.submit_enabled);
        assert!(matches!(
            handle.submit().await.unwrap(),
            Err(SubmitRejection::InFlight)
        ));

        let view = handle
            .wait_for(|v| v.phase == SubmissionPhase::Succeeded)
            .await
            .unwrap();
        assert!(view.banner.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_submit_shows_errors() {
        let (handle, _task) = start(FixedOutcomeService::accepting());
        handle.set_full_name("Al").await.unwrap();
        handle.set_size("M").await.unwrap();

        let rejection = handle.submit().await.unwrap().unwrap_err();
        assert!(matches!(rejection, SubmitRejection::Blocked(ref e) if e.len() == 1));
        let view = handle.view();
        assert_eq!(
            view.error(FormField::FullName),
            Some("Full name must be at least 3 characters")
        );
        assert!(!view.submit_enabled);
        assert_eq!(view.phase, SubmissionPhase::Blocked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmit_restarts_banner_timeout() {
        let (mut handle, _task) = start(FixedOutcomeService::rejecting());
        fill_alice(&handle).await;

        handle.submit().await.unwrap().unwrap();
        handle.wait_for(|v| v.banner.is_some()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(3)).await;
        handle.submit().await.unwrap().unwrap();
        handle.wait_for(|v| v.banner.is_some()).await.unwrap();
        let second_shown_at = Instant::now();

        // past the first banner's deadline, the second one is still up
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(handle.view().banner.is_some());

        handle.wait_for(|v| v.banner.is_none()).await.unwrap();
        assert!(second_shown_at.elapsed() >= TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_topping_is_reported() {
        let (handle, _task) = start(FixedOutcomeService::accepting());
        let err = handle.toggle_topping("99").await.unwrap_err();
        assert!(matches!(err, OrderError::UnknownTopping(_)));
        assert!(handle.view().checked_toppings().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_reveals_error() {
        let (handle, _task) = start(FixedOutcomeService::accepting());
        assert!(handle.view().errors.is_empty());
        handle.blur(FormField::Size).await.unwrap();
        assert_eq!(handle.view().error(FormField::Size), Some("Size is required"));
        assert_eq!(handle.view().error(FormField::FullName), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_stops_when_handles_dropped() {
        let service = FixedOutcomeService::accepting().with_delay(Duration::from_secs(60));
        let (handle, task) = start(service);
        fill_alice(&handle).await;
        handle.submit().await.unwrap().unwrap();

        drop(handle);
        task.await.unwrap();
    }

    struct PanickingService;

    #[async_trait::async_trait]
    impl OrderSubmissionService for PanickingService {
        async fn submit(&self, _order: &Order) -> OrderResult<Receipt> {
            panic!("backend exploded");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_service_counts_as_failure() {
        init_log();
        let form = OrderForm::new(ToppingCatalog::default(), Schema::default());
        let (driver, mut handle) = FormDriver::new(form, Arc::new(PanickingService), TIMEOUT);
        let _task = tokio::spawn(driver.run());
        fill_alice(&handle).await;

        handle.submit().await.unwrap().unwrap();
        let view = handle.wait_for(|v| v.banner.is_some()).await.unwrap();
        assert_eq!(view.phase, SubmissionPhase::Failed);
        assert_eq!(view.full_name, "Alice");
    }
}
