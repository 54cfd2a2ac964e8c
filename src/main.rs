use clap::Parser;
use tokio::io::BufReader;

use pizza_order::{
    config::Config,
    console,
    core::OrderResult,
    form::OrderForm,
    logging::Logger,
    orchestration::FormDriver,
    service::build_submission_service,
};

#[derive(Parser, Debug)]
#[command(name = "pizza-order", version, about = "Order a pizza from the terminal")]
struct Opt {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    conf: Option<String>,

    /// Check the configuration and exit
    #[arg(short, long)]
    test: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> OrderResult<()> {
    // Read command-line arguments
    let opt = Opt::parse();

    // Load configuration, falling back to built-in defaults
    let config = Config::load_or_default(opt.conf.as_deref())?;

    // Initialize logging
    let logger = Logger::new(config.log.clone());
    logger.init_env_logger();
    let log_task = logger.spawn();

    if opt.test {
        log::info!("Configuration is valid");
        let result = config.to_yaml().map(|yaml| println!("{yaml}"));
        log_task.shutdown().await;
        return result;
    }

    log::info!(
        "Loaded catalog with {} toppings, banner timeout {}ms",
        config.catalog.len(),
        config.form.banner_timeout_ms
    );

    let service = build_submission_service(&config.submission);
    let form = OrderForm::new(config.catalog.clone(), config.schema());
    let (driver, handle) = FormDriver::new(form, service, config.form.banner_timeout());
    let driver_task = tokio::spawn(driver.run());

    log::info!("Starting console...");
    println!("{}", console::HELP);
    let result = console::run(
        handle,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await;

    // the console owned the only handle, so the driver winds down now
    if let Err(e) = driver_task.await {
        log::error!("Form driver failed: {e}");
    }

    log_task.shutdown().await;
    result
}
