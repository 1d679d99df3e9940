//! eventstream - CLI tool for the Webscale EventStream login forwarder
//!
//! This tool provides commands for:
//! - Checking forwarder configuration
//! - Firing a single login event by hand, exactly as the storefront would
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/eventstream/config.toml (~/.config/eventstream/config.toml)
//! - Logs: $XDG_STATE_HOME/eventstream/ (~/.local/state/eventstream/)

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eventstream_core::config::{XML_PATH_ENABLED, XML_PATH_LOGGING};
use eventstream_core::context::{
    ConfigReader, ScopeType, StaticCookies, StaticModules, StaticRequest,
};
use eventstream_core::forwarder::{
    endpoint_for, Collaborators, Customer, HttpTransport, LoginEventForwarder, LoginSuccess,
    Outcome, SyncLoginEventForwarder, APP_ID_HEADER, MODULE_NAME,
};
use eventstream_core::logging::{self, TracingLogSink};
use eventstream_core::Config;

#[derive(Parser)]
#[command(name = "eventstream")]
#[command(about = "Webscale EventStream login forwarder")]
#[command(version)]
struct Args {
    /// Log at debug level and echo log entries to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show forwarder configuration and status
    Status,

    /// Forward one login event for a customer
    Login {
        /// Customer id
        #[arg(long)]
        customer_id: Option<u64>,

        /// Customer email
        #[arg(long)]
        email: Option<String>,

        /// Value of the inbound Webscale-App-Id header
        #[arg(long)]
        app_id: Option<String>,

        /// Value of the session cookie
        #[arg(long)]
        cookie: Option<String>,

        /// Store base URL (default: from config)
        #[arg(long)]
        base_url: Option<String>,

        /// Send a notification without a customer
        #[arg(long, conflicts_with_all = ["customer_id", "email"])]
        anonymous: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Keep the guard alive for the whole run so entries are flushed on exit
    let _log_guard =
        logging::init(&config.logging, args.verbose).context("failed to initialize logging")?;

    match args.command {
        Command::Status => cmd_status(&config),
        Command::Login {
            customer_id,
            email,
            app_id,
            cookie,
            base_url,
            anonymous,
        } => {
            let customer = (!anonymous).then_some(Customer {
                id: customer_id,
                email,
            });
            cmd_login(&config, customer, app_id, cookie, base_url)
        }
    }
}

fn cmd_status(config: &Config) -> Result<()> {
    println!("Webscale EventStream Configuration");
    println!("==================================");
    println!();

    let flags = &config.eventstream;
    let enabled = flags.is_set_flag(XML_PATH_ENABLED, ScopeType::Website);
    let dev_logging = flags.is_set_flag(XML_PATH_LOGGING, ScopeType::Website);

    println!("Enabled:         {}", enabled);
    println!("Dev Logging:     {}", dev_logging);

    if !enabled {
        println!();
        println!("Forwarder is disabled. Enable it in config.toml:");
        println!();
        println!("  [eventstream]");
        println!("  enabled = true");
        println!();
        println!("  [store]");
        println!("  base_url = \"https://your-store.example.com/\"");
    }

    println!();
    println!(
        "Endpoint:        {}",
        config
            .store
            .base_url
            .as_deref()
            .map(endpoint_for)
            .unwrap_or_else(|| "<base_url not set>".to_string())
    );
    println!("Store Code:      {}", config.store.store_code);
    println!("Website Code:    {}", config.store.website_code);
    println!("Session Cookie:  {}", config.payload.cookie_name);
    println!("Log File:        {}", logging::log_file_path().display());

    Ok(())
}

fn cmd_login(
    config: &Config,
    customer: Option<Customer>,
    app_id: Option<String>,
    cookie: Option<String>,
    base_url: Option<String>,
) -> Result<()> {
    let cookie_name = config.payload.cookie_name.clone();

    let mut request = StaticRequest::new();
    if let Some(app_id) = &app_id {
        request = request.with_header(APP_ID_HEADER, app_id);
    }

    let mut cookies = StaticCookies::new();
    if let Some(value) = &cookie {
        cookies = cookies.with_cookie(&cookie_name, value);
    }

    let deps = Collaborators {
        config: Arc::new(config.eventstream.clone()),
        store: Arc::new(config.store.to_store(base_url.as_deref())),
        request: Arc::new(request),
        cookies: Arc::new(cookies),
        modules: Arc::new(
            StaticModules::new().with_module(MODULE_NAME, env!("CARGO_PKG_VERSION")),
        ),
        logger: Arc::new(TracingLogSink),
        transport: Arc::new(HttpTransport::new().context("failed to create HTTP transport")?),
    };

    let forwarder = SyncLoginEventForwarder::new(LoginEventForwarder::new(deps, cookie_name))
        .context("failed to create forwarder")?;

    let outcome = forwarder.on_login_success(&LoginSuccess { customer });
    tracing::debug!(?outcome, "Login event handled");

    match outcome {
        Outcome::Disabled => println!("Forwarder is disabled; nothing sent."),
        Outcome::NoCustomer => println!("No customer on login event; nothing sent."),
        Outcome::Delivered { status } => println!("Delivered (HTTP {}).", status),
        Outcome::Rejected { status } => println!("Rejected by collector (HTTP {}).", status),
        Outcome::Failed => println!(
            "Delivery failed; details in {}.",
            logging::log_file_path().display()
        ),
    }

    Ok(())
}
