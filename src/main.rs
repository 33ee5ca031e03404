use clap::Parser;
use propdesk::cli::{App, Cli};
use propdesk::config::AppConfig;
use propdesk::error::Result;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("config load failed ({e}), using defaults");
        AppConfig::default_config(true)
    });
    init_logging(&config);

    if let Err(errors) = config.validate() {
        for error in &errors {
            warn!("config: {error}");
        }
        eprintln!("invalid configuration:\n{}", errors.join("\n"));
        std::process::exit(1);
    }

    let app = App::build(&config, cli.address.as_deref(), cli.dry_run)?;
    app.run(&cli.command).await
}

fn init_logging(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,propdesk={}", config.logging.level)));

    // Optional rolling file output, preflighted because the appender
    // panics if it cannot create the initial log file.
    let log_dir = std::env::var("PROPDESK_LOG_DIR").ok();
    let file_layer = log_dir.and_then(|dir| {
        if std::fs::create_dir_all(&dir).is_err() {
            return None;
        }
        let test_path = std::path::Path::new(&dir).join(".propdesk_write_test");
        let writable = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
            .is_ok();
        let _ = std::fs::remove_file(&test_path);
        if !writable {
            return None;
        }
        let appender = tracing_appender::rolling::daily(dir, "propdesk.log");
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(appender)
                .with_ansi(false),
        )
    });

    let console_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if config.logging.json {
        registry.with(console_layer.json()).init();
    } else {
        registry.with(console_layer).init();
    }
}
