use clap::Parser;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;

use storefront_assistant::core::config::{self, CliOverrides};
use storefront_assistant::tui;

#[derive(Parser)]
#[command(
    name = "storefront-assistant",
    about = "Terminal chat assistant for marketplace listings"
)]
struct Args {
    /// Chat endpoint URL (overrides STOREFRONT_ENDPOINT_URL and the config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Where to write the log file
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Config is loaded before the logger exists; a broken file is reported
    // once logging is up.
    let (file_config, config_error) = match config::load_config() {
        Ok(c) => (c, None),
        Err(e) => (Default::default(), Some(e)),
    };
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            endpoint: args.endpoint.as_deref(),
            log_file: args.log_file.as_deref(),
        },
    );

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    if let Some(e) = config_error {
        log::warn!("Ignoring config file: {}", e);
    }
    log::info!(
        "Storefront assistant starting up, endpoint: {}",
        resolved.endpoint_url
    );

    tui::run(resolved)
}
