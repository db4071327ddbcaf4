//! cheeky-led CLI: set the notifier LED color from the command line.

use anyhow::{Context, Result};
use cheeky_led_core::comm::ErrorClass;
use cheeky_led_core::device::{DeviceIdentity, LocatorConfig};
use cheeky_led_core::led::RunSummary;
use cheeky_led_core::run::{self, LedRequest};
use cheeky_led_core::transport::HidapiTransport;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cheeky-led",
    version,
    about = "Set the RGB LED of attached Dream Cheeky webmail notifiers"
)]
struct Cli {
    /// Red intensity (0-31).
    #[arg(required_unless_present = "list", allow_negative_numbers = true)]
    red: Option<String>,
    /// Green intensity (0-31).
    #[arg(required_unless_present = "list", allow_negative_numbers = true)]
    green: Option<String>,
    /// Blue intensity (0-31).
    #[arg(required_unless_present = "list", allow_negative_numbers = true)]
    blue: Option<String>,
    /// Skip the LED activation report when non-zero (default 0: activate).
    #[arg(allow_negative_numbers = true)]
    activation: Option<String>,

    /// List attached notifiers without changing their color.
    #[arg(long, conflicts_with_all = ["red", "green", "blue", "activation"])]
    list: bool,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// USB vendor ID to match (hex with 0x prefix, or decimal).
    #[arg(long, value_parser = parse_id, default_value = "0x1D34")]
    vendor_id: u16,

    /// USB product ID to match (hex with 0x prefix, or decimal).
    #[arg(long, value_parser = parse_id, default_value = "0x0004")]
    product_id: u16,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn locator(&self) -> LocatorConfig {
        LocatorConfig {
            target: DeviceIdentity::new(self.vendor_id, self.product_id),
            ..LocatorConfig::default()
        }
    }
}

fn parse_id(s: &str) -> std::result::Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid USB id {s:?}: {e}"))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_transport() -> cheeky_led_core::error::Result<HidapiTransport> {
    HidapiTransport::open()
}

/// Attach the classifier's hint to fatal transport errors.
fn with_hint(err: cheeky_led_core::error::Error) -> anyhow::Error {
    match ErrorClass::classify(&err).hint() {
        Some(hint) if err.is_fatal() && !err.is_input() => anyhow::Error::new(err).context(hint),
        _ => anyhow::Error::new(err),
    }
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).context("serialize run summary")?
        );
        return Ok(());
    }

    if summary.devices.is_empty() {
        println!("No notifier found.");
        println!("Ensure the notifier is plugged in and accessible to the current user.");
        return Ok(());
    }

    if summary.activation_attempted() {
        println!("LED activation sent.");
    }
    for outcome in &summary.devices {
        let status = if outcome.color.is_ok() { "set" } else { "FAILED" };
        println!("{}: {} {status}", outcome.device, summary.color);
    }
    if !summary.is_clean() {
        println!("{} report write(s) failed; see warnings above.", summary.failed_writes());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list {
        let devices = run::list(&cli.locator(), open_transport).map_err(with_hint)?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&devices).context("serialize device list")?
            );
        } else if devices.is_empty() {
            println!("No notifier found.");
        } else {
            for dev in &devices {
                println!("{dev}");
            }
        }
        return Ok(());
    }

    let (Some(red), Some(green), Some(blue)) = (&cli.red, &cli.green, &cli.blue) else {
        anyhow::bail!("usage: cheeky-led R G B [A]");
    };
    let request = LedRequest {
        locator: cli.locator(),
        ..run::parse_request(red, green, blue, cli.activation.as_deref())?
    };
    debug!(
        color = %request.color,
        activation = ?request.activation,
        target = %request.locator.target,
        "Validated request"
    );

    let summary = run::execute(&request, open_transport).map_err(with_hint)?;
    print_summary(&summary, cli.json)
}
