use anyhow::{anyhow, Result};
use clap::Parser;
use ddc_engine::{DdcTransport, EngineConfig, MonitorDescriptor};
use ddc_facade::{status, MonitorControl};
use ddc_protocol::{FeatureCode, InputSource};
use std::sync::Arc;
use tracing::info;

mod args;

use args::{Args, Command};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("monitorswitch={level},ddc_engine={level},ddc_facade={level}").into()
            }),
        )
        .with_target(false)
        .init();
}

#[cfg(target_os = "linux")]
fn open_transport() -> Result<Arc<dyn DdcTransport>> {
    Ok(Arc::new(ddc_engine::I2cDevTransport::new()))
}

#[cfg(not(target_os = "linux"))]
fn open_transport() -> Result<Arc<dyn DdcTransport>> {
    anyhow::bail!("no DDC transport is available for this platform yet")
}

/// CLI error message for a non-zero boundary status code.
fn status_error(code: i32) -> anyhow::Error {
    let message = match code {
        status::TRANSPORT_FAULT => "communication with the monitor failed",
        status::CHECKSUM_MISMATCH => "the monitor kept returning corrupted replies",
        status::MALFORMED_REPLY => "the monitor returned a malformed reply",
        status::UNSUPPORTED_FEATURE => "the monitor does not support this feature",
        status::INVALID_HANDLE => "no monitor with that id",
        status::DISCOVERY_UNAVAILABLE => "monitor detection is unavailable (permissions?)",
        _ => "unknown error",
    };
    anyhow!("{} (status {})", message, code)
}

fn check_status(code: i32) -> Result<()> {
    if code == status::OK {
        Ok(())
    } else {
        Err(status_error(code))
    }
}

/// Fetch the current monitor list through the boundary.
fn detect_monitors(control: &MonitorControl) -> Result<Vec<MonitorDescriptor>> {
    let lease = control.list_monitors().map_err(status_error)?;
    let json = control
        .lease_contents(&lease)
        .ok_or_else(|| anyhow!("monitor list lease vanished"))?;
    control.release(lease);
    Ok(serde_json::from_str(&json)?)
}

fn pick_monitor(control: &MonitorControl, id: Option<u32>) -> Result<u32> {
    if let Some(id) = id {
        return Ok(id);
    }
    let monitors = detect_monitors(control)?;
    monitors
        .first()
        .map(|m| m.id.0)
        .ok_or_else(|| anyhow!("no monitors detected"))
}

async fn show_status(control: &MonitorControl, id: u32) -> Result<()> {
    println!("Monitor {}", id);

    let input = control.get_feature(id, FeatureCode::INPUT_SELECT.raw()).await;
    match input.status {
        status::OK => {
            let name = InputSource::from_value(input.value)
                .map(|s| s.name().to_string())
                .unwrap_or_else(|| format!("unknown ({})", input.value));
            println!("  input:      {}", name);
        }
        status::UNSUPPORTED_FEATURE => println!("  input:      n/a"),
        code => check_status(code)?,
    }

    for (label, feature) in [
        ("brightness", FeatureCode::BRIGHTNESS),
        ("contrast", FeatureCode::CONTRAST),
    ] {
        let reply = control.get_feature(id, feature.raw()).await;
        match reply.status {
            status::OK => println!("  {}: {}/{}", label, reply.value, reply.max_value),
            status::UNSUPPORTED_FEATURE => println!("  {}: n/a", label),
            code => check_status(code)?,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    info!(
        settle_delay_ms = config.settle_delay_ms,
        max_retries = config.max_retries,
        "starting monitorswitch {}",
        env!("CARGO_PKG_VERSION")
    );

    let control = MonitorControl::new(open_transport()?, config);

    match args.command {
        Command::Detect => {
            let monitors = detect_monitors(&control)?;
            if monitors.is_empty() {
                println!("No monitors detected.");
            }
            for monitor in monitors {
                let name = if monitor.name.is_empty() {
                    "(unnamed)"
                } else {
                    monitor.name.as_str()
                };
                println!("Monitor {}: {}", monitor.id, name);
            }
        }
        Command::List => {
            println!("Available inputs:");
            for source in InputSource::ALL {
                println!("  {:<14} (VCP value {})", source.name(), source.value());
            }
        }
        Command::Status { id } => {
            let id = pick_monitor(&control, id)?;
            show_status(&control, id).await?;
        }
        Command::Switch { input, id } => {
            let source = InputSource::from_name(&input).ok_or_else(|| {
                anyhow!(
                    "unknown input '{}'; see `monitorswitch list` for choices",
                    input
                )
            })?;
            let id = pick_monitor(&control, id)?;
            check_status(
                control
                    .set_feature(id, FeatureCode::INPUT_SELECT.raw(), source.value())
                    .await,
            )?;
            println!("Monitor {} switched to {}", id, source);
        }
        Command::Get { code, id } => {
            let id = pick_monitor(&control, id)?;
            let reply = control.get_feature(id, code).await;
            check_status(reply.status)?;
            let label = FeatureCode(code)
                .name()
                .map(|n| format!("{} ({:#04x})", n, code))
                .unwrap_or_else(|| format!("{:#04x}", code));
            println!("{}: {} (max {})", label, reply.value, reply.max_value);
        }
        Command::Set { code, value, id } => {
            let id = pick_monitor(&control, id)?;
            check_status(control.set_feature(id, code, value).await)?;
            println!("Monitor {}: {:#04x} set to {}", id, code, value);
        }
    }

    Ok(())
}
