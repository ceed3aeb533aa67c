//! Raksha simulator: replays a scripted scenario through the guardian.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimPlatform        LogEventSink    JsonConfigFile   Clock     │
//! │  (all device ports) (EventSink)     (ConfigPort)     (virtual  │
//! │                                                       or real) │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Guardian (pure logic)                     │    │
//! │  │  FallDetector · AlertManager · SosDispatcher           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  runtime::run (inbox drain · poll · sleep)                     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::info;

use raksha::adapters::config_store::JsonConfigFile;
use raksha::adapters::log_sink::LogEventSink;
use raksha::adapters::sim::{Scenario, SimOptions, SimPlatform};
use raksha::adapters::time::{SystemClock, VirtualClock};
use raksha::app::ports::{Clock, ConfigPort};
use raksha::app::service::Guardian;
use raksha::config::GuardConfig;
use raksha::events::Inbox;
use raksha::runtime;

#[derive(Debug, Parser)]
#[command(name = "raksha-sim", version, about = "Replay a guard-mode scenario on the host")]
struct Cli {
    /// Scenario to replay.
    #[arg(long, value_enum, default_value_t = Scenario::Fall)]
    scenario: Scenario,

    /// JSON config file; defaults are used if absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run against the wall clock instead of virtual time.
    #[arg(long)]
    realtime: bool,

    /// Simulate a phone without the messaging app (forces SMS fallback).
    #[arg(long)]
    no_messaging_app: bool,

    /// Simulate no GPS fix and no last-known position.
    #[arg(long)]
    no_gps: bool,

    /// Refuse microphone and location permission.
    #[arg(long)]
    deny_permissions: bool,

    /// Simulate a device without an accelerometer.
    #[arg(long)]
    no_sensor: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => JsonConfigFile::new(path)
            .load()
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GuardConfig::default(),
    };

    let options = SimOptions {
        sensor_available: !cli.no_sensor,
        mic_permission: !cli.deny_permissions,
        location_permission: !cli.deny_permissions,
        fix: if cli.no_gps { None } else { SimOptions::default().fix },
        messaging_app: !cli.no_messaging_app,
        ..SimOptions::default()
    };

    info!("Raksha simulator: scenario {:?}", cli.scenario);
    if cli.realtime {
        replay(SystemClock::new(), cli.scenario, config, options)
    } else {
        replay(
            VirtualClock::new(Local::now().fixed_offset()),
            cli.scenario,
            config,
            options,
        )
    }
}

fn replay<C: Clock>(
    clock: C,
    scenario: Scenario,
    config: GuardConfig,
    options: SimOptions,
) -> Result<()> {
    let inbox: Inbox<CriticalSectionRawMutex> = Inbox::new();
    let mut platform = SimPlatform::new(clock, &inbox, scenario.script(), options);
    let mut guardian = Guardian::new(config);
    let mut sink = LogEventSink::new();

    let processed = futures_lite::future::block_on(async {
        guardian.initialize(&mut platform, &mut sink).await;
        runtime::run(&mut guardian, &inbox, &mut platform, &mut sink).await
    });

    info!(
        "Scenario {:?} finished: {} inputs, {} events, {} dispatches, {} links opened, t={}ms",
        scenario,
        processed,
        sink.emitted(),
        guardian.dispatch_count(),
        platform.opened().len(),
        platform.now_ms(),
    );
    Ok(())
}
