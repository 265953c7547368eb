use std::{process, time::Duration};

use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use sysinfo::{System, SystemExt};

use pc_checker::{
    hardware::{await_ble, HardwareCollector, SystemBleProbe},
    report::build_report,
    rules::Requirements,
};

#[derive(Clone, Debug, Parser)]
struct CliOpts {
    /// Print the report as JSON
    #[clap(long, env = "PC_CHECKER_JSON")]
    json: bool,

    /// How long to wait for the Bluetooth LE probe, in milliseconds
    #[clap(long, env = "BLE_PROBE_TIMEOUT_MS", default_value = "3000")]
    ble_timeout_ms: u64,

    /// Do not probe Bluetooth LE, report it as unknown
    #[clap(long)]
    skip_ble: bool,

    /// Exit with status 1 when the machine does not meet the requirements
    #[clap(long)]
    fail_on_incompatible: bool,

    /// Enable debug logging
    #[clap(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let opts = CliOpts::parse();
    let level = if opts.verbose { "debug" } else { "warn" };
    env_logger::init_from_env(Env::default().default_filter_or(level));

    let ble = if opts.skip_ble {
        None
    } else {
        let wait = Duration::from_millis(opts.ble_timeout_ms);
        Some(tokio::spawn(async move {
            await_ble(&SystemBleProbe::default(), wait).await
        }))
    };

    let facts = tokio::task::spawn_blocking(|| {
        let sys = System::new_all();
        sys.collect_facts()
    })
    .await?;

    let ble_supported = match ble {
        Some(handle) => handle.await.unwrap_or_else(|e| {
            warn!("BLE probe task failed: {}", e);
            None
        }),
        None => None,
    };

    let report = build_report(&facts.with_ble(ble_supported), &Requirements::default());
    info!("Overall compatibility: {}", report.overall);

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    if opts.fail_on_incompatible && !report.overall {
        process::exit(1);
    }
    Ok(())
}
