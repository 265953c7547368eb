pub mod gpu;
pub mod storage;
pub mod wireless;

use std::process::Command;

use log::{debug, warn};
use serde::{de::DeserializeOwned, Deserialize};
use sysinfo::{CpuExt, System, SystemExt};

use crate::{
    consts::{BYTES_PER_KB, UNKNOWN},
    error::CollectorError,
    facts::{CpuInfo, RawHardwareFacts},
};

pub use wireless::{await_ble, BleProbe, SystemBleProbe};

/// Source of the raw facts the decision engine evaluates.
///
/// BLE is left as `None`; it is probed asynchronously and merged in with
/// [`RawHardwareFacts::with_ble`].
pub trait HardwareCollector {
    fn collect_facts(&self) -> RawHardwareFacts;
}

impl HardwareCollector for System {
    fn collect_facts(&self) -> RawHardwareFacts {
        let facts = RawHardwareFacts {
            cpus: collect_cpus(self),
            total_ram_bytes: self.total_memory().saturating_mul(BYTES_PER_KB),
            drives: storage::collect_drives(self),
            disk_media: storage::collect_disk_media(self),
            total_free_space_bytes: storage::total_free_space(self),
            gpus: gpu::collect_gpus(),
            os_version: self.os_version().unwrap_or_else(|| UNKNOWN.to_owned()),
            os_caption: self
                .long_os_version()
                .or_else(|| self.name())
                .unwrap_or_else(|| UNKNOWN.to_owned()),
            wireless_supported: wireless::wireless_supported(self),
            ble_supported: None,
        };

        debug!(
            "Collected facts: {} cpu(s), {} drive(s), {} gpu(s), os {}",
            facts.cpus.len(),
            facts.drives.len(),
            facts.gpus.len(),
            facts.os_version
        );
        facts
    }
}

fn collect_cpus(sys: &System) -> Vec<CpuInfo> {
    let cpus = sys.cpus();
    let first = match cpus.first() {
        Some(cpu) => cpu,
        None => {
            warn!("No processors reported by the operating system");
            return Vec::new();
        }
    };

    vec![CpuInfo {
        name: first.brand().trim().to_owned(),
        core_count: sys.physical_core_count().unwrap_or(cpus.len()),
        max_clock_mhz: cpus.iter().map(|cpu| cpu.frequency()).max().unwrap_or(0),
    }]
}

pub(crate) fn run_command(program: &str, args: &[&str]) -> Result<String, CollectorError> {
    debug!("Running {} {:?}", program, args);
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        return Err(CollectorError::CommandFailed {
            command: program.to_owned(),
            status: output.status.to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub(crate) fn run_powershell(script: &str) -> Result<String, CollectorError> {
    run_command(
        "powershell",
        &["-NoProfile", "-NonInteractive", "-Command", script],
    )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// `ConvertTo-Json` emits a bare object for one record and an array for
/// several; empty output means no records.
pub(crate) fn parse_json_records<T: DeserializeOwned>(
    text: &str,
) -> Result<Vec<T>, CollectorError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    Ok(match serde_json::from_str::<OneOrMany<T>>(text)? {
        OneOrMany::Many(records) => records,
        OneOrMany::One(record) => vec![record],
    })
}
