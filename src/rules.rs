use serde::Serialize;

use crate::{
    consts::{
        BYTES_PER_GB, FREE_SPACE_THRESHOLD_IN_GB, MINIMUM_I5_GENERATION, MINIMUM_OS_VERSION,
        MINIMUM_RAM_IN_GB, MINIMUM_SSD_SIZE_IN_GB, MINIMUM_VRAM_FOR_DISCRETE_IN_GB,
        MINIMUM_VRAM_FOR_INTEGRATED_IN_GB, UNKNOWN,
    },
    facts::{CpuInfo, DiskMediaInfo, DriveInfo, GpuInfo, GpuKind},
    normalize::{
        bytes_to_gb, bytes_to_mb, format_gb, OsVersionFact, ProcessorFact, ProcessorFamily,
        ProcessorNormalizer,
    },
};

/// Thresholds every evaluator is judged against.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Requirements {
    /// RAM must be strictly greater than this.
    pub min_ram_gb: u64,
    pub min_drive_size_gb: u64,
    pub min_vram_discrete_gb: u64,
    pub min_vram_integrated_gb: u64,
    /// Informational only, never evaluated against the summed free space.
    pub free_space_threshold_gb: u64,
    pub min_os_version: OsVersionFact,
    pub min_i5_generation: u32,
}

impl Default for Requirements {
    fn default() -> Self {
        let (major, minor) = MINIMUM_OS_VERSION;
        Self {
            min_ram_gb: MINIMUM_RAM_IN_GB,
            min_drive_size_gb: MINIMUM_SSD_SIZE_IN_GB,
            min_vram_discrete_gb: MINIMUM_VRAM_FOR_DISCRETE_IN_GB,
            min_vram_integrated_gb: MINIMUM_VRAM_FOR_INTEGRATED_IN_GB,
            free_space_threshold_gb: FREE_SPACE_THRESHOLD_IN_GB,
            min_os_version: OsVersionFact::new(major, minor),
            min_i5_generation: MINIMUM_I5_GENERATION,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    OsVersion,
    Cpu,
    Processor,
    Ram,
    Drive,
    Storage,
    DiskType,
    FreeSpace,
    Gpu,
    Wireless,
    Ble,
}

impl Dimension {
    /// Only these dimensions decide overall compatibility.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Dimension::OsVersion | Dimension::Processor | Dimension::Ram
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Info,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Verdict {
    pub dimension: Dimension,
    pub status: Status,
    pub detail: String,
}

impl Verdict {
    fn new(dimension: Dimension, status: Status, detail: String) -> Self {
        Self {
            dimension,
            status,
            detail,
        }
    }

    fn check(dimension: Dimension, pass: bool, detail: String) -> Self {
        let status = if pass { Status::Pass } else { Status::Fail };
        Self::new(dimension, status, detail)
    }

    pub fn pass(&self) -> bool {
        matches!(self.status, Status::Pass | Status::Info)
    }
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        UNKNOWN
    } else {
        value
    }
}

pub fn evaluate_os_version(caption: &str, version: &str, req: &Requirements) -> Verdict {
    let required = req.min_os_version;
    let header = format!(
        "Operating System: {}\nOperating System Version: {}",
        or_unknown(caption),
        or_unknown(version)
    );

    match OsVersionFact::parse(version) {
        Ok(detected) if detected >= required => Verdict::check(
            Dimension::OsVersion,
            true,
            format!(
                "{}\nPass: Operating system version is {} or newer.",
                header, required.major
            ),
        ),
        Ok(detected) => Verdict::check(
            Dimension::OsVersion,
            false,
            format!(
                "{}\nNot pass: The operating system version is older than {}. Current version: {}. An update is required for full compatibility.",
                header, required.major, detected
            ),
        ),
        Err(e) => Verdict::check(
            Dimension::OsVersion,
            false,
            format!(
                "{}\nNot pass: The operating system version is unrecognized ({}). Version {} or newer is required.",
                header, e, required.major
            ),
        ),
    }
}

pub fn evaluate_cpu_listing(cpus: &[CpuInfo]) -> Vec<Verdict> {
    cpus.iter()
        .map(|cpu| {
            Verdict::new(
                Dimension::Cpu,
                Status::Info,
                format!(
                    "Name: {}\nNumber of cores: {}\nFrequency: {}MHz",
                    or_unknown(&cpu.name),
                    cpu.core_count,
                    cpu.max_clock_mhz
                ),
            )
        })
        .collect()
}

pub fn processor_passes(fact: &ProcessorFact, req: &Requirements) -> bool {
    match fact.family {
        ProcessorFamily::I7 => true,
        ProcessorFamily::I5 => fact.generation >= req.min_i5_generation,
        ProcessorFamily::I3 | ProcessorFamily::Other => false,
    }
}

pub fn evaluate_processor(
    processor_name: &str,
    normalizer: &impl ProcessorNormalizer,
    req: &Requirements,
) -> Verdict {
    let fact = normalizer.normalize(processor_name);
    let pass = processor_passes(&fact, req);

    let classification = match (fact.family, fact.generation) {
        (ProcessorFamily::Other, _) => "unrecognized processor model".to_owned(),
        (family, 0) => format!("{} gen unknown", family),
        (family, generation) => format!("{} gen {}", family, generation),
    };
    let outcome = if pass {
        "Your processor is suitable."
    } else {
        "Your processor is not suitable."
    };

    Verdict::check(
        Dimension::Processor,
        pass,
        format!(
            "Detected Processor: {} ({})\n{}",
            or_unknown(processor_name),
            classification,
            outcome
        ),
    )
}

/// Compared in bytes so that anything above the threshold passes, while the
/// displayed figure is the truncated GB count.
pub fn evaluate_ram(total_ram_bytes: u64, req: &Requirements) -> Verdict {
    let total_gb = bytes_to_gb(total_ram_bytes);
    let pass = total_ram_bytes > req.min_ram_gb.saturating_mul(BYTES_PER_GB);
    let outcome = if pass {
        "The amount of RAM is sufficient."
    } else {
        "The amount of RAM is not sufficient. Upgrade recommended."
    };

    Verdict::check(
        Dimension::Ram,
        pass,
        format!("Total RAM: {}GB\n{}", total_gb, outcome),
    )
}

pub fn evaluate_drive_listing(drives: &[DriveInfo]) -> Vec<Verdict> {
    drives
        .iter()
        .map(|drive| {
            Verdict::new(
                Dimension::Drive,
                Status::Info,
                format!(
                    "Name: {}\nType: {}\nSize: {}GB",
                    or_unknown(&drive.model),
                    or_unknown(&drive.description),
                    bytes_to_gb(drive.size_bytes)
                ),
            )
        })
        .collect()
}

pub fn evaluate_storage_size(drives: &[DriveInfo], req: &Requirements) -> Verdict {
    let pass = drives
        .iter()
        .any(|drive| bytes_to_gb(drive.size_bytes) >= req.min_drive_size_gb);

    let detail = if pass {
        format!("At least one drive is {}GB or larger.", req.min_drive_size_gb)
    } else if drives.is_empty() {
        format!(
            "No drives detected. A drive of {}GB or larger is required.",
            req.min_drive_size_gb
        )
    } else {
        let sizes = drives
            .iter()
            .map(|drive| format!("{}GB", bytes_to_gb(drive.size_bytes)))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "No drive is {}GB or larger (found: {}).",
            req.min_drive_size_gb, sizes
        )
    };

    Verdict::check(Dimension::Storage, pass, detail)
}

pub fn evaluate_disk_media(media: &[DiskMediaInfo]) -> Vec<Verdict> {
    media
        .iter()
        .map(|entry| {
            Verdict::new(
                Dimension::DiskType,
                Status::Info,
                format!(
                    "{} {}",
                    or_unknown(&entry.device_id),
                    or_unknown(&entry.media_type)
                ),
            )
        })
        .collect()
}

/// Displayed only. `req.free_space_threshold_gb` is deliberately not applied.
pub fn evaluate_free_space(total_free_space_bytes: u64, _req: &Requirements) -> Verdict {
    Verdict::new(
        Dimension::FreeSpace,
        Status::Info,
        format!(
            "Total free space across all drives: {} GB",
            format_gb(total_free_space_bytes)
        ),
    )
}

pub fn evaluate_gpu(gpu: &GpuInfo, req: &Requirements) -> Verdict {
    let (kind, required_gb) = match gpu.kind {
        GpuKind::Discrete => ("discrete", req.min_vram_discrete_gb),
        GpuKind::Integrated => ("integrated", req.min_vram_integrated_gb),
    };
    let pass = bytes_to_gb(gpu.adapter_ram_bytes) >= required_gb;
    let outcome = if pass { "meets" } else { "does not meet" };

    Verdict::check(
        Dimension::Gpu,
        pass,
        format!(
            "Name: {}\nManufacturer: {}\nMemory: {}MB\nVideo memory {} the {}GB minimum for {} graphics.",
            or_unknown(&gpu.name),
            or_unknown(&gpu.manufacturer),
            bytes_to_mb(gpu.adapter_ram_bytes),
            outcome,
            required_gb,
            kind
        ),
    )
}

pub fn evaluate_wireless(wireless_supported: bool) -> Verdict {
    let detail = if wireless_supported {
        "Wi-Fi is supported."
    } else {
        "Wi-Fi is not supported."
    };
    Verdict::check(Dimension::Wireless, wireless_supported, detail.to_owned())
}

pub fn evaluate_ble(ble_supported: Option<bool>) -> Verdict {
    match ble_supported {
        Some(true) => Verdict::check(Dimension::Ble, true, "BLE is supported.".to_owned()),
        Some(false) => Verdict::check(Dimension::Ble, false, "BLE is not supported.".to_owned()),
        None => Verdict::new(
            Dimension::Ble,
            Status::Unknown,
            "BLE support is unknown.".to_owned(),
        ),
    }
}
