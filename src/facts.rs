use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct CpuInfo {
    pub name: String,
    pub core_count: usize,
    pub max_clock_mhz: u64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DriveInfo {
    pub model: String,
    pub description: String,
    pub size_bytes: u64,
}

/// Output of the disk media classifier, used for display only.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DiskMediaInfo {
    pub device_id: String,
    pub media_type: String,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuKind {
    Discrete,
    Integrated,
}

impl GpuKind {
    /// Vendor/name heuristic used by the collectors.
    ///
    /// NVIDIA is always discrete. Intel is integrated unless the name is an
    /// Arc A-series card. AMD/ATI is discrete only when the name carries a
    /// dedicated-card marker. Everything else (basic display adapters,
    /// virtual GPUs) is treated as integrated.
    pub fn classify(name: &str, manufacturer: &str) -> GpuKind {
        let name = name.to_lowercase();
        let vendor = format!("{} {}", manufacturer.to_lowercase(), name);

        if vendor.contains("nvidia") {
            GpuKind::Discrete
        } else if vendor.contains("intel") {
            if name.contains("arc a") || name.contains("arc(tm) a") || name.contains("arc b") {
                GpuKind::Discrete
            } else {
                GpuKind::Integrated
            }
        } else if vendor.contains("amd")
            || vendor.contains("advanced micro devices")
            || vendor.contains("ati ")
            || vendor.starts_with("ati")
        {
            const DISCRETE_MARKERS: [&str; 4] = ["rx", "pro", "firepro", "radeon vii"];
            let discrete = name
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|token| DISCRETE_MARKERS.contains(&token))
                || name.contains("radeon vii");
            if discrete {
                GpuKind::Discrete
            } else {
                GpuKind::Integrated
            }
        } else {
            GpuKind::Integrated
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GpuInfo {
    pub name: String,
    pub manufacturer: String,
    pub adapter_ram_bytes: u64,
    pub kind: GpuKind,
}

impl GpuInfo {
    pub fn new(name: String, manufacturer: String, adapter_ram_bytes: u64) -> Self {
        let kind = GpuKind::classify(&name, &manufacturer);
        Self {
            name,
            manufacturer,
            adapter_ram_bytes,
            kind,
        }
    }
}

/// Best-effort snapshot produced by the collectors.
///
/// `ble_supported` is `None` while the asynchronous BLE probe has not
/// answered (or timed out), which the report shows as unknown.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RawHardwareFacts {
    pub cpus: Vec<CpuInfo>,
    pub total_ram_bytes: u64,
    pub drives: Vec<DriveInfo>,
    pub disk_media: Vec<DiskMediaInfo>,
    pub total_free_space_bytes: u64,
    pub gpus: Vec<GpuInfo>,
    pub os_version: String,
    pub os_caption: String,
    pub wireless_supported: bool,
    pub ble_supported: Option<bool>,
}

impl RawHardwareFacts {
    /// Name of the first processor, the only one used for classification.
    pub fn processor_name(&self) -> &str {
        self.cpus.first().map(|cpu| cpu.name.as_str()).unwrap_or("")
    }

    pub fn with_ble(self, ble_supported: Option<bool>) -> Self {
        Self {
            ble_supported,
            ..self
        }
    }
}
