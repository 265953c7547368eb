use std::{fs, path::Path};

use log::{debug, warn};
use serde::Deserialize;

use super::{parse_json_records, run_command, run_powershell};
use crate::{consts::BYTES_PER_MB, error::CollectorError, facts::GpuInfo};

const VENDOR_INTEL: &str = "0x8086";
const VENDOR_AMD: &str = "0x1002";
const VENDOR_NVIDIA: &str = "0x10de";

pub fn collect_gpus() -> Vec<GpuInfo> {
    let nvidia = match run_command(
        "nvidia-smi",
        &["--query-gpu=name,memory.total", "--format=csv,noheader,nounits"],
    ) {
        Ok(out) => parse_nvidia_smi(&out),
        Err(e) => {
            debug!("nvidia-smi unavailable: {}", e);
            Vec::new()
        }
    };

    let platform = if cfg!(target_os = "windows") {
        run_powershell(
            "Get-CimInstance Win32_VideoController | Select-Object Name, AdapterCompatibility, AdapterRAM | ConvertTo-Json",
        )
        .and_then(|out| parse_video_controllers(&out))
    } else if cfg!(target_os = "linux") {
        read_drm_gpus(Path::new("/sys/class/drm"))
    } else {
        Err(CollectorError::Unsupported)
    };

    match platform {
        Ok(gpus) => merge_nvidia(gpus, nvidia),
        Err(e) => {
            warn!("Video card enumeration failed: {}", e);
            nvidia
        }
    }
}

/// Lines of `name, MiB` as printed by `nvidia-smi --format=csv,noheader,nounits`.
pub fn parse_nvidia_smi(text: &str) -> Vec<GpuInfo> {
    text.lines()
        .filter_map(|line| {
            let (name, memory) = line.rsplit_once(',')?;
            let mib = memory.trim().parse::<u64>().ok()?;
            Some(GpuInfo::new(
                name.trim().to_owned(),
                "NVIDIA".to_owned(),
                mib.saturating_mul(BYTES_PER_MB),
            ))
        })
        .collect()
}

#[derive(Deserialize)]
struct VideoControllerRecord {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "AdapterCompatibility")]
    adapter_compatibility: Option<String>,
    #[serde(rename = "AdapterRAM")]
    adapter_ram: Option<u64>,
}

pub fn parse_video_controllers(json: &str) -> Result<Vec<GpuInfo>, CollectorError> {
    let records: Vec<VideoControllerRecord> = parse_json_records(json)?;
    Ok(records
        .into_iter()
        .map(|record| {
            GpuInfo::new(
                record.name.unwrap_or_default(),
                record.adapter_compatibility.unwrap_or_default(),
                record.adapter_ram.unwrap_or(0),
            )
        })
        .collect())
}

/// Video cards from a sysfs `drm` directory (`cardN/device/...`).
///
/// NVIDIA cards are listed without memory here; `nvidia-smi` fills it in.
pub fn read_drm_gpus(root: &Path) -> Result<Vec<GpuInfo>, CollectorError> {
    let mut cards = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with("card") || name.contains('-') {
            continue;
        }

        let device = entry.path().join("device");
        let vendor = match fs::read_to_string(device.join("vendor")) {
            Ok(vendor) => vendor.trim().to_lowercase(),
            Err(_) => continue,
        };
        let manufacturer = match vendor.as_str() {
            VENDOR_INTEL => "Intel Corporation",
            VENDOR_AMD => "Advanced Micro Devices, Inc.",
            VENDOR_NVIDIA => "NVIDIA",
            _ => "Unknown",
        };

        let uevent = fs::read_to_string(device.join("uevent")).unwrap_or_default();
        let slot = uevent_value(&uevent, "PCI_SLOT_NAME");
        let gpu_name = slot
            .and_then(lspci_name)
            .or_else(|| {
                uevent_value(&uevent, "PCI_ID").map(|id| format!("{} GPU [{}]", manufacturer, id))
            })
            .unwrap_or_else(|| format!("{} GPU", manufacturer));

        let vram = fs::read_to_string(device.join("mem_info_vram_total"))
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);

        cards.push((name, GpuInfo::new(gpu_name, manufacturer.to_owned(), vram)));
    }

    cards.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(cards.into_iter().map(|(_, gpu)| gpu).collect())
}

fn uevent_value<'a>(uevent: &'a str, key: &str) -> Option<&'a str> {
    uevent.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        if k == key {
            Some(v.trim())
        } else {
            None
        }
    })
}

fn lspci_name(slot: &str) -> Option<String> {
    let out = run_command("lspci", &["-s", slot]).ok()?;
    parse_lspci_line(out.lines().next()?)
}

/// `03:00.0 VGA compatible controller: Advanced Micro Devices, Inc. [AMD/ATI] Navi 22 (rev c1)`
/// yields everything after the class, without the revision.
pub fn parse_lspci_line(line: &str) -> Option<String> {
    let (_, description) = line.split_once(": ")?;
    let description = match description.rfind(" (rev ") {
        Some(idx) => &description[..idx],
        None => description,
    };
    let description = description.trim();
    if description.is_empty() {
        None
    } else {
        Some(description.to_owned())
    }
}

/// Uses `nvidia-smi` memory for NVIDIA cards the platform query found, and
/// adds any it missed.
pub fn merge_nvidia(platform: Vec<GpuInfo>, nvidia: Vec<GpuInfo>) -> Vec<GpuInfo> {
    let mut nvidia = nvidia.into_iter();
    let mut merged: Vec<GpuInfo> = platform
        .into_iter()
        .map(|gpu| {
            if gpu.manufacturer.to_lowercase().contains("nvidia") {
                match nvidia.next() {
                    Some(reported) => reported,
                    None => gpu,
                }
            } else {
                gpu
            }
        })
        .collect();
    merged.extend(nvidia);
    merged
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use super::*;
    use crate::{consts::BYTES_PER_GB, facts::GpuKind};

    fn drm_card(root: &Path, card: &str, vendor: &str, pci_id: &str, vram: Option<u64>) {
        let device = root.join(card).join("device");
        fs::create_dir_all(&device).unwrap();
        fs::write(device.join("vendor"), format!("{}\n", vendor)).unwrap();
        fs::write(device.join("uevent"), format!("DRIVER=x\nPCI_ID={}\n", pci_id)).unwrap();
        if let Some(vram) = vram {
            fs::write(device.join("mem_info_vram_total"), vram.to_string()).unwrap();
        }
    }

    #[test]
    fn nvidia_smi_output_is_parsed_in_mebibytes() {
        let gpus = parse_nvidia_smi("NVIDIA GeForce RTX 3060, 12288\nNVIDIA T400, 2048\n\n");

        assert_eq!(gpus.len(), 2);
        assert_eq!(gpus[0].name, "NVIDIA GeForce RTX 3060");
        assert_eq!(gpus[0].adapter_ram_bytes, 12 * BYTES_PER_GB);
        assert_eq!(gpus[0].kind, GpuKind::Discrete);
        assert_eq!(gpus[1].adapter_ram_bytes, 2 * BYTES_PER_GB);
    }

    #[test]
    fn video_controllers_tolerate_missing_fields() {
        let gpus = parse_video_controllers(
            r#"[{"Name":"Intel(R) UHD Graphics 620","AdapterCompatibility":"Intel Corporation","AdapterRAM":1073741824},{"Name":"Microsoft Remote Display Adapter","AdapterCompatibility":null,"AdapterRAM":null}]"#,
        )
        .unwrap();

        assert_eq!(gpus.len(), 2);
        assert_eq!(gpus[0].kind, GpuKind::Integrated);
        assert_eq!(gpus[0].adapter_ram_bytes, BYTES_PER_GB);
        assert_eq!(gpus[1].manufacturer, "");
        assert_eq!(gpus[1].adapter_ram_bytes, 0);
    }

    #[test]
    fn drm_cards_are_read_and_connectors_skipped() {
        let root = tempfile::tempdir().unwrap();
        drm_card(root.path(), "card0", "0x8086", "8086:4680", None);
        drm_card(root.path(), "card1", "0x1002", "1002:73DF", Some(12 * BYTES_PER_GB));
        fs::create_dir_all(root.path().join("card1-DP-1")).unwrap();
        fs::create_dir_all(root.path().join("renderD128")).unwrap();

        let gpus = read_drm_gpus(root.path()).unwrap();

        assert_eq!(gpus.len(), 2);
        assert_eq!(gpus[0].manufacturer, "Intel Corporation");
        assert_eq!(gpus[0].name, "Intel Corporation GPU [8086:4680]");
        assert_eq!(gpus[0].adapter_ram_bytes, 0);
        assert_eq!(gpus[1].manufacturer, "Advanced Micro Devices, Inc.");
        assert_eq!(gpus[1].adapter_ram_bytes, 12 * BYTES_PER_GB);
    }

    #[test]
    fn lspci_line_drops_class_and_revision() {
        assert_eq!(
            parse_lspci_line(
                "03:00.0 VGA compatible controller: Advanced Micro Devices, Inc. [AMD/ATI] Navi 22 [Radeon RX 6700/6700 XT / 6800M] (rev c1)"
            )
            .as_deref(),
            Some("Advanced Micro Devices, Inc. [AMD/ATI] Navi 22 [Radeon RX 6700/6700 XT / 6800M]")
        );
        assert_eq!(parse_lspci_line("garbage"), None);
    }

    #[test]
    fn nvidia_memory_replaces_platform_entries() {
        let platform = vec![
            GpuInfo::new(
                "Intel(R) UHD Graphics 770".into(),
                "Intel Corporation".into(),
                BYTES_PER_GB,
            ),
            GpuInfo::new(
                "NVIDIA GeForce RTX 4080".into(),
                "NVIDIA".into(),
                4 * BYTES_PER_GB - 1,
            ),
        ];
        let nvidia = parse_nvidia_smi("NVIDIA GeForce RTX 4080, 16384");

        let merged = merge_nvidia(platform, nvidia);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].adapter_ram_bytes, 16 * BYTES_PER_GB);
    }

    #[test]
    fn nvidia_cards_missing_from_platform_are_appended() {
        let nvidia = parse_nvidia_smi("NVIDIA A100-SXM4-40GB, 40960");
        let merged = merge_nvidia(Vec::new(), nvidia);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "NVIDIA A100-SXM4-40GB");
    }
}
