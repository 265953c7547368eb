use std::{collections::HashSet, fs, path::Path};

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use sysinfo::{DiskExt, DiskType, System, SystemExt};

use super::{parse_json_records, run_powershell};
use crate::{
    error::CollectorError,
    facts::{DiskMediaInfo, DriveInfo},
};

const SECTOR_SIZE: u64 = 512;
const VIRTUAL_BLOCK_DEVICES: [&str; 7] = ["loop", "ram", "zram", "dm-", "md", "sr", "fd"];

pub fn collect_drives(sys: &System) -> Vec<DriveInfo> {
    if cfg!(target_os = "linux") {
        match read_block_devices(Path::new("/sys/block")) {
            Ok(drives) if !drives.is_empty() => return drives,
            Ok(_) => debug!("No physical block devices in /sys/block"),
            Err(e) => warn!("Failed to read /sys/block: {}", e),
        }
    }

    sys.disks()
        .iter()
        .map(|disk| DriveInfo {
            model: disk.name().to_string_lossy().into_owned(),
            description: disk_type_name(disk.type_()).to_owned(),
            size_bytes: disk.total_space(),
        })
        .collect()
}

/// Physical drives from a sysfs `block` directory, sorted by device name.
pub fn read_block_devices(root: &Path) -> Result<Vec<DriveInfo>, CollectorError> {
    let mut devices = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if VIRTUAL_BLOCK_DEVICES
            .iter()
            .any(|prefix| name.starts_with(prefix))
        {
            continue;
        }

        let path = entry.path();
        let sectors = read_trimmed(&path.join("size"))
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        if sectors == 0 {
            continue;
        }

        let model = read_trimmed(&path.join("device/model"))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| name.clone());
        let rotational = read_trimmed(&path.join("queue/rotational")).as_deref() == Some("1");
        let description = match (rotational, name.starts_with("nvme")) {
            (true, _) => "HDD",
            (false, true) => "NVMe SSD",
            (false, false) => "SSD",
        };

        devices.push((
            name,
            DriveInfo {
                model,
                description: description.to_owned(),
                size_bytes: sectors.saturating_mul(SECTOR_SIZE),
            },
        ));
    }

    devices.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(devices.into_iter().map(|(_, drive)| drive).collect())
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_owned())
}

fn disk_type_name(kind: DiskType) -> &'static str {
    match kind {
        DiskType::SSD => "SSD",
        DiskType::HDD => "HDD",
        DiskType::Unknown(_) => "Unspecified",
    }
}

pub fn collect_disk_media(sys: &System) -> Vec<DiskMediaInfo> {
    if cfg!(target_os = "windows") {
        let script = "Get-PhysicalDisk | Select-Object DeviceId, MediaType | ConvertTo-Json";
        match run_powershell(script).and_then(|out| parse_physical_disks(&out)) {
            Ok(media) => return media,
            Err(e) => warn!("Get-PhysicalDisk failed: {}", e),
        }
    }

    let mut seen = HashSet::new();
    sys.disks()
        .iter()
        .filter(|disk| seen.insert(disk.name().to_owned()))
        .map(|disk| DiskMediaInfo {
            device_id: disk.name().to_string_lossy().into_owned(),
            media_type: disk_type_name(disk.type_()).to_owned(),
        })
        .collect()
}

#[derive(Deserialize)]
struct PhysicalDiskRecord {
    #[serde(rename = "DeviceId")]
    device_id: Option<Value>,
    #[serde(rename = "MediaType")]
    media_type: Option<Value>,
}

/// `MediaType` comes through either as its display name or as the
/// MSFT_PhysicalDisk numeric code depending on the PowerShell version.
pub fn parse_physical_disks(json: &str) -> Result<Vec<DiskMediaInfo>, CollectorError> {
    let records: Vec<PhysicalDiskRecord> = parse_json_records(json)?;
    Ok(records
        .into_iter()
        .map(|record| DiskMediaInfo {
            device_id: record.device_id.map(value_to_string).unwrap_or_default(),
            media_type: match record.media_type {
                Some(Value::Number(code)) => match code.as_u64() {
                    Some(3) => "HDD".to_owned(),
                    Some(4) => "SSD".to_owned(),
                    Some(5) => "SCM".to_owned(),
                    _ => "Unspecified".to_owned(),
                },
                Some(other) => value_to_string(other),
                None => "Unspecified".to_owned(),
            },
        })
        .collect())
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Free bytes summed over disks that report a size, counting each device
/// once even when it is mounted at several places.
pub fn total_free_space(sys: &System) -> u64 {
    let mut seen = HashSet::new();
    sys.disks()
        .iter()
        .filter(|disk| disk.total_space() > 0)
        .filter(|disk| seen.insert(disk.name().to_owned()))
        .map(|disk| disk.available_space())
        .fold(0u64, |total, free| total.saturating_add(free))
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use super::{parse_physical_disks, read_block_devices};
    use crate::consts::BYTES_PER_GB;

    fn block_device(root: &Path, name: &str, sectors: u64, model: &str, rotational: &str) {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("device")).unwrap();
        fs::create_dir_all(dir.join("queue")).unwrap();
        fs::write(dir.join("size"), format!("{}\n", sectors)).unwrap();
        fs::write(dir.join("device/model"), format!("{}   \n", model)).unwrap();
        fs::write(dir.join("queue/rotational"), format!("{}\n", rotational)).unwrap();
    }

    #[test]
    fn block_devices_are_read_and_virtual_ones_skipped() {
        let root = tempfile::tempdir().unwrap();
        block_device(root.path(), "sda", 2 * 1024 * 1024 * 1024, "WDC WD10EZEX", "1");
        block_device(root.path(), "nvme0n1", 1024 * 1024 * 1024, "Samsung SSD 980", "0");
        block_device(root.path(), "loop0", 1000, "", "0");
        block_device(root.path(), "zram0", 1000, "", "0");
        block_device(root.path(), "sdb", 0, "Card Reader", "0");

        let drives = read_block_devices(root.path()).unwrap();

        assert_eq!(drives.len(), 2);
        assert_eq!(drives[0].model, "Samsung SSD 980");
        assert_eq!(drives[0].description, "NVMe SSD");
        assert_eq!(drives[0].size_bytes, 512 * BYTES_PER_GB);
        assert_eq!(drives[1].model, "WDC WD10EZEX");
        assert_eq!(drives[1].description, "HDD");
        assert_eq!(drives[1].size_bytes, 1024 * BYTES_PER_GB);
    }

    #[test]
    fn block_device_without_model_uses_its_name() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("vda");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("size"), "41943040").unwrap();

        let drives = read_block_devices(root.path()).unwrap();
        assert_eq!(drives.len(), 1);
        assert_eq!(drives[0].model, "vda");
        assert_eq!(drives[0].description, "SSD");
    }

    #[test]
    fn missing_sysfs_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(read_block_devices(&root.path().join("missing")).is_err());
    }

    #[test]
    fn physical_disks_accept_names_and_codes() {
        let media = parse_physical_disks(
            r#"[{"DeviceId":"0","MediaType":"SSD"},{"DeviceId":"1","MediaType":3},{"DeviceId":"2","MediaType":null}]"#,
        )
        .unwrap();

        let pairs: Vec<(&str, &str)> = media
            .iter()
            .map(|m| (m.device_id.as_str(), m.media_type.as_str()))
            .collect();
        assert_eq!(pairs, vec![("0", "SSD"), ("1", "HDD"), ("2", "Unspecified")]);
    }

    #[test]
    fn single_physical_disk_object_is_accepted() {
        let media = parse_physical_disks(r#"{"DeviceId":0,"MediaType":4}"#).unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].device_id, "0");
        assert_eq!(media[0].media_type, "SSD");
    }
}
