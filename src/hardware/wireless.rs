use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use futures::future::BoxFuture;
use log::{debug, warn};
use sysinfo::{NetworksExt, System, SystemExt};

use crate::error::CollectorError;

pub fn wireless_supported(sys: &System) -> bool {
    if cfg!(target_os = "linux") {
        match sysfs_has_wireless(Path::new("/sys/class/net")) {
            Ok(true) => return true,
            Ok(false) => debug!("No wireless interface in /sys/class/net"),
            Err(e) => warn!("Failed to read /sys/class/net: {}", e),
        }
    }

    sys.networks()
        .iter()
        .any(|(name, _)| interface_looks_wireless(name))
}

/// Linux marks 802.11 interfaces with a `wireless` (or `phy80211`) entry.
pub fn sysfs_has_wireless(root: &Path) -> Result<bool, CollectorError> {
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.join("wireless").exists() || path.join("phy80211").exists() {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn interface_looks_wireless(name: &str) -> bool {
    let name = name.to_lowercase();
    name.starts_with("wl")
        || ["wi-fi", "wifi", "wireless", "wlan", "802.11"]
            .iter()
            .any(|marker| name.contains(marker))
}

pub trait BleProbe {
    fn probe(&self) -> BoxFuture<'_, Result<bool, CollectorError>>;
}

pub struct SystemBleProbe {
    sysfs_root: PathBuf,
}

impl Default for SystemBleProbe {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys/class/bluetooth"),
        }
    }
}

impl BleProbe for SystemBleProbe {
    fn probe(&self) -> BoxFuture<'_, Result<bool, CollectorError>> {
        Box::pin(async move {
            if cfg!(target_os = "linux") {
                has_hci_adapter(&self.sysfs_root).await
            } else if cfg!(target_os = "windows") {
                windows_bluetooth_present().await
            } else {
                Err(CollectorError::Unsupported)
            }
        })
    }
}

/// A missing bluetooth class directory means no adapter, not an error.
pub async fn has_hci_adapter(root: &Path) -> Result<bool, CollectorError> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_string_lossy().starts_with("hci") {
            return Ok(true);
        }
    }
    Ok(false)
}

async fn windows_bluetooth_present() -> Result<bool, CollectorError> {
    let script = "(Get-PnpDevice -Class Bluetooth -PresentOnly -ErrorAction SilentlyContinue | Measure-Object).Count";
    let output = tokio::process::Command::new("powershell")
        .args(["-NoProfile", "-NonInteractive", "-Command", script])
        .output()
        .await?;

    if !output.status.success() {
        return Err(CollectorError::CommandFailed {
            command: "powershell".to_owned(),
            status: output.status.to_string(),
        });
    }

    let count = String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<u64>()
        .unwrap_or(0);
    Ok(count > 0)
}

/// Waits at most `wait` for the probe. Timeouts and probe errors become
/// `None` so the rest of the report is never held up.
pub async fn await_ble<P>(probe: &P, wait: Duration) -> Option<bool>
where
    P: BleProbe + ?Sized,
{
    match tokio::time::timeout(wait, probe.probe()).await {
        Ok(Ok(supported)) => {
            debug!("BLE probe answered: {}", supported);
            Some(supported)
        }
        Ok(Err(e)) => {
            warn!("BLE probe failed: {}", e);
            None
        }
        Err(_) => {
            warn!("BLE probe did not answer within {:?}", wait);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, time::Duration};

    use futures::future::{self, BoxFuture, FutureExt};

    use super::{
        await_ble, has_hci_adapter, interface_looks_wireless, sysfs_has_wireless, BleProbe,
    };
    use crate::error::CollectorError;

    struct FixedProbe(Result<bool, ()>);

    impl BleProbe for FixedProbe {
        fn probe(&self) -> BoxFuture<'_, Result<bool, CollectorError>> {
            let result = self.0.map_err(|_| CollectorError::Unsupported);
            future::ready(result).boxed()
        }
    }

    struct HangingProbe;

    impl BleProbe for HangingProbe {
        fn probe(&self) -> BoxFuture<'_, Result<bool, CollectorError>> {
            future::pending().boxed()
        }
    }

    #[test]
    fn wireless_interface_names_are_recognized() {
        assert!(interface_looks_wireless("wlan0"));
        assert!(interface_looks_wireless("wlp3s0"));
        assert!(interface_looks_wireless("Wi-Fi"));
        assert!(interface_looks_wireless("Wireless Network Connection"));
        assert!(!interface_looks_wireless("eth0"));
        assert!(!interface_looks_wireless("Ethernet"));
        assert!(!interface_looks_wireless("lo"));
    }

    #[test]
    fn sysfs_wireless_marker_is_detected() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("eth0")).unwrap();
        assert!(!sysfs_has_wireless(root.path()).unwrap());

        fs::create_dir_all(root.path().join("wlp2s0/wireless")).unwrap();
        assert!(sysfs_has_wireless(root.path()).unwrap());
    }

    #[tokio::test]
    async fn hci_adapter_presence_decides_ble_support() {
        let root = tempfile::tempdir().unwrap();
        assert!(!has_hci_adapter(root.path()).await.unwrap());
        assert!(!has_hci_adapter(&root.path().join("missing")).await.unwrap());

        fs::create_dir_all(root.path().join("hci0")).unwrap();
        assert!(has_hci_adapter(root.path()).await.unwrap());
    }

    #[tokio::test]
    async fn answered_probe_is_reported() {
        let wait = Duration::from_secs(1);
        assert_eq!(await_ble(&FixedProbe(Ok(true)), wait).await, Some(true));
        assert_eq!(await_ble(&FixedProbe(Ok(false)), wait).await, Some(false));
    }

    #[tokio::test]
    async fn failed_or_late_probe_is_unknown() {
        assert_eq!(
            await_ble(&FixedProbe(Err(())), Duration::from_secs(1)).await,
            None
        );
        assert_eq!(
            await_ble(&HangingProbe, Duration::from_millis(20)).await,
            None
        );
    }
}
