//! Device snapshot collection
//!
//! Produces the `deviceInfo` record sent with every registration and
//! heartbeat call. A snapshot is collected fresh for each call so memory,
//! disk and battery readings reflect the moment of sending.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sysinfo::{Disks, System};

/// User agent reported when only the minimal attribute set is available
pub const FALLBACK_USER_AGENT: &str = "Janction Mobile";

/// Screen metrics supplied by the host shell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

impl Default for ScreenInfo {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            scale: 1.0,
        }
    }
}

impl ScreenInfo {
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Flat record of device attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    // Always present
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    pub screen_resolution: String,
    pub screen_scale: f64,
    pub timezone: String,

    // Extended attributes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_disk_capacity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_disk_storage: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,

    /// Only set on the minimal snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl DeviceSnapshot {
    /// Minimal attribute set used when extended collection is unavailable
    pub fn minimal(screen: &ScreenInfo) -> Self {
        Self {
            platform: platform_name().to_string(),
            platform_version: System::os_version(),
            screen_resolution: screen.resolution(),
            screen_scale: screen.scale,
            timezone: local_timezone(),
            device_model: None,
            system_name: None,
            system_version: None,
            kernel_version: None,
            device_id: None,
            unique_id: None,
            locale: None,
            cpu_count: None,
            total_memory: None,
            used_memory: None,
            total_disk_capacity: None,
            free_disk_storage: None,
            battery_level: None,
            user_agent: Some(FALLBACK_USER_AGENT.to_string()),
        }
    }

    /// Whether only the minimal attribute set was collected
    pub fn is_minimal(&self) -> bool {
        self.user_agent.is_some()
    }
}

/// Source of device snapshots
#[trait_variant::make(DeviceInfoSource: Send)]
pub trait LocalDeviceInfoSource {
    /// Collect a fresh snapshot; degrades to the minimal set instead of failing
    async fn snapshot(&self) -> DeviceSnapshot;
}

/// Reads the battery level (0.0 - 1.0) from the host, if it has one
pub type BatteryReader = fn() -> Option<f64>;

/// Device snapshot source backed by `sysinfo`
#[derive(Debug, Clone, Default)]
pub struct SystemDeviceInfo {
    screen: ScreenInfo,
    battery: Option<BatteryReader>,
}

impl SystemDeviceInfo {
    pub fn new(screen: ScreenInfo) -> Self {
        Self {
            screen,
            battery: None,
        }
    }

    pub fn with_battery_reader(mut self, reader: BatteryReader) -> Self {
        self.battery = Some(reader);
        self
    }

    /// Collect the full attribute set (blocking)
    fn collect_extended(screen: ScreenInfo, battery: Option<BatteryReader>) -> Result<DeviceSnapshot, String> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err("sysinfo does not support this platform".to_string());
        }

        let mut sys = System::new();
        sys.refresh_memory();

        let total_memory = sys.total_memory();
        if total_memory == 0 {
            return Err("memory information unavailable".to_string());
        }

        let disks = Disks::new_with_refreshed_list();
        let (total_disk, free_disk) = disks.list().iter().fold((0u64, 0u64), |(t, f), d| {
            (t + d.total_space(), f + d.available_space())
        });

        let host_name = System::host_name();
        let system_name = System::name();

        let mut snapshot = DeviceSnapshot::minimal(&screen);
        snapshot.user_agent = None;
        snapshot.device_model = System::long_os_version();
        snapshot.unique_id = Some(unique_device_id(
            host_name.as_deref().unwrap_or_default(),
            system_name.as_deref().unwrap_or_default(),
        ));
        snapshot.system_name = system_name;
        snapshot.system_version = System::os_version();
        snapshot.kernel_version = System::kernel_version();
        snapshot.device_id = host_name;
        snapshot.locale = std::env::var("LANG").ok().filter(|l| !l.is_empty());
        snapshot.cpu_count = Some(num_cpus::get() as u32);
        snapshot.total_memory = Some(total_memory);
        snapshot.used_memory = Some(sys.used_memory());
        snapshot.total_disk_capacity = Some(total_disk);
        snapshot.free_disk_storage = Some(free_disk);
        snapshot.battery_level = battery.and_then(|read| read());

        Ok(snapshot)
    }
}

impl DeviceInfoSource for SystemDeviceInfo {
    async fn snapshot(&self) -> DeviceSnapshot {
        let screen = self.screen;
        let battery = self.battery;

        let collected =
            tokio::task::spawn_blocking(move || Self::collect_extended(screen, battery)).await;

        match collected {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                log::warn!("Failed to collect device info, using basic info: {}", e);
                DeviceSnapshot::minimal(&screen)
            }
            Err(e) => {
                log::warn!("Device info task failed, using basic info: {}", e);
                DeviceSnapshot::minimal(&screen)
            }
        }
    }
}

/// Platform name as reported to the backend
pub fn platform_name() -> &'static str {
    std::env::consts::OS
}

/// Local UTC offset, e.g. "+08:00"
pub fn local_timezone() -> String {
    chrono::Local::now().offset().to_string()
}

/// Stable identifier derived from host attributes (lowercase hex SHA256)
pub fn unique_device_id(host_name: &str, system_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(host_name.as_bytes());
    hasher.update(b"|");
    hasher.update(system_name.as_bytes());
    hasher.update(b"|");
    hasher.update(std::env::consts::ARCH.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_snapshot_fields() {
        let screen = ScreenInfo {
            width: 1080,
            height: 2400,
            scale: 2.75,
        };
        let snapshot = DeviceSnapshot::minimal(&screen);
        assert!(snapshot.is_minimal());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["screenResolution"], "1080x2400");
        assert_eq!(json["screenScale"], 2.75);
        assert_eq!(json["userAgent"], FALLBACK_USER_AGENT);
        assert_eq!(json["platform"], std::env::consts::OS);
        assert!(json.get("totalMemory").is_none());
        assert!(json.get("batteryLevel").is_none());
    }

    #[test]
    fn test_unique_id_is_stable() {
        let a = unique_device_id("pixel-7", "Android");
        let b = unique_device_id("pixel-7", "Android");
        let c = unique_device_id("pixel-8", "Android");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_system_snapshot_never_fails() {
        fn full_battery() -> Option<f64> {
            Some(1.0)
        }

        let source = SystemDeviceInfo::new(ScreenInfo::default()).with_battery_reader(full_battery);
        let snapshot = DeviceInfoSource::snapshot(&source).await;

        assert_eq!(snapshot.platform, std::env::consts::OS);
        assert_eq!(snapshot.screen_resolution, "0x0");
        if !snapshot.is_minimal() {
            assert!(snapshot.total_memory.unwrap_or(0) > 0);
            assert_eq!(snapshot.battery_level, Some(1.0));
        }
    }
}
