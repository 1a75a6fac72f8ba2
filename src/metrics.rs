use std::path::Path;
use std::thread;
use std::time::Duration;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System};
use thiserror::Error;

use crate::format::percent_of;

/// Cumulative interface byte counters, summed over all interfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub sent: u64,
    pub received: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MemoryStats {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub percent: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SwapStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VolumeUsage {
    /// Device name, e.g. `/dev/sda1` or `C:\`.
    pub device: String,
    pub mount: String,
    pub used: u64,
    pub total: u64,
    pub percent: f64,
}

/// Why a volume was left out of the storage list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VolumeError {
    #[error("{mount}: no file system")]
    Unsupported { mount: String },
    #[error("{mount}: no media")]
    Empty { mount: String },
    #[error("{mount}: permission denied")]
    PermissionDenied { mount: String },
}

/// Everything the metrics source reports for one sampling window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSample {
    pub cpu_percent: f32,
    pub per_core: Vec<f32>,
    pub cpu_frequency_mhz: Option<u64>,
    pub memory: MemoryStats,
    pub swap: SwapStats,
    pub volumes: Vec<Result<VolumeUsage, VolumeError>>,
    pub net: NetCounters,
    /// Seconds since the Unix epoch.
    pub boot_time: u64,
}

/// Operating-system metrics provider.
pub trait MetricsSource {
    /// Take a sample. CPU usage is averaged over `window`, so this blocks
    /// for roughly that long.
    fn sample(&mut self, window: Duration) -> RawSample;

    /// Current network counters, without waiting.
    fn net_counters(&mut self) -> NetCounters;

    fn host_name(&self) -> String;
}

/// [`MetricsSource`] backed by `sysinfo`.
pub struct Collector {
    sys: System,
    disks: Disks,
    networks: Networks,
    host_name: String,
}

impl Collector {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            host_name: System::host_name().unwrap_or_else(|| "unknown".into()),
        }
    }

    fn net_totals(&self) -> NetCounters {
        self.networks
            .iter()
            .fold(NetCounters::default(), |acc, (_, data)| NetCounters {
                sent: acc.sent + data.total_transmitted(),
                received: acc.received + data.total_received(),
            })
    }

    fn volumes(&mut self) -> Vec<Result<VolumeUsage, VolumeError>> {
        self.disks.refresh_list();
        self.disks
            .iter()
            .map(|d| {
                let mount = d.mount_point().to_string_lossy().to_string();
                let fs_type = d.file_system().to_string_lossy().to_string();
                classify_volume(
                    d.name().to_string_lossy().to_string(),
                    mount,
                    &fs_type,
                    d.total_space(),
                    d.available_space(),
                )
            })
            .collect()
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for Collector {
    fn sample(&mut self, window: Duration) -> RawSample {
        // usage is the delta between two refreshes
        self.sys.refresh_cpu_usage();
        thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.sys.refresh_cpu_specifics(CpuRefreshKind::everything());
        self.sys.refresh_memory();
        self.networks.refresh();

        let per_core: Vec<f32> = self.sys.cpus().iter().map(|c| c.cpu_usage()).collect();
        let cpu_percent = if per_core.is_empty() {
            0.0
        } else {
            per_core.iter().sum::<f32>() / per_core.len() as f32
        };
        let cpu_frequency_mhz = self
            .sys
            .cpus()
            .first()
            .map(|c| c.frequency())
            .filter(|&mhz| mhz > 0);

        let total = self.sys.total_memory();
        let available = self.sys.available_memory();
        let memory = MemoryStats {
            total,
            used: self.sys.used_memory(),
            available,
            percent: percent_of(total.saturating_sub(available), total),
        };
        let swap_total = self.sys.total_swap();
        let swap_used = self.sys.used_swap();
        let swap = SwapStats {
            total: swap_total,
            used: swap_used,
            free: self.sys.free_swap(),
            percent: percent_of(swap_used, swap_total),
        };

        RawSample {
            cpu_percent,
            per_core,
            cpu_frequency_mhz,
            memory,
            swap,
            volumes: self.volumes(),
            net: self.net_totals(),
            boot_time: System::boot_time(),
        }
    }

    fn net_counters(&mut self) -> NetCounters {
        self.networks.refresh();
        self.net_totals()
    }

    fn host_name(&self) -> String {
        self.host_name.clone()
    }
}

/// Decide whether a mounted volume belongs on the dashboard.
fn classify_volume(
    device: String,
    mount: String,
    fs_type: &str,
    total: u64,
    available: u64,
) -> Result<VolumeUsage, VolumeError> {
    if fs_type.is_empty() {
        return Err(VolumeError::Unsupported { mount });
    }
    if total == 0 || fs_type.eq_ignore_ascii_case("iso9660") || fs_type.eq_ignore_ascii_case("udf")
    {
        return Err(VolumeError::Empty { mount });
    }
    if let Err(e) = std::fs::metadata(Path::new(&mount)) {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            return Err(VolumeError::PermissionDenied { mount });
        }
    }
    let used = total.saturating_sub(available);
    Ok(VolumeUsage {
        device,
        mount,
        used,
        total,
        percent: percent_of(used, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_volume_usage() {
        let v = classify_volume(
            "/dev/sda1".into(),
            "/".into(),
            "ext4",
            1000,
            250,
        )
        .unwrap();
        assert_eq!(v.used, 750);
        assert!((v.percent - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_classify_volume_skips() {
        assert_eq!(
            classify_volume("x".into(), "/mnt/x".into(), "", 10, 5),
            Err(VolumeError::Unsupported { mount: "/mnt/x".into() })
        );
        assert_eq!(
            classify_volume("sr0".into(), "/media/cd".into(), "iso9660", 10, 0),
            Err(VolumeError::Empty { mount: "/media/cd".into() })
        );
        assert!(matches!(
            classify_volume("d".into(), "/mnt/d".into(), "ext4", 0, 0),
            Err(VolumeError::Empty { .. })
        ));
    }

    #[test]
    fn test_collector_reports_host() {
        let mut collector = Collector::new();
        let sample = collector.sample(Duration::from_millis(10));
        assert!(sample.cpu_percent >= 0.0);
        assert!(sample.memory.percent >= 0.0 && sample.memory.percent <= 100.0);
        assert!(!collector.host_name().is_empty());
    }
}
