use std::path::Path;
use std::sync::Mutex;

use sysinfo::{CpuExt, DiskExt, ProcessExt, System, SystemExt};
use tracing::debug;

use super::types::{ProcessInfo, SystemSnapshot, UsageFigure};

/// Read-only view of host resource usage.
pub trait SystemProbe: Send + Sync {
    fn snapshot(&self) -> Result<SystemSnapshot, String>;
    /// Busiest processes first.
    fn top_processes(&self, limit: usize) -> Result<Vec<ProcessInfo>, String>;
}

/// `sysinfo`-backed probe. CPU figures need two refreshes separated by the
/// library's minimum interval, so both calls block briefly.
pub struct SysinfoProbe {
    sys: Mutex<System>,
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
        }
    }
}

impl SystemProbe for SysinfoProbe {
    fn snapshot(&self) -> Result<SystemSnapshot, String> {
        let mut sys = self.sys.lock().map_err(|_| "telemetry lock error".to_string())?;
        sys.refresh_cpu();
        std::thread::sleep(System::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu();
        sys.refresh_memory();
        sys.refresh_disks_list();
        sys.refresh_disks();

        let cpu_percent = sys.global_cpu_info().cpu_usage();
        let memory = UsageFigure {
            used: sys.used_memory(),
            total: sys.total_memory(),
        };

        let root = Path::new("/");
        let disk = match sys.disks().iter().find(|disk| disk.mount_point() == root) {
            Some(disk) => UsageFigure {
                used: disk.total_space().saturating_sub(disk.available_space()),
                total: disk.total_space(),
            },
            None => sys.disks().iter().fold(UsageFigure { used: 0, total: 0 }, |acc, disk| {
                UsageFigure {
                    used: acc.used + disk.total_space().saturating_sub(disk.available_space()),
                    total: acc.total + disk.total_space(),
                }
            }),
        };

        debug!(cpu = cpu_percent, "system snapshot taken");
        Ok(SystemSnapshot {
            cpu_percent,
            memory,
            disk,
        })
    }

    fn top_processes(&self, limit: usize) -> Result<Vec<ProcessInfo>, String> {
        let mut sys = self.sys.lock().map_err(|_| "telemetry lock error".to_string())?;
        sys.refresh_memory();
        sys.refresh_processes();
        std::thread::sleep(System::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_processes();

        let total_memory = sys.total_memory().max(1) as f64;
        let mut processes: Vec<ProcessInfo> = sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessInfo {
                pid: pid.to_string(),
                name: process.name().to_string(),
                cpu_percent: process.cpu_usage(),
                memory_percent: (process.memory() as f64 / total_memory * 100.0) as f32,
            })
            .collect();
        processes.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
        processes.truncate(limit);
        Ok(processes)
    }
}
