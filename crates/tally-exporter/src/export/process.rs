//! Process gauges for the exporter's own process.
//!
//! Sampled once per scrape and rendered after the registered families. These
//! are not queue entries: they describe the host process at scrape time.

use std::fmt::{self, Write};
use std::sync::{Mutex, PoisonError};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// One reading of the current process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSample {
    pub cpu_seconds: f64,
    pub resident_memory_bytes: u64,
    pub virtual_memory_bytes: u64,
    /// Seconds since the Unix epoch.
    pub start_time_seconds: u64,
}

impl ProcessSample {
    /// Render as `tally_process_*` families.
    pub fn render(&self, out: &mut impl Write) -> fmt::Result {
        render_one(
            out,
            "tally_process_cpu_seconds_total",
            "Total user and system CPU time spent in seconds",
            "counter",
            self.cpu_seconds,
        )?;
        render_one(
            out,
            "tally_process_resident_memory_bytes",
            "Resident memory size in bytes",
            "gauge",
            self.resident_memory_bytes as f64,
        )?;
        render_one(
            out,
            "tally_process_virtual_memory_bytes",
            "Virtual memory size in bytes",
            "gauge",
            self.virtual_memory_bytes as f64,
        )?;
        render_one(
            out,
            "tally_process_start_time_seconds",
            "Start time of the process since unix epoch in seconds",
            "gauge",
            self.start_time_seconds as f64,
        )
    }
}

fn render_one(out: &mut impl Write, name: &str, help: &str, kind: &str, value: f64) -> fmt::Result {
    writeln!(out, "# HELP {} {}", name, help)?;
    writeln!(out, "# TYPE {} {}", name, kind)?;
    writeln!(out, "{} {}", name, value)
}

/// Samples the current process through `sysinfo`.
pub struct ProcessCollector {
    pid: Pid,
    system: Mutex<System>,
}

impl ProcessCollector {
    /// `None` when the platform cannot report the current pid.
    pub fn new() -> Option<Self> {
        match sysinfo::get_current_pid() {
            Ok(pid) => Some(Self {
                pid,
                system: Mutex::new(System::new()),
            }),
            Err(e) => {
                tracing::warn!(error = e, "process metrics unavailable");
                None
            }
        }
    }

    /// Refresh and read the current process. `None` if it could not be read.
    pub fn sample(&self) -> Option<ProcessSample> {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        let process = system.process(self.pid)?;
        Some(ProcessSample {
            cpu_seconds: process.accumulated_cpu_time() as f64 / 1000.0,
            resident_memory_bytes: process.memory(),
            virtual_memory_bytes: process.virtual_memory(),
            start_time_seconds: process.start_time(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn sample_renders_every_family() {
        let sample = ProcessSample {
            cpu_seconds: 1.5,
            resident_memory_bytes: 4096,
            virtual_memory_bytes: 8192,
            start_time_seconds: 1_700_000_000,
        };
        let mut out = String::new();
        sample.render(&mut out).unwrap();
        assert!(out.contains("# TYPE tally_process_cpu_seconds_total counter\n"));
        assert!(out.contains("tally_process_cpu_seconds_total 1.5\n"));
        assert!(out.contains("tally_process_resident_memory_bytes 4096\n"));
        assert!(out.contains("tally_process_virtual_memory_bytes 8192\n"));
        assert!(out.contains("tally_process_start_time_seconds 1700000000\n"));
    }

    #[test]
    fn current_process_is_readable() {
        let collector = ProcessCollector::new().unwrap();
        let sample = collector.sample().unwrap();
        assert!(sample.resident_memory_bytes > 0);
        assert!(sample.start_time_seconds > 0);
    }
}
