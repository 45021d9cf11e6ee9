//! Host metrics sampler used by the dashboard gauges.

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

/// One fresh reading of host utilization. Recomputed every tick,
/// never carried over from the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostMetrics {
    /// 0-100, short-window average.
    pub cpu_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
}

impl HostMetrics {
    /// Neutral reading shown when the metrics provider cannot answer.
    pub fn zeroed() -> Self {
        Self {
            cpu_percent: 0.0,
            memory_used_bytes: 0,
            memory_total_bytes: 0,
        }
    }

    pub fn memory_percent(&self) -> f32 {
        if self.memory_total_bytes == 0 {
            0.0
        } else {
            (self.memory_used_bytes as f64 / self.memory_total_bytes as f64 * 100.0) as f32
        }
    }
}

/// Maintains a reusable `sysinfo::System` so CPU deltas have a stable
/// baseline across ticks.
pub struct SystemMonitor {
    sys: System,
}

impl SystemMonitor {
    pub fn new() -> Self {
        let mut sys = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        // Initial refresh so the first sample is not a zero-delta artifact.
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        Self { sys }
    }

    /// Refresh and return a snapshot. Must never fail or block past the
    /// tick; unreadable values degrade to zero.
    pub fn sample(&mut self) -> HostMetrics {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();

        let cpu_percent = self.sys.global_cpu_usage();
        let metrics = HostMetrics {
            cpu_percent: if cpu_percent.is_finite() {
                cpu_percent.clamp(0.0, 100.0)
            } else {
                0.0
            },
            memory_used_bytes: self.sys.used_memory(),
            memory_total_bytes: self.sys.total_memory(),
        };

        if metrics.memory_total_bytes == 0 {
            // Provider gave us nothing usable; show neutral gauges.
            return HostMetrics::zeroed();
        }
        metrics
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_metrics_without_nan() {
        let mut monitor = SystemMonitor::new();
        let metrics = monitor.sample();

        assert!(metrics.cpu_percent.is_finite());
        assert!((0.0..=100.0).contains(&metrics.cpu_percent));
        assert!(metrics.memory_used_bytes <= metrics.memory_total_bytes);
    }

    #[test]
    fn zeroed_reading_renders_zero_gauges() {
        let metrics = HostMetrics::zeroed();
        assert_eq!(metrics.cpu_percent, 0.0);
        assert_eq!(metrics.memory_percent(), 0.0);
    }
}
