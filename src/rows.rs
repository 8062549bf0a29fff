use crate::metrics::Snapshot;

/// Fixed overlay width in logical pixels.
pub const OVERLAY_WIDTH: f32 = 222.0;
/// Height of a single metric row.
pub const ROW_HEIGHT: f32 = 26.0;
/// Vertical padding added below the last row.
pub const VERTICAL_PADDING: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Cpu,
    Memory,
    Disk,
    Upload,
    Download,
    Battery,
    Gpu,
}

/// Display order of the overlay, fixed at compile time. A metric whose
/// value is absent skips its row; the ones below move up.
pub const ROWS: &[(Metric, u8)] = &[
    (Metric::Cpu, 1),
    (Metric::Memory, 2),
    (Metric::Disk, 3),
    (Metric::Upload, 4),
    (Metric::Download, 5),
    (Metric::Battery, 6),
    (Metric::Gpu, 7),
];

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Metric::Cpu => "CPU:",
            Metric::Memory => "Memory:",
            Metric::Disk => "Disk:",
            Metric::Upload => "Upload:",
            Metric::Download => "Download:",
            Metric::Battery => "Battery:",
            Metric::Gpu => "GPU:",
        }
    }

    /// Render this metric's current value, or `None` when the snapshot has
    /// nothing to show for it.
    pub fn value(self, snap: &Snapshot) -> Option<String> {
        match self {
            Metric::Cpu => Some(format!("{:02.0}%", snap.cpu_percent)),
            Metric::Memory => Some(format!("{:02.0}%", snap.memory_percent)),
            Metric::Disk => Some(format!("{:02.0}%", snap.disk_percent)),
            Metric::Upload => Some(format!("{:03.1} MB/s", snap.upload_mb_per_s)),
            Metric::Download => Some(format!("{:03.1} MB/s", snap.download_mb_per_s)),
            Metric::Battery => snap.battery_percent.map(|p| format!("{p:02.0}%")),
            Metric::Gpu => snap.gpu_percent.map(|p| format!("{p:05.2}%")),
        }
    }
}

/// The rows the overlay currently renders, in table order.
pub fn visible_rows(snap: &Snapshot) -> Vec<(Metric, String)> {
    ROWS.iter()
        .filter_map(|&(metric, _)| metric.value(snap).map(|v| (metric, v)))
        .collect()
}

/// Window height derived from the rendered row count.
pub fn window_height(rows: usize) -> f32 {
    rows as f32 * ROW_HEIGHT + VERTICAL_PADDING
}
