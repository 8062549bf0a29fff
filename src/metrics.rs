use std::path::Path;
use std::sync::mpsc::{self, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System};

/// Minimum time between refreshes of the slow metrics (battery, network).
pub const SLOW_REFRESH: Duration = Duration::from_secs(60);

const MIB: f64 = 1_048_576.0;

/// The latest known value for each displayed metric.
///
/// Created once with the optional sensors absent, then overwritten field by
/// field for the life of the sampler. Battery and network keep their last
/// value between refreshes of their 60s cadence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disk_percent: f32,
    /// `None` until a battery sensor reports a charge.
    pub battery_percent: Option<f32>,
    pub upload_mb_per_s: f64,
    pub download_mb_per_s: f64,
    /// `None` when no GPU is enumerable or the query failed this tick.
    pub gpu_percent: Option<f32>,
}

/// A cadence limiter: lets a refresh through at most once per interval.
/// A gate that has never fired is due.
#[derive(Debug)]
struct Gate {
    last: Option<Instant>,
    every: Duration,
}

impl Gate {
    fn new(every: Duration) -> Self {
        Self { last: None, every }
    }

    fn due(&self, now: Instant) -> bool {
        self.last
            .map_or(true, |last| now.saturating_duration_since(last) >= self.every)
    }

    fn fire(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

/// Queries the operating system for resource usage and maintains the
/// snapshot. CPU, memory, disk and GPU are recomputed on every call;
/// battery and network sit behind independent 60-second gates.
pub struct Sampler {
    sys: System,
    disks: Disks,
    networks: Networks,
    batteries: Option<battery::Manager>,
    battery_gate: Gate,
    network_gate: Gate,
    snapshot: Snapshot,
}

impl Sampler {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let batteries = match battery::Manager::new() {
            Ok(manager) => Some(manager),
            Err(e) => {
                eprintln!("[limpet] Battery manager unavailable: {e}");
                None
            }
        };

        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            batteries,
            battery_gate: Gate::new(SLOW_REFRESH),
            network_gate: Gate::new(SLOW_REFRESH),
            snapshot: Snapshot::default(),
        }
    }

    /// Take a sample at `now` and return the updated snapshot.
    ///
    /// A failure in any one metric leaves that field absent or unchanged
    /// and never aborts sampling of the others.
    pub fn sample(&mut self, now: Instant) -> Snapshot {
        // Only refresh what the overlay actually displays.
        self.sys.refresh_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::new().with_cpu_usage())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );

        let cpus = self.sys.cpus();
        if !cpus.is_empty() {
            self.snapshot.cpu_percent =
                cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32;
        }

        let total_mem = self.sys.total_memory();
        if total_mem > 0 {
            self.snapshot.memory_percent =
                self.sys.used_memory() as f32 / total_mem as f32 * 100.0;
        }

        self.disks.refresh();
        if let Some(pct) = primary_disk_percent(&self.disks) {
            self.snapshot.disk_percent = pct;
        }

        if self.battery_gate.due(now) {
            // The gate only fires on a successful read, so a missing or
            // erroring sensor is retried on the next tick.
            if let Some(pct) = self.batteries.as_ref().and_then(read_battery_percent) {
                self.snapshot.battery_percent = Some(pct);
                self.battery_gate.fire(now);
            }
        }

        if self.network_gate.due(now) {
            self.networks.refresh();
            let (mut tx, mut rx) = (0u64, 0u64);
            for (_name, data) in self.networks.iter() {
                tx = tx.saturating_add(data.total_transmitted());
                rx = rx.saturating_add(data.total_received());
            }
            // Cumulative totals since boot divided by 1 MiB. No division
            // by elapsed time happens here, so these are running totals in
            // MiB rather than true rates, despite the MB/s label.
            self.snapshot.upload_mb_per_s = mib(tx);
            self.snapshot.download_mb_per_s = mib(rx);
            self.network_gate.fire(now);
        }

        self.snapshot.gpu_percent = crate::gpu::sample_gpu_percent();

        self.snapshot.clone()
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / MIB
}

/// Usage of the root filesystem, falling back to the first enumerated disk
/// on platforms without a "/" mount. `None` when nothing is enumerable.
fn primary_disk_percent(disks: &Disks) -> Option<f32> {
    let disk = disks
        .iter()
        .find(|d| d.mount_point() == Path::new("/"))
        .or_else(|| disks.iter().next())?;
    let total = disk.total_space();
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(disk.available_space());
    Some(used as f32 / total as f32 * 100.0)
}

fn read_battery_percent(manager: &battery::Manager) -> Option<f32> {
    let mut batteries = manager.batteries().ok()?;
    let first = batteries.next()?.ok()?;
    Some(first.state_of_charge().get::<battery::units::ratio::percent>())
}

/// Handle to the sampling worker thread.
///
/// The worker owns the `Sampler`; the presentation thread sends one request
/// per tick and polls the latest completed snapshot. The request channel
/// holds at most one entry, so a slow OS call makes overlapping ticks drop
/// their request instead of piling up workers.
pub struct SamplerHandle {
    latest: Arc<Mutex<Snapshot>>,
    requests: SyncSender<Instant>,
}

impl SamplerHandle {
    pub fn spawn() -> Self {
        let latest = Arc::new(Mutex::new(Snapshot::default()));
        let shared = Arc::clone(&latest);
        let (requests, receiver) = mpsc::sync_channel::<Instant>(1);

        thread::spawn(move || {
            let mut sampler = Sampler::new();
            while let Ok(now) = receiver.recv() {
                let snap = sampler.sample(now);
                if let Ok(mut guard) = shared.lock() {
                    *guard = snap;
                }
            }
        });

        Self { latest, requests }
    }

    /// Ask the worker for a fresh sample. Returns immediately; the request
    /// is dropped when the previous one is still being serviced.
    pub fn request(&self, now: Instant) {
        let _ = self.requests.try_send(now);
    }

    /// The latest completed snapshot. Never blocks on an in-flight sample.
    pub fn latest(&self) -> Snapshot {
        self.latest
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_due_before_first_fire() {
        let gate = Gate::new(SLOW_REFRESH);
        assert!(gate.due(Instant::now()));
    }

    #[test]
    fn test_gate_holds_until_interval_elapses() {
        let mut gate = Gate::new(SLOW_REFRESH);
        let t0 = Instant::now();
        gate.fire(t0);
        assert!(!gate.due(t0));
        assert!(!gate.due(t0 + Duration::from_secs(59)));
        assert!(gate.due(t0 + Duration::from_secs(60)));
        assert!(gate.due(t0 + Duration::from_secs(61)));
    }

    #[test]
    fn test_gate_refires_each_interval() {
        let mut gate = Gate::new(SLOW_REFRESH);
        let t0 = Instant::now();
        gate.fire(t0);
        let t1 = t0 + Duration::from_secs(60);
        assert!(gate.due(t1));
        gate.fire(t1);
        assert!(!gate.due(t1 + Duration::from_secs(59)));
        assert!(gate.due(t1 + Duration::from_secs(60)));
    }

    #[test]
    fn test_snapshot_starts_with_sensors_absent() {
        let snap = Snapshot::default();
        assert!(snap.battery_percent.is_none());
        assert!(snap.gpu_percent.is_none());
        assert_eq!(snap.upload_mb_per_s, 0.0);
        assert_eq!(snap.download_mb_per_s, 0.0);
    }

    #[test]
    fn test_network_totals_are_mib_not_rates() {
        // Pinned: cumulative bytes divided by 1 MiB, nothing else.
        assert_eq!(mib(0), 0.0);
        assert_eq!(mib(1_048_576), 1.0);
        assert_eq!(mib(3 * 1_048_576), 3.0);
        assert_eq!(mib(524_288), 0.5);
    }

    #[test]
    fn test_sample_refreshes_fast_metrics_every_call() {
        let mut sampler = Sampler::new();
        sampler.snapshot.cpu_percent = -1.0;
        sampler.snapshot.memory_percent = -1.0;
        let snap = sampler.sample(Instant::now());
        assert!(snap.cpu_percent >= 0.0);
        assert!(snap.memory_percent >= 0.0);
    }

    #[test]
    fn test_first_sample_fires_network_gate() {
        let mut sampler = Sampler::new();
        let t0 = Instant::now();
        sampler.sample(t0);
        assert_eq!(sampler.network_gate.last, Some(t0));
    }

    #[test]
    fn test_slow_metrics_hold_between_refreshes() {
        let mut sampler = Sampler::new();
        let t0 = Instant::now();
        let first = sampler.sample(t0);
        let net_stamp = sampler.network_gate.last;
        let battery_stamp = sampler.battery_gate.last;

        let second = sampler.sample(t0 + Duration::from_secs(1));
        assert_eq!(second.upload_mb_per_s, first.upload_mb_per_s);
        assert_eq!(second.download_mb_per_s, first.download_mb_per_s);
        assert_eq!(second.battery_percent, first.battery_percent);
        assert_eq!(sampler.network_gate.last, net_stamp);
        assert_eq!(sampler.battery_gate.last, battery_stamp);

        let third = sampler.sample(t0 + Duration::from_secs(59));
        assert_eq!(third.upload_mb_per_s, first.upload_mb_per_s);
        assert_eq!(sampler.network_gate.last, net_stamp);
    }

    #[test]
    fn test_slow_metrics_refresh_once_interval_elapses() {
        let mut sampler = Sampler::new();
        let t0 = Instant::now();
        let first = sampler.sample(t0);

        let t1 = t0 + Duration::from_secs(60);
        sampler.sample(t1);
        assert_eq!(sampler.network_gate.last, Some(t1));
        if first.battery_percent.is_some() {
            assert_eq!(sampler.battery_gate.last, Some(t1));
        }
    }

    #[test]
    fn test_missing_gpu_never_aborts_sampling() {
        let mut sampler = Sampler::new();
        let snap = sampler.sample(Instant::now());
        // With no GPU the field is simply absent; sampling carried on.
        if let Some(pct) = snap.gpu_percent {
            assert!(pct >= 0.0);
        }
    }

    #[test]
    fn test_requests_never_block_the_caller() {
        let handle = SamplerHandle::spawn();
        for _ in 0..10 {
            handle.request(Instant::now());
        }
        let _ = handle.latest();
    }
}
