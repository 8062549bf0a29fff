//! Best-effort GPU load sampling.
//!
//! Detection cascade:
//! 1. NVML (if the `gpu` feature is enabled), richest data for NVIDIA
//! 2. Linux: sysfs `gpu_busy_percent` (AMD, some Intel)
//! 3. nvidia-smi CLI, cached for 5s to avoid a subprocess per tick
//! 4. Windows: WMI GPU engine performance counters, cached for 3s
//!
//! Every backend is fallible and none of them is fatal; a host without an
//! enumerable GPU simply yields `None` on every call.

#[cfg(target_os = "linux")]
use std::fs;
use std::process::Command;
#[cfg(target_os = "windows")]
use std::sync::Mutex;
use std::sync::RwLock;
use std::time::Instant;

/// Load of the first enumerable GPU, in percent. `None` when no backend
/// finds a device or the query fails.
pub fn sample_gpu_percent() -> Option<f32> {
    #[cfg(feature = "gpu")]
    {
        if let Some(pct) = sample_nvml() {
            return Some(pct);
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(pct) = sample_sysfs() {
            return Some(pct);
        }
    }

    if let Some(pct) = sample_nvidia_smi() {
        return Some(pct);
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(pct) = sample_wmi() {
            return Some(pct);
        }
    }

    None
}

// ---------------------------------------------------------------------------
// NVML backend (optional, NVIDIA only)
// ---------------------------------------------------------------------------

#[cfg(feature = "gpu")]
fn sample_nvml() -> Option<f32> {
    use nvml_wrapper::Nvml;

    let nvml = Nvml::init().ok()?;
    let device = nvml.device_by_index(0).ok()?;
    let util = device.utilization_rates().ok()?;
    Some(util.gpu as f32)
}

// ---------------------------------------------------------------------------
// sysfs backend (Linux) - AMD and some Intel expose gpu_busy_percent
// ---------------------------------------------------------------------------

#[cfg(target_os = "linux")]
fn sample_sysfs() -> Option<f32> {
    let entries = fs::read_dir("/sys/class/drm").ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        // card0, card1, ... but not card0-DP-1 and friends
        if !name.starts_with("card") || name.contains('-') {
            continue;
        }
        let busy = entry.path().join("device").join("gpu_busy_percent");
        if let Ok(raw) = fs::read_to_string(&busy) {
            if let Ok(pct) = raw.trim().parse::<f32>() {
                return Some(pct);
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// nvidia-smi backend - parses CSV output from the CLI tool, cached
// ---------------------------------------------------------------------------

static SMI_CACHE: RwLock<Option<(Instant, Option<f32>)>> = RwLock::new(None);

const SMI_TTL_SECS: u64 = 5;

fn sample_nvidia_smi() -> Option<f32> {
    if let Ok(guard) = SMI_CACHE.read() {
        if let Some((ts, cached)) = *guard {
            if ts.elapsed().as_secs() < SMI_TTL_SECS {
                return cached;
            }
        }
    }

    let result = query_nvidia_smi();

    if let Ok(mut guard) = SMI_CACHE.write() {
        *guard = Some((Instant::now(), result));
    }

    result
}

fn query_nvidia_smi() -> Option<f32> {
    let output = Command::new("nvidia-smi")
        .args(["--query-gpu=utilization.gpu", "--format=csv,noheader,nounits"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_utilization(&String::from_utf8_lossy(&output.stdout))
}

/// First device's utilization from `--query-gpu=utilization.gpu` output,
/// one plain number per line.
fn parse_utilization(stdout: &str) -> Option<f32> {
    stdout.lines().next()?.trim().parse::<f32>().ok()
}

// ---------------------------------------------------------------------------
// WMI backend (Windows) - GPU engine performance counters, all vendors
// ---------------------------------------------------------------------------

#[cfg(target_os = "windows")]
static WMI_CACHE: Mutex<Option<(Instant, Option<f32>)>> = Mutex::new(None);

#[cfg(target_os = "windows")]
const WMI_TTL_SECS: u64 = 3;

/// This runs on the sampler worker thread, never on the UI thread, so a
/// synchronous WMI query cannot stall rendering or pointer handling.
#[cfg(target_os = "windows")]
fn sample_wmi() -> Option<f32> {
    if let Ok(guard) = WMI_CACHE.lock() {
        if let Some((ts, cached)) = *guard {
            if ts.elapsed().as_secs() < WMI_TTL_SECS {
                return cached;
            }
        }
    }

    let result = query_wmi_utilization();

    if let Ok(mut guard) = WMI_CACHE.lock() {
        *guard = Some((Instant::now(), result));
    }

    result
}

#[cfg(target_os = "windows")]
fn query_wmi_utilization() -> Option<f32> {
    use std::collections::HashMap;
    use wmi::{COMLibrary, Variant, WMIConnection};

    // without_security() because CoInitializeSecurity is process-wide and
    // the windowing stack may have already called it.
    let com_lib = COMLibrary::without_security().ok()?;
    let con = WMIConnection::new(com_lib).ok()?;

    // Sum all 3D engine utilization percentages (Win10 1709+).
    let rows = con
        .raw_query::<HashMap<String, Variant>>(
            "SELECT UtilizationPercentage FROM \
             Win32_PerfFormattedData_GPUPerformanceCounters_GPUEngine \
             WHERE Name LIKE '%engtype_3D'",
        )
        .ok()?;
    if rows.is_empty() {
        return None;
    }

    let total: f64 = rows
        .iter()
        .filter_map(|row| match row.get("UtilizationPercentage") {
            Some(Variant::UI8(v)) => Some(*v as f64),
            Some(Variant::UI4(v)) => Some(*v as f64),
            Some(Variant::UI2(v)) => Some(*v as f64),
            Some(Variant::R8(v)) => Some(*v),
            Some(Variant::R4(v)) => Some(*v as f64),
            Some(Variant::String(s)) => s.parse::<f64>().ok(),
            _ => None,
        })
        .sum();

    Some(total.min(100.0) as f32)
}
