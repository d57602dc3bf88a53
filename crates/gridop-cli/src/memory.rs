//! Peak-memory instrumentation for the solve window.
//!
//! The prepare+solve+export block dominates the step's memory footprint, so
//! the peak RSS is recorded around it. The guard logs when the window closes,
//! on the error path too.

use std::time::Instant;

use tracing::info;

/// Peak resident set size of this process in MiB, from `getrusage(2)`.
pub fn peak_rss_mib() -> Option<f64> {
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if ret != 0 {
        return None;
    }
    // ru_maxrss is KiB on Linux, bytes on macOS
    #[cfg(target_os = "macos")]
    let mib = usage.ru_maxrss as f64 / (1024.0 * 1024.0);
    #[cfg(not(target_os = "macos"))]
    let mib = usage.ru_maxrss as f64 / 1024.0;
    Some(mib)
}

/// Scoped measurement window; logs peak RSS and elapsed time on drop.
pub struct MemoryWindow {
    label: &'static str,
    opened: Instant,
}

impl MemoryWindow {
    pub fn open(label: &'static str) -> Self {
        Self {
            label,
            opened: Instant::now(),
        }
    }
}

impl Drop for MemoryWindow {
    fn drop(&mut self) {
        let elapsed = self.opened.elapsed();
        match peak_rss_mib() {
            Some(mib) => info!(
                "{}: peak memory usage {:.1} MiB after {:.1}s",
                self.label,
                mib,
                elapsed.as_secs_f64()
            ),
            None => info!(
                "{}: peak memory usage unavailable after {:.1}s",
                self.label,
                elapsed.as_secs_f64()
            ),
        }
    }
}
