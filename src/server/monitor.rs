//! Server monitoring and traffic counters

use colored::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Idle detection threshold - time without traffic before marking as idle (milliseconds).
///
/// This threshold balances responsiveness with avoiding false positives
/// between chunks of a slow client.
const IDLE_THRESHOLD_MS: u64 = 150;

/// Blink interval for the activity indicator (milliseconds).
///
/// Controls how fast the indicator blinks while bytes are flowing. A value
/// of 200ms provides visible feedback without being distracting.
const BLINK_INTERVAL_MS: u64 = 200;

/// Monitor for tracking connection and traffic statistics with minimal
/// performance impact.
///
/// Uses atomic counters for lock-free updates and renders the status line
/// periodically in a background thread, so the blocking accept/relay loop
/// never waits on the display. The display thread serves no traffic; the
/// one-connection-at-a-time invariant is untouched.
pub struct ServerMonitor {
    connections: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
    bytes_echoed: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
    start_time: Instant,
    update_interval: Duration,
}

impl ServerMonitor {
    /// Create a new server monitor with the specified update interval.
    ///
    /// # Arguments
    ///
    /// * `update_interval_ms` - Display update interval in milliseconds
    pub fn new(update_interval_ms: u64) -> Self {
        Self {
            connections: Arc::new(AtomicU64::new(0)),
            bytes_received: Arc::new(AtomicU64::new(0)),
            bytes_echoed: Arc::new(AtomicU64::new(0)),
            errors: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
            update_interval: Duration::from_millis(update_interval_ms),
        }
    }

    /// Get counters for use in the serving loop.
    ///
    /// Returns a clone of the atomic counters that can be updated from the
    /// accept/relay loop without blocking.
    pub fn counters(&self) -> ServerCounters {
        ServerCounters {
            connections: Arc::clone(&self.connections),
            bytes_received: Arc::clone(&self.bytes_received),
            bytes_echoed: Arc::clone(&self.bytes_echoed),
            errors: Arc::clone(&self.errors),
        }
    }

    /// Start the background display thread.
    ///
    /// This spawns a separate thread that periodically redraws the status
    /// line. The serving loop only does atomic counter updates, which are
    /// lock-free and take nanoseconds.
    pub fn start_display(&self) {
        let connections = Arc::clone(&self.connections);
        let bytes_received = Arc::clone(&self.bytes_received);
        let bytes_echoed = Arc::clone(&self.bytes_echoed);
        let errors = Arc::clone(&self.errors);
        let update_interval = self.update_interval;

        thread::spawn(move || {
            let mut last_received = 0u64;
            let mut last_traffic_time = Instant::now();
            let mut blink_state = false;
            let mut last_blink_time = Instant::now();

            loop {
                thread::sleep(update_interval);

                let conns = connections.load(Ordering::Relaxed);
                let received = bytes_received.load(Ordering::Relaxed);
                let echoed = bytes_echoed.load(Ordering::Relaxed);
                let error_count = errors.load(Ordering::Relaxed);
                let now = Instant::now();

                // Detect whether bytes flowed since the last tick
                let recent_received = received.saturating_sub(last_received);

                let time_since_traffic = now.duration_since(last_traffic_time);
                let idle_threshold_duration = Duration::from_millis(IDLE_THRESHOLD_MS);
                let is_idle =
                    recent_received == 0 && time_since_traffic >= idle_threshold_duration;

                if recent_received > 0 {
                    last_traffic_time = now;
                }

                // Blink while traffic is flowing, hold static when idle
                if !is_idle {
                    let blink_interval = Duration::from_millis(BLINK_INTERVAL_MS);
                    if now.duration_since(last_blink_time) >= blink_interval {
                        blink_state = !blink_state;
                        last_blink_time = now;
                    }
                } else {
                    blink_state = false;
                }

                let indicator = Self::render_indicator(is_idle, blink_state);

                Self::display_status_line(
                    &indicator,
                    is_idle,
                    conns,
                    received,
                    echoed,
                    error_count,
                );

                last_received = received;
            }
        });
    }

    /// Renders the activity indicator based on current state.
    fn render_indicator(is_idle: bool, blink_state: bool) -> String {
        if is_idle {
            // Static gray block when idle
            "░".normal().to_string()
        } else if blink_state {
            // Blinking ON state - green filled block
            "█".green().bold().to_string()
        } else {
            // Blinking OFF state - green outlined block (light shade)
            "░".green().to_string()
        }
    }

    /// Displays the status line with current server statistics.
    fn display_status_line(
        indicator: &str,
        is_idle: bool,
        connections: u64,
        received: u64,
        echoed: u64,
        error_count: u64,
    ) {
        let status = if is_idle { "IDLE" } else { "ACTIVE" };
        print!(
            "\r{} [{}] Connections: {} | Bytes in: {} | Bytes out: {} | Errors: {}",
            indicator, status, connections, received, echoed, error_count
        );
        std::io::Write::flush(&mut std::io::stdout()).ok();
    }

    /// Get final statistics.
    pub fn stats(&self) -> ServerStats {
        let elapsed = self.start_time.elapsed();

        ServerStats {
            connections: self.connections.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_echoed: self.bytes_echoed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

/// Lightweight counters for updating statistics from the serving loop.
///
/// These use atomic operations which are lock-free and have minimal overhead.
pub struct ServerCounters {
    connections: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
    bytes_echoed: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
}

impl ServerCounters {
    /// Count one accepted connection.
    ///
    /// Uses `Relaxed` ordering which is sufficient for simple counters
    /// and provides the best performance.
    #[inline]
    pub fn increment_connections(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Add to the received byte total.
    #[inline]
    pub fn add_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Add to the echoed byte total.
    #[inline]
    pub fn add_echoed(&self, bytes: u64) {
        self.bytes_echoed.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Increment the errors counter.
    #[inline]
    pub fn increment_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Final server statistics.
pub struct ServerStats {
    pub connections: u64,
    pub bytes_received: u64,
    pub bytes_echoed: u64,
    pub errors: u64,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_monitor_creation() {
        let monitor = ServerMonitor::new(100);
        assert_eq!(monitor.update_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_counters() {
        let monitor = ServerMonitor::new(100);
        let counters = monitor.counters();

        counters.increment_connections();
        counters.add_received(1024);
        counters.add_echoed(1024);
        counters.increment_error();

        let stats = monitor.stats();
        assert_eq!(stats.connections, 1);
        assert_eq!(stats.bytes_received, 1024);
        assert_eq!(stats.bytes_echoed, 1024);
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn test_counter_performance() {
        let monitor = ServerMonitor::new(100);
        let counters = monitor.counters();

        let start = Instant::now();
        for _ in 0..1_000_000 {
            counters.add_received(1);
        }
        let elapsed = start.elapsed();

        // Should complete in under 100ms (very fast atomic operations)
        assert!(elapsed.as_millis() < 100);
        assert_eq!(monitor.stats().bytes_received, 1_000_000);
    }
}
