//! Metrics aggregation
//!
//! Folds parsed log lines into a [`MetricsSnapshot`]. The accumulator is an
//! owned value: feed it lines or whole blobs in order, then consume it with
//! [`MetricsAggregator::finish`].

use crate::models::{MetricsSnapshot, ParsedSignal};
use crate::parser::parse_line;

/// Responses slower than this many milliseconds count as slow
pub const SLOW_RESPONSE_THRESHOLD_MS: f64 = 1000.0;

/// Status codes at or above this count as server errors
pub const SERVER_ERROR_STATUS: u16 = 500;

/// Running counters for one evaluation cycle
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    total_requests: u64,
    error_count: u64,
    slow_response_count: u64,
    response_time_sum: f64,
    response_time_samples: u64,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed every line of a blob in document order
    pub fn observe_blob(&mut self, blob: &str) {
        for line in blob.lines() {
            self.observe_line(line);
        }
    }

    /// Parse and count one line, returning the signal if the line was a request
    pub fn observe_line(&mut self, line: &str) -> Option<ParsedSignal> {
        let signal = parse_line(line)?;
        self.observe_signal(&signal);
        Some(signal)
    }

    /// Count one already-parsed request line
    pub fn observe_signal(&mut self, signal: &ParsedSignal) {
        self.total_requests += 1;

        if signal.has_error_marker {
            self.error_count += 1;
        }

        if let Some(response_time) = signal.response_time_ms {
            self.response_time_sum += response_time;
            self.response_time_samples += 1;

            if response_time > SLOW_RESPONSE_THRESHOLD_MS {
                self.slow_response_count += 1;
            }
        }

        // Counted on top of the marker check above: an `ERROR ... status: 503`
        // line adds two errors.
        if let Some(status) = signal.status_code {
            if status >= SERVER_ERROR_STATUS {
                self.error_count += 1;
            }
        }
    }

    /// Lines counted so far
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Close the cycle and produce the snapshot
    pub fn finish(self) -> MetricsSnapshot {
        let average_response_time_ms = if self.response_time_samples == 0 {
            0.0
        } else {
            self.response_time_sum / self.response_time_samples as f64
        };

        MetricsSnapshot {
            total_requests: self.total_requests,
            error_count: self.error_count,
            slow_response_count: self.slow_response_count,
            average_response_time_ms,
            response_time_samples: self.response_time_samples,
        }
    }
}

/// Aggregate a sequence of blobs, processed in the order given
pub fn aggregate<I, S>(blobs: I) -> MetricsSnapshot
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    blobs
        .into_iter()
        .fold(MetricsAggregator::new(), |mut acc, blob| {
            acc.observe_blob(blob.as_ref());
            acc
        })
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_zero_snapshot() {
        let snapshot = aggregate(Vec::<String>::new());
        assert_eq!(snapshot, MetricsSnapshot::default());
        assert_eq!(snapshot.average_response_time_ms, 0.0);
    }

    #[test]
    fn test_reference_scenario() {
        let snapshot = aggregate([
            "status: 200 response_time: 100ms\nERROR status: 503 response_time: 2000ms",
        ]);
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.error_count, 2);
        assert_eq!(snapshot.slow_response_count, 1);
        assert_eq!(snapshot.average_response_time_ms, 1050.0);
        assert_eq!(snapshot.response_time_samples, 2);
    }

    /// Intentional: a marker and a 5xx status on the same line are two errors.
    #[test]
    fn test_marker_and_server_error_count_twice() {
        let snapshot = aggregate(["ERROR upstream status: 502"]);
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.error_count, 2);
        assert!(snapshot.error_count > snapshot.total_requests);
    }

    #[test]
    fn test_client_errors_are_not_errors() {
        let snapshot = aggregate(["status: 404", "status: 499", "status: 500"]);
        assert_eq!(snapshot.error_count, 1);
    }

    #[test]
    fn test_blank_lines_do_not_count() {
        let snapshot = aggregate(["\n\nGET /a\n   \n\t\nGET /b\n"]);
        assert_eq!(snapshot.total_requests, 2);
    }

    #[test]
    fn test_total_requests_ignores_content() {
        let lines = ["", "x", "ERROR", "   ", "status: 500", "response_time: 1ms", "?"];
        let mut aggregator = MetricsAggregator::new();
        for line in lines {
            aggregator.observe_line(line);
        }
        let non_empty = lines.iter().filter(|l| !l.trim().is_empty()).count() as u64;
        assert_eq!(aggregator.total_requests(), non_empty);
        assert_eq!(aggregator.finish().total_requests, non_empty);
    }

    #[test]
    fn test_slow_threshold_is_strict() {
        let snapshot = aggregate([
            "response_time: 1000ms\nresponse_time: 1000.5ms\nresponse_time: 999ms",
        ]);
        assert_eq!(snapshot.slow_response_count, 1);
    }

    #[test]
    fn test_average_is_order_independent() {
        let forward = aggregate(["response_time: 10ms\nresponse_time: 20ms", "response_time: 60ms"]);
        let reverse = aggregate(["response_time: 60ms", "response_time: 20ms\nresponse_time: 10ms"]);
        assert_eq!(forward.average_response_time_ms, 30.0);
        assert_eq!(reverse.average_response_time_ms, 30.0);
    }

    #[test]
    fn test_average_only_over_lines_with_times() {
        let snapshot = aggregate(["no timing here\nresponse_time: 300ms\nstatus: 200"]);
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.average_response_time_ms, 300.0);
    }

    #[test]
    fn test_blobs_accumulate_across_files() {
        let snapshot = aggregate(vec![
            "ERROR a".to_string(),
            "b\nc".to_string(),
            "FATAL d\r\nresponse_time: 1200ms\r\n".to_string(),
        ]);
        assert_eq!(snapshot.total_requests, 5);
        assert_eq!(snapshot.error_count, 2);
        assert_eq!(snapshot.slow_response_count, 1);
    }
}
