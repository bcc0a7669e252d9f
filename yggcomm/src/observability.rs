//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Observability for file channels.
//!
//! [`CommMetrics`] counts what a channel did with lock-free atomic counters.
//! With the `observability` feature enabled every counter is also exported
//! through the [`metrics`](https://docs.rs/metrics) facade, so any installed
//! recorder (Prometheus, StatsD, ...) picks them up:
//!
//! - `yggcomm.comm.messages.sent`
//! - `yggcomm.comm.messages.received`
//! - `yggcomm.comm.bytes.sent`
//! - `yggcomm.comm.bytes.received`
//! - `yggcomm.comm.send.failures`
//! - `yggcomm.comm.merges`
//! - `yggcomm.comm.series.advances`
//! - `yggcomm.comm.refreshes`
//! - `yggcomm.errors.{schema,datatype,codec,comm}`
//!
//! [`log_error`] writes a [`YggError`] to `tracing` with its classification.

use crate::YggError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one file channel.
///
/// # Examples
///
/// ```rust
/// use yggcomm::observability::CommMetrics;
///
/// let metrics = CommMetrics::new();
/// metrics.record_sent(128);
/// metrics.record_received(64);
/// metrics.record_send_failure();
///
/// assert_eq!(metrics.messages_sent(), 1);
/// assert_eq!(metrics.bytes_sent(), 128);
/// assert_eq!(metrics.bytes_received(), 64);
/// assert_eq!(metrics.send_failures(), 1);
/// ```
#[derive(Debug, Default)]
pub struct CommMetrics {
    /// Messages written
    messages_sent: AtomicU64,
    /// Messages read
    messages_received: AtomicU64,
    /// Bytes written, file headers included
    bytes_sent: AtomicU64,
    /// Bytes read
    bytes_received: AtomicU64,
    /// Sends that reported `false`
    send_failures: AtomicU64,
    /// Appends that rewrote the file as one merged document
    merges: AtomicU64,
    /// Moves to the next series member
    series_advances: AtomicU64,
    /// Dedicated handles reopened to observe external writes
    refreshes: AtomicU64,
}

impl CommMetrics {
    /// Creates a zeroed set of counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one message of `bytes` bytes written.
    pub fn record_sent(&self, bytes: u64) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        {
            metrics::counter!("yggcomm.comm.messages.sent").increment(1);
            metrics::counter!("yggcomm.comm.bytes.sent").increment(bytes);
        }
    }

    /// Records one message of `bytes` bytes read.
    pub fn record_received(&self, bytes: u64) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        {
            metrics::counter!("yggcomm.comm.messages.received").increment(1);
            metrics::counter!("yggcomm.comm.bytes.received").increment(bytes);
        }
    }

    /// Records a send that failed.
    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("yggcomm.comm.send.failures").increment(1);
    }

    /// Records an append that merged into the existing document.
    pub fn record_merge(&self) {
        self.merges.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("yggcomm.comm.merges").increment(1);
    }

    /// Records a move to the next series member.
    pub fn record_series_advance(&self) {
        self.series_advances.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("yggcomm.comm.series.advances").increment(1);
    }

    /// Records a dedicated handle being reopened.
    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("yggcomm.comm.refreshes").increment(1);
    }

    /// Returns the number of messages written.
    #[must_use]
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Returns the number of messages read.
    #[must_use]
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Returns the number of bytes written.
    #[must_use]
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Returns the number of bytes read.
    #[must_use]
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    /// Returns the number of failed sends.
    #[must_use]
    pub fn send_failures(&self) -> u64 {
        self.send_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of merged appends.
    #[must_use]
    pub fn merges(&self) -> u64 {
        self.merges.load(Ordering::Relaxed)
    }

    /// Returns the number of series advances.
    #[must_use]
    pub fn series_advances(&self) -> u64 {
        self.series_advances.load(Ordering::Relaxed)
    }

    /// Returns the number of dedicated handle refreshes.
    #[must_use]
    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }
}

/// Counts errors by layer.
///
/// # Examples
///
/// ```rust
/// use yggcomm::observability::ErrorMetrics;
/// use yggcomm::serialization::CodecError;
/// use yggcomm::YggError;
///
/// let metrics = ErrorMetrics::new();
/// metrics.record_error(&YggError::from(CodecError::malformed("no separator")));
/// assert_eq!(metrics.codec_errors(), 1);
/// assert_eq!(metrics.total_errors(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    schema_errors: AtomicU64,
    datatype_errors: AtomicU64,
    codec_errors: AtomicU64,
    comm_errors: AtomicU64,
    recoverable_errors: AtomicU64,
}

impl ErrorMetrics {
    /// Creates a zeroed set of counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error under its layer.
    pub fn record_error(&self, error: &YggError) {
        match error {
            YggError::Schema(_) => {
                self.schema_errors.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "observability")]
                metrics::counter!("yggcomm.errors.schema").increment(1);
            }
            YggError::Datatype(_) => {
                self.datatype_errors.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "observability")]
                metrics::counter!("yggcomm.errors.datatype").increment(1);
            }
            YggError::Codec(_) => {
                self.codec_errors.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "observability")]
                metrics::counter!("yggcomm.errors.codec").increment(1);
            }
            YggError::Comm(_) => {
                self.comm_errors.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "observability")]
                metrics::counter!("yggcomm.errors.comm").increment(1);
            }
        }
        if error.is_recoverable() {
            self.recoverable_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Returns the number of schema errors.
    #[must_use]
    pub fn schema_errors(&self) -> u64 {
        self.schema_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of datatype errors.
    #[must_use]
    pub fn datatype_errors(&self) -> u64 {
        self.datatype_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of codec errors.
    #[must_use]
    pub fn codec_errors(&self) -> u64 {
        self.codec_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of comm errors.
    #[must_use]
    pub fn comm_errors(&self) -> u64 {
        self.comm_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of recoverable errors.
    #[must_use]
    pub fn recoverable_errors(&self) -> u64 {
        self.recoverable_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of errors of every layer.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.schema_errors() + self.datatype_errors() + self.codec_errors() + self.comm_errors()
    }
}

/// Logs an error with structured context.
///
/// Comm errors the driver will retry are logged at `WARN`; everything else
/// at `ERROR`.
pub fn log_error(error: &YggError) {
    match error {
        YggError::Comm(e) if e.is_recoverable() => {
            tracing::warn!(error = %e, recoverable = true, "Comm error occurred");
        }
        YggError::Comm(e) => {
            tracing::error!(error = %e, recoverable = false, "Comm error occurred");
        }
        YggError::Codec(e) => {
            tracing::error!(
                error = %e,
                malformed = e.is_malformed(),
                corrupt = e.is_corrupt(),
                "Codec error occurred"
            );
        }
        other => {
            tracing::error!(
                error = %other,
                schema = other.is_schema_error(),
                recoverable = other.is_recoverable(),
                "Type error occurred"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::CommError;
    use crate::schema::SchemaValidationError;
    use std::io;

    #[test]
    fn test_comm_metrics_accumulate() {
        let metrics = CommMetrics::new();
        metrics.record_sent(10);
        metrics.record_sent(5);
        metrics.record_merge();
        metrics.record_series_advance();
        metrics.record_refresh();
        assert_eq!(metrics.messages_sent(), 2);
        assert_eq!(metrics.bytes_sent(), 15);
        assert_eq!(metrics.merges(), 1);
        assert_eq!(metrics.series_advances(), 1);
        assert_eq!(metrics.refreshes(), 1);
        assert_eq!(metrics.messages_received(), 0);
    }

    #[test]
    fn test_error_metrics_by_layer() {
        let metrics = ErrorMetrics::new();
        metrics.record_error(&YggError::from(SchemaValidationError::missing("typename")));
        metrics.record_error(&YggError::from(CommError::io(
            "/tmp/x",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        )));
        assert_eq!(metrics.schema_errors(), 1);
        assert_eq!(metrics.comm_errors(), 1);
        assert_eq!(metrics.recoverable_errors(), 2);
        assert_eq!(metrics.total_errors(), 2);
    }

    #[test]
    fn test_log_error() {
        log_error(&YggError::from(CommError::Closed {
            comm: "out".to_string(),
        }));
        log_error(&YggError::from(SchemaValidationError::missing("typename")));
    }
}
