//! Execution telemetry
//!
//! Aggregate statistics for completed tool calls, maintained by a
//! single-writer event channel: executors send completion events over
//! an mpsc channel and one consumer task owns the counters, so updates
//! stay correct under concurrently completing calls without shared-
//! memory locking. Snapshots ride the same FIFO channel and therefore
//! observe every event recorded before them.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

/// Per-call state machine phases, reported as telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    Pending,
    Sanitizing,
    Invoking,
    RetryWait,
    Exhausted,
    FallbackAttempt,
    Succeeded,
    Failed,
}

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum ToolEvent {
    /// A call moved to a new phase
    PhaseChanged { call_id: String, phase: CallPhase },

    /// A retry is about to run
    RetryAttempted { tool: String, attempt: u32 },

    /// A fallback tool is about to run
    FallbackAttempted { tool: String, fallback: String },

    /// A logical call reached its terminal state
    ///
    /// Emitted exactly once per call, counting the final outcome, not
    /// each retry attempt.
    CallCompleted {
        tool: String,
        success: bool,
        duration_ms: u64,
    },
}

/// Aggregate execution statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Completed logical calls
    pub total_calls: u64,

    /// Calls that reached a successful terminal state
    pub successful_calls: u64,

    /// Calls that exhausted retries and fallbacks
    pub failed_calls: u64,

    /// Retry attempts across all calls
    pub retry_attempts: u64,

    /// Fallback attempts across all calls
    pub fallback_attempts: u64,

    /// Total wall-clock execution time (ms)
    pub total_duration_ms: u64,
}

impl ExecutionStats {
    /// Running average execution time per completed call
    pub fn average_duration_ms(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / self.total_calls as f64
        }
    }

    /// Fraction of completed calls that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.successful_calls as f64 / self.total_calls as f64
        }
    }

    fn apply(&mut self, event: &ToolEvent) {
        match event {
            ToolEvent::PhaseChanged { .. } => {}
            ToolEvent::RetryAttempted { .. } => {
                self.retry_attempts += 1;
            }
            ToolEvent::FallbackAttempted { .. } => {
                self.fallback_attempts += 1;
            }
            ToolEvent::CallCompleted {
                success,
                duration_ms,
                ..
            } => {
                self.total_calls += 1;
                if *success {
                    self.successful_calls += 1;
                } else {
                    self.failed_calls += 1;
                }
                self.total_duration_ms += duration_ms;
            }
        }
    }
}

enum Message {
    Event(ToolEvent),
    Snapshot(oneshot::Sender<ExecutionStats>),
}

/// Telemetry collector
///
/// Cheap to clone; every clone feeds the same consumer task. Must be
/// created inside a Tokio runtime.
#[derive(Clone)]
pub struct TelemetryCollector {
    tx: mpsc::UnboundedSender<Message>,
}

impl TelemetryCollector {
    /// Create a collector and spawn its consumer task
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut stats = ExecutionStats::default();
            while let Some(message) = rx.recv().await {
                match message {
                    Message::Event(event) => stats.apply(&event),
                    Message::Snapshot(reply) => {
                        let _ = reply.send(stats.clone());
                    }
                }
            }
        });

        Self { tx }
    }

    /// Record an event (never blocks)
    pub fn record(&self, event: ToolEvent) {
        let _ = self.tx.send(Message::Event(event));
    }

    /// Snapshot the aggregate statistics
    ///
    /// Ordered after every event recorded before this call, since the
    /// snapshot request travels the same FIFO channel.
    pub async fn snapshot(&self) -> ExecutionStats {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(Message::Snapshot(reply_tx)).is_err() {
            return ExecutionStats::default();
        }
        reply_rx.await.unwrap_or_default()
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completion_counting() {
        let collector = TelemetryCollector::new();

        collector.record(ToolEvent::CallCompleted {
            tool: "calculate".to_string(),
            success: true,
            duration_ms: 100,
        });
        collector.record(ToolEvent::CallCompleted {
            tool: "read_file".to_string(),
            success: false,
            duration_ms: 50,
        });

        let stats = collector.snapshot().await;
        assert_eq!(stats.total_calls, 2);
        assert_eq!(stats.successful_calls, 1);
        assert_eq!(stats.failed_calls, 1);
        assert_eq!(stats.average_duration_ms(), 75.0);
        assert_eq!(stats.success_rate(), 0.5);
    }

    #[tokio::test]
    async fn test_retry_and_fallback_counters() {
        let collector = TelemetryCollector::new();

        collector.record(ToolEvent::RetryAttempted {
            tool: "http_request".to_string(),
            attempt: 1,
        });
        collector.record(ToolEvent::RetryAttempted {
            tool: "http_request".to_string(),
            attempt: 2,
        });
        collector.record(ToolEvent::FallbackAttempted {
            tool: "web_search".to_string(),
            fallback: "http_request".to_string(),
        });

        let stats = collector.snapshot().await;
        assert_eq!(stats.retry_attempts, 2);
        assert_eq!(stats.fallback_attempts, 1);
        assert_eq!(stats.total_calls, 0);
    }

    #[tokio::test]
    async fn test_phase_events_do_not_touch_counters() {
        let collector = TelemetryCollector::new();

        collector.record(ToolEvent::PhaseChanged {
            call_id: "c1".to_string(),
            phase: CallPhase::Invoking,
        });

        let stats = collector.snapshot().await;
        assert_eq!(stats.total_calls, 0);
    }

    #[tokio::test]
    async fn test_concurrent_recording_is_lossless() {
        let collector = TelemetryCollector::new();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let collector = collector.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    collector.record(ToolEvent::CallCompleted {
                        tool: "t".to_string(),
                        success: true,
                        duration_ms: 1,
                    });
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = collector.snapshot().await;
        assert_eq!(stats.total_calls, 1600);
        assert_eq!(stats.successful_calls, 1600);
    }

    #[tokio::test]
    async fn test_empty_stats() {
        let stats = ExecutionStats::default();
        assert_eq!(stats.average_duration_ms(), 0.0);
        assert_eq!(stats.success_rate(), 0.0);
    }
}
