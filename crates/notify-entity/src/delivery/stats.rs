//! Per-notification delivery statistics.

use serde::{Deserialize, Serialize};

use super::status::DeliveryStatus;

/// Aggregated delivery counts for one notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryStatistics {
    pub total: i64,
    /// `DELIVERED` plus `READ`.
    pub successful: i64,
    pub sent: i64,
    pub failed: i64,
    pub pending: i64,
    pub dead_lettered: i64,
    /// `successful / total * 100`, or 0 when there are no deliveries.
    pub success_rate: f64,
}

impl DeliveryStatistics {
    /// Fold `(status, count)` pairs into statistics.
    pub fn from_counts(counts: impl IntoIterator<Item = (DeliveryStatus, i64)>) -> Self {
        let mut stats = Self::default();
        for (status, count) in counts {
            stats.total += count;
            match status {
                DeliveryStatus::Delivered | DeliveryStatus::Read => stats.successful += count,
                DeliveryStatus::Sent => stats.sent += count,
                DeliveryStatus::Failed => stats.failed += count,
                DeliveryStatus::Pending => stats.pending += count,
                DeliveryStatus::DeadLettered => stats.dead_lettered += count,
                DeliveryStatus::Cancelled => {}
            }
        }
        stats.success_rate = if stats.total > 0 {
            stats.successful as f64 / stats.total as f64 * 100.0
        } else {
            0.0
        };
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let stats = DeliveryStatistics::from_counts([
            (DeliveryStatus::Delivered, 5),
            (DeliveryStatus::Read, 2),
            (DeliveryStatus::Failed, 2),
            (DeliveryStatus::Pending, 1),
        ]);
        assert_eq!(stats.total, 10);
        assert_eq!(stats.successful, 7);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.pending, 1);
        assert!((stats.success_rate - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_rate_is_zero() {
        let stats = DeliveryStatistics::from_counts(Vec::new());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0.0);
    }
}
