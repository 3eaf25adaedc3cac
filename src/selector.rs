//! Best-reading selection
//!
//! Each PurpleAir sensor has two laser counters (channel A and B) plus a
//! network-computed average. This module picks which of the three to trust,
//! using a fixed precedence order. Every branch is an explicit variant of
//! [`PmSelection`] so the order can be tested on its own.

use crate::types::SelectionPath;

/// Readings above this are treated as a faulty channel
pub const PLAUSIBLE_MAX: f64 = 2000.0;

/// Channels closer than this agree; the network average is preferred
pub const AGREEMENT_DIFF: f64 = 50.0;

/// Channels further apart than this are both untrusted
pub const DISAGREEMENT_DIFF: f64 = 500.0;

/// Result of the best-reading policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PmSelection {
    /// A missing, B plausible
    ChannelB(f64),
    /// B missing, A plausible
    ChannelA(f64),
    /// A implausible, B plausible
    OutlierARejected(f64),
    /// B implausible, A plausible
    OutlierBRejected(f64),
    /// Channels differ moderately; take the higher one
    ChannelsDiverge(f64),
    /// Channels differ too much to trust either
    ChannelsDisagree,
    /// Channels agree and the network average is usable
    NetworkAverage(f64),
    /// Nothing above matched; the network average as-is
    Fallback(Option<f64>),
}

impl PmSelection {
    /// The selected raw PM2.5 value, if any
    pub fn value(&self) -> Option<f64> {
        match *self {
            PmSelection::ChannelB(v)
            | PmSelection::ChannelA(v)
            | PmSelection::OutlierARejected(v)
            | PmSelection::OutlierBRejected(v)
            | PmSelection::ChannelsDiverge(v)
            | PmSelection::NetworkAverage(v) => Some(v),
            PmSelection::ChannelsDisagree => None,
            PmSelection::Fallback(avg) => avg,
        }
    }

    pub fn path(&self) -> SelectionPath {
        match self {
            PmSelection::ChannelB(_) => SelectionPath::ChannelB,
            PmSelection::ChannelA(_) => SelectionPath::ChannelA,
            PmSelection::OutlierARejected(_) => SelectionPath::OutlierARejected,
            PmSelection::OutlierBRejected(_) => SelectionPath::OutlierBRejected,
            PmSelection::ChannelsDiverge(_) => SelectionPath::ChannelsDiverge,
            PmSelection::ChannelsDisagree => SelectionPath::ChannelsDisagree,
            PmSelection::NetworkAverage(_) => SelectionPath::NetworkAverage,
            PmSelection::Fallback(_) => SelectionPath::Fallback,
        }
    }
}

/// Apply the selection policy to channel A, channel B and the network average.
///
/// Inputs are expected to already have NaN mapped to `None`.
pub fn select_best_pm(a: Option<f64>, b: Option<f64>, avg: Option<f64>) -> PmSelection {
    match (a, b) {
        (None, Some(b)) if b <= PLAUSIBLE_MAX => PmSelection::ChannelB(b),
        (Some(a), None) if a <= PLAUSIBLE_MAX => PmSelection::ChannelA(a),
        (Some(a), Some(b)) if a > PLAUSIBLE_MAX && b <= PLAUSIBLE_MAX => {
            PmSelection::OutlierARejected(b)
        }
        (Some(a), Some(b)) if b > PLAUSIBLE_MAX && a <= PLAUSIBLE_MAX => {
            PmSelection::OutlierBRejected(a)
        }
        (Some(a), Some(b)) => {
            let diff = (a - b).abs();
            if diff > AGREEMENT_DIFF && diff <= DISAGREEMENT_DIFF {
                PmSelection::ChannelsDiverge(a.max(b))
            } else if diff > DISAGREEMENT_DIFF {
                PmSelection::ChannelsDisagree
            } else {
                match avg {
                    Some(avg) if avg >= 0.0 => PmSelection::NetworkAverage(avg),
                    _ => PmSelection::Fallback(avg),
                }
            }
        }
        _ => PmSelection::Fallback(avg),
    }
}

/// Convenience wrapper returning only the selected value
pub fn get_best_pm(a: Option<f64>, b: Option<f64>, avg: Option<f64>) -> Option<f64> {
    select_best_pm(a, b, avg).value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_channel_b() {
        assert_eq!(get_best_pm(None, Some(5.0), Some(5.0)), Some(5.0));
        assert_eq!(
            select_best_pm(None, Some(5.0), Some(5.0)),
            PmSelection::ChannelB(5.0)
        );
    }

    #[test]
    fn test_only_channel_a() {
        assert_eq!(
            select_best_pm(Some(12.0), None, Some(3.0)),
            PmSelection::ChannelA(12.0)
        );
    }

    #[test]
    fn test_single_implausible_channel_falls_back_to_average() {
        assert_eq!(
            select_best_pm(None, Some(2500.0), Some(7.0)),
            PmSelection::Fallback(Some(7.0))
        );
        assert_eq!(
            select_best_pm(Some(2000.5), None, None),
            PmSelection::Fallback(None)
        );
    }

    #[test]
    fn test_outlier_channel_rejected() {
        assert_eq!(get_best_pm(Some(2500.0), Some(10.0), Some(10.0)), Some(10.0));
        assert_eq!(
            select_best_pm(Some(10.0), Some(2500.0), Some(10.0)),
            PmSelection::OutlierBRejected(10.0)
        );
    }

    #[test]
    fn test_plausible_max_is_inclusive() {
        assert_eq!(
            select_best_pm(Some(2000.0), None, None),
            PmSelection::ChannelA(2000.0)
        );
    }

    #[test]
    fn test_both_channels_implausible_but_agreeing() {
        // Neither channel is rejected as an outlier when both are out of range
        assert_eq!(
            select_best_pm(Some(3000.0), Some(3010.0), Some(3005.0)),
            PmSelection::NetworkAverage(3005.0)
        );
        assert_eq!(
            select_best_pm(Some(2500.0), Some(3100.0), Some(2800.0)),
            PmSelection::ChannelsDisagree
        );
    }

    #[test]
    fn test_agreeing_channels_use_average() {
        assert_eq!(get_best_pm(Some(10.0), Some(10.0), Some(10.0)), Some(10.0));
        assert_eq!(
            select_best_pm(Some(10.0), Some(60.0), Some(33.0)),
            PmSelection::NetworkAverage(33.0)
        );
    }

    #[test]
    fn test_agreeing_channels_without_usable_average() {
        assert_eq!(
            select_best_pm(Some(10.0), Some(12.0), None),
            PmSelection::Fallback(None)
        );
        // A negative average is passed through untouched by the fallback.
        assert_eq!(get_best_pm(Some(10.0), Some(12.0), Some(-1.0)), Some(-1.0));
    }

    #[test]
    fn test_diverging_channels_take_max() {
        assert_eq!(get_best_pm(Some(10.0), Some(80.0), Some(45.0)), Some(80.0));
        assert_eq!(
            select_best_pm(Some(510.0), Some(10.0), Some(260.0)),
            PmSelection::ChannelsDiverge(510.0)
        );
    }

    #[test]
    fn test_disagreeing_channels_yield_nothing() {
        assert_eq!(get_best_pm(Some(10.0), Some(600.0), Some(300.0)), None);
        assert_eq!(
            select_best_pm(Some(10.0), Some(600.0), Some(300.0)).path(),
            SelectionPath::ChannelsDisagree
        );
    }

    #[test]
    fn test_both_missing_returns_average() {
        assert_eq!(get_best_pm(None, None, Some(4.2)), Some(4.2));
        assert_eq!(get_best_pm(None, None, None), None);
    }
}
