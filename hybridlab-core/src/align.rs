//! Multi-timeframe alignment: project a coarse signal series onto a fine index.
//!
//! Strictly-causal forward fill: each fine timestamp `t` takes the signal of
//! the latest coarse timestamp `<= t`. Coarse timestamps are bucket closing
//! boundaries (see `resample`), so a fine bar only ever sees buckets that had
//! fully closed by its own timestamp. Fine bars before the first coarse close
//! get NONE.

use chrono::{DateTime, Utc};

use crate::domain::{Signal, SignalSeries};

/// Index of the latest entry in `sorted` that is `<= t`, if any.
pub fn latest_at_or_before(sorted: &[DateTime<Utc>], t: DateTime<Utc>) -> Option<usize> {
    // partition_point gives the count of entries <= t
    match sorted.partition_point(|&x| x <= t) {
        0 => None,
        n => Some(n - 1),
    }
}

/// Forward-fill `coarse` onto `fine`. Both indexes must be sorted ascending.
///
/// Single linear merge over both indexes.
pub fn align(coarse: &SignalSeries, fine: &[DateTime<Utc>]) -> SignalSeries {
    let coarse_ts = coarse.timestamps();
    let coarse_sig = coarse.signals();

    let mut signals = Vec::with_capacity(fine.len());
    let mut next = 0usize;
    let mut current = Signal::Neutral;

    for &t in fine {
        while next < coarse_ts.len() && coarse_ts[next] <= t {
            current = coarse_sig[next];
            next += 1;
        }
        signals.push(current);
    }

    SignalSeries::from_parts(fine.to_vec(), signals)
}
