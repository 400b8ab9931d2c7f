//! Timeframe resampling: aggregate a fine series into calendar buckets.
//!
//! Aggregation per bucket: open = first open, high = max high, low = min low,
//! close = last close, volume = sum. The aggregate candle is stamped with the
//! bucket's closing boundary (the exclusive end instant), so it is never
//! attributed to a time before all of its constituents exist. Empty buckets
//! are omitted.
//!
//! All bucket arithmetic is in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{Candle, OhlcvSeries};

/// Calendar period for the coarse timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Day,
    /// ISO week: Monday 00:00 UTC up to the next Monday 00:00 UTC.
    #[default]
    Week,
    Month,
}

impl Bucket {
    /// Opening boundary of the bucket containing `ts`.
    pub fn start_of(self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = ts.date_naive();
        let start = match self {
            Bucket::Day => date,
            Bucket::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            Bucket::Month => date - Duration::days(date.day0() as i64),
        };
        midnight(start)
    }

    /// Closing boundary (exclusive) of the bucket containing `ts`.
    pub fn end_of(self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.start_of(ts);
        match self {
            Bucket::Day => start + Duration::days(1),
            Bucket::Week => start + Duration::days(7),
            Bucket::Month => {
                let date = start.date_naive();
                start + Duration::days(days_in_month(date.year(), date.month()))
            }
        }
    }

    /// True if `ts` falls exactly on a bucket boundary.
    pub fn is_boundary(self, ts: DateTime<Utc>) -> bool {
        self.start_of(ts) == ts
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Day => "day",
            Bucket::Week => "week",
            Bucket::Month => "month",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" | "1d" => Ok(Bucket::Day),
            "week" | "1w" => Ok(Bucket::Week),
            "month" | "1mo" => Ok(Bucket::Month),
            other => Err(format!("unknown bucket '{other}' (valid: day, week, month)")),
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn days_in_month(year: i32, month: u32) -> i64 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
            if leap {
                29
            } else {
                28
            }
        }
    }
}

/// Aggregate `series` into `bucket`-sized candles in a single pass.
pub fn resample(series: &OhlcvSeries, bucket: Bucket) -> OhlcvSeries {
    let mut out: Vec<Candle> = Vec::new();
    let mut current: Option<Candle> = None;

    for candle in series.candles() {
        let end = bucket.end_of(candle.timestamp);
        match current.as_mut() {
            Some(agg) if agg.timestamp == end => {
                agg.high = agg.high.max(candle.high);
                agg.low = agg.low.min(candle.low);
                agg.close = candle.close;
                agg.volume += candle.volume;
            }
            _ => {
                if let Some(done) = current.take() {
                    out.push(done);
                }
                current = Some(Candle {
                    timestamp: end,
                    ..*candle
                });
            }
        }
    }
    if let Some(done) = current {
        out.push(done);
    }

    OhlcvSeries::from_ordered(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn candle(t: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            timestamp: t,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn week_boundaries_are_monday_midnight() {
        // 2024-01-03 is a Wednesday
        let t = ts(2024, 1, 3, 15);
        assert_eq!(Bucket::Week.start_of(t), ts(2024, 1, 1, 0));
        assert_eq!(Bucket::Week.end_of(t), ts(2024, 1, 8, 0));
        // A Monday-midnight candle opens a new week
        assert_eq!(Bucket::Week.end_of(ts(2024, 1, 8, 0)), ts(2024, 1, 15, 0));
        // Sunday belongs to the week that started the previous Monday
        assert_eq!(Bucket::Week.end_of(ts(2024, 1, 7, 23)), ts(2024, 1, 8, 0));
    }

    #[test]
    fn month_boundaries_handle_leap_years() {
        assert_eq!(Bucket::Month.end_of(ts(2024, 2, 10, 0)), ts(2024, 3, 1, 0));
        assert_eq!(Bucket::Month.end_of(ts(2023, 2, 10, 0)), ts(2023, 3, 1, 0));
        assert_eq!(Bucket::Month.end_of(ts(2023, 12, 31, 23)), ts(2024, 1, 1, 0));
        assert_eq!(Bucket::Month.start_of(ts(2023, 12, 31, 23)), ts(2023, 12, 1, 0));
    }

    #[test]
    fn day_bucket_groups_intraday() {
        let series = OhlcvSeries::new(vec![
            candle(ts(2024, 1, 1, 0), 10.0, 12.0, 9.0, 11.0, 1.0),
            candle(ts(2024, 1, 1, 12), 11.0, 15.0, 10.0, 14.0, 2.0),
            candle(ts(2024, 1, 2, 0), 14.0, 14.5, 13.0, 13.5, 3.0),
        ])
        .unwrap();
        let daily = resample(&series, Bucket::Day);
        assert_eq!(daily.len(), 2);
        let first = daily.candles()[0];
        assert_eq!(first.timestamp, ts(2024, 1, 2, 0));
        assert_eq!(first.open, 10.0);
        assert_eq!(first.high, 15.0);
        assert_eq!(first.low, 9.0);
        assert_eq!(first.close, 14.0);
        assert_eq!(first.volume, 3.0);
    }

    #[test]
    fn weekly_aggregation_rules() {
        // Mon..Wed of week 1, then Tue of week 2
        let series = OhlcvSeries::new(vec![
            candle(ts(2024, 1, 1, 0), 100.0, 110.0, 95.0, 105.0, 10.0),
            candle(ts(2024, 1, 2, 0), 105.0, 120.0, 101.0, 118.0, 20.0),
            candle(ts(2024, 1, 3, 0), 118.0, 119.0, 90.0, 92.0, 30.0),
            candle(ts(2024, 1, 9, 0), 92.0, 93.0, 91.0, 92.5, 5.0),
        ])
        .unwrap();
        let weekly = resample(&series, Bucket::Week);
        assert_eq!(weekly.len(), 2);

        let w1 = weekly.candles()[0];
        assert_eq!(w1.timestamp, ts(2024, 1, 8, 0));
        assert_eq!(w1.open, 100.0);
        assert_eq!(w1.high, 120.0);
        assert_eq!(w1.low, 90.0);
        assert_eq!(w1.close, 92.0);
        assert_eq!(w1.volume, 60.0);

        let w2 = weekly.candles()[1];
        assert_eq!(w2.timestamp, ts(2024, 1, 15, 0));
        assert_eq!(w2.open, 92.0);
        assert_eq!(w2.close, 92.5);
    }

    #[test]
    fn empty_buckets_are_omitted() {
        // Two candles three weeks apart: exactly two weekly rows
        let series = OhlcvSeries::new(vec![
            candle(ts(2024, 1, 2, 0), 1.0, 1.0, 1.0, 1.0, 1.0),
            candle(ts(2024, 1, 23, 0), 2.0, 2.0, 2.0, 2.0, 1.0),
        ])
        .unwrap();
        let weekly = resample(&series, Bucket::Week);
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly.timestamps(), vec![ts(2024, 1, 8, 0), ts(2024, 1, 29, 0)]);
    }

    #[test]
    fn empty_series_resamples_to_empty() {
        assert!(resample(&OhlcvSeries::empty(), Bucket::Week).is_empty());
    }

    #[test]
    fn bucket_parses_and_serializes() {
        assert_eq!("week".parse::<Bucket>().unwrap(), Bucket::Week);
        assert_eq!("1MO".parse::<Bucket>().unwrap(), Bucket::Month);
        assert!("fortnight".parse::<Bucket>().is_err());
        assert_eq!(serde_json::to_string(&Bucket::Week).unwrap(), "\"week\"");
    }
}
