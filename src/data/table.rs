//! Time-Indexed Table Module
//! Wraps a DataFrame with a timestamp index column and inclusive range slicing.

use crate::error::{ChartError, Result};
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::debug;

const STRING_FORMATS: [(&str, Resolution); 4] = [
    ("%Y-%m-%d %H:%M:%S%.f", Resolution::Exact),
    ("%Y-%m-%dT%H:%M:%S%.f", Resolution::Exact),
    ("%Y-%m-%d %H:%M", Resolution::Minute),
    ("%Y-%m-%dT%H:%M", Resolution::Minute),
];

/// How much of a timestamp string was given. A bound at a coarse resolution
/// names a whole period, e.g. `2024-03` is all of March.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Exact,
}

impl Resolution {
    /// Last representable instant of the period starting at `start`.
    pub fn period_end(self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        let next = match self {
            Resolution::Year => start.checked_add_months(Months::new(12))?,
            Resolution::Month => start.checked_add_months(Months::new(1))?,
            Resolution::Day => start.checked_add_signed(Duration::days(1))?,
            Resolution::Hour => start.checked_add_signed(Duration::hours(1))?,
            Resolution::Minute => start.checked_add_signed(Duration::minutes(1))?,
            Resolution::Exact => return Some(start),
        };
        next.checked_sub_signed(Duration::nanoseconds(1))
    }
}

fn is_digits(text: &str, len: usize) -> bool {
    text.len() == len && text.bytes().all(|b| b.is_ascii_digit())
}

/// `YYYY`, `YYYY-MM` or `YYYY-MM-DD HH` (also with a `T` separator).
fn parse_partial(text: &str) -> Option<(NaiveDateTime, Resolution)> {
    if is_digits(text, 4) {
        let year = text.parse().ok()?;
        let dt = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
        return Some((dt, Resolution::Year));
    }

    if let Some((year, month)) = text.split_once('-') {
        if is_digits(year, 4) && is_digits(month, 2) {
            let dt = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?
                .and_hms_opt(0, 0, 0)?;
            return Some((dt, Resolution::Month));
        }
    }

    let (date, hour) = text.split_once([' ', 'T'])?;
    if !is_digits(hour, 2) {
        return None;
    }
    let dt = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(hour.parse().ok()?, 0, 0)?;
    Some((dt, Resolution::Hour))
}

/// Parse a timestamp string along with how precisely it was given.
pub fn parse_timestamp(text: &str) -> Option<(NaiveDateTime, Resolution)> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some((dt.naive_utc(), Resolution::Exact));
    }

    for (format, resolution) in STRING_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some((dt, resolution));
        }
    }

    if let Some(dt) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Some((dt, Resolution::Day));
    }

    parse_partial(text)
}

fn from_epoch(value: i64, per_second: i64) -> Option<NaiveDateTime> {
    let secs = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * (1_000_000_000 / per_second);
    DateTime::from_timestamp(secs, nanos as u32).map(|dt| dt.naive_utc())
}

/// Inclusive time window. A `None` bound leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Unbounded on both sides.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse both bounds. A partial end bound (`2024`, `2024-03`, a bare date, an
    /// hour) covers the whole period it names.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = start
            .map(|s| {
                parse_timestamp(s)
                    .map(|(dt, _)| dt)
                    .ok_or_else(|| ChartError::InvalidDate(s.to_string()))
            })
            .transpose()?;

        let end = end
            .map(|s| {
                parse_timestamp(s)
                    .and_then(|(dt, resolution)| resolution.period_end(dt))
                    .ok_or_else(|| ChartError::InvalidDate(s.to_string()))
            })
            .transpose()?;

        Ok(Self { start, end })
    }

    pub fn between(start: &str, end: &str) -> Result<Self> {
        Self::parse(Some(start), Some(end))
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.start.map_or(true, |s| *ts >= s) && self.end.map_or(true, |e| *ts <= e)
    }
}

/// A DataFrame whose rows are ordered by a timestamp index column.
#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    frame: DataFrame,
    index: String,
    timestamps: Vec<NaiveDateTime>,
}

impl TimeSeriesTable {
    /// Wrap a DataFrame, sorting rows ascending by the index column when needed.
    pub fn new(frame: DataFrame, index: &str) -> Result<Self> {
        let timestamps = Self::index_timestamps(&frame, index)?;

        if timestamps.windows(2).all(|w| w[0] <= w[1]) {
            return Ok(Self {
                frame,
                index: index.to_string(),
                timestamps,
            });
        }

        debug!(index, rows = frame.height(), "sorting table by index column");
        let mut order: Vec<IdxSize> = (0..timestamps.len() as IdxSize).collect();
        order.sort_by_key(|&i| timestamps[i as usize]);
        let sorted_timestamps = order.iter().map(|&i| timestamps[i as usize]).collect();
        let idx = IdxCa::from_vec("order".into(), order);
        let frame = frame.take(&idx)?;

        Ok(Self {
            frame,
            index: index.to_string(),
            timestamps: sorted_timestamps,
        })
    }

    fn index_timestamps(frame: &DataFrame, index: &str) -> Result<Vec<NaiveDateTime>> {
        let column = frame
            .column(index)
            .map_err(|_| ChartError::ColumnNotFound(index.to_string()))?;

        let null_at = |row: usize| ChartError::InvalidIndex(format!("null timestamp at row {row}"));
        let out_of_range =
            |row: usize| ChartError::InvalidIndex(format!("timestamp out of range at row {row}"));

        match column.dtype() {
            DataType::Datetime(unit, _) => {
                let per_second = match unit {
                    TimeUnit::Nanoseconds => 1_000_000_000,
                    TimeUnit::Microseconds => 1_000_000,
                    TimeUnit::Milliseconds => 1_000,
                };
                let physical = column.cast(&DataType::Int64)?;
                physical
                    .i64()?
                    .into_iter()
                    .enumerate()
                    .map(|(row, v)| {
                        let v = v.ok_or_else(|| null_at(row))?;
                        from_epoch(v, per_second).ok_or_else(|| out_of_range(row))
                    })
                    .collect()
            }
            DataType::Date => {
                let days = column.cast(&DataType::Int32)?;
                days.i32()?
                    .into_iter()
                    .enumerate()
                    .map(|(row, v)| {
                        let v = v.ok_or_else(|| null_at(row))?;
                        from_epoch(i64::from(v) * 86_400, 1).ok_or_else(|| out_of_range(row))
                    })
                    .collect()
            }
            DataType::String => column
                .str()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    let v = v.ok_or_else(|| null_at(row))?;
                    parse_timestamp(v).map(|(dt, _)| dt).ok_or_else(|| {
                        ChartError::InvalidIndex(format!("cannot parse '{v}' at row {row}"))
                    })
                })
                .collect(),
            dtype if dtype.is_integer() => {
                // Integer indexes are epoch milliseconds.
                let millis = column.cast(&DataType::Int64)?;
                millis
                    .i64()?
                    .into_iter()
                    .enumerate()
                    .map(|(row, v)| {
                        let v = v.ok_or_else(|| null_at(row))?;
                        from_epoch(v, 1_000).ok_or_else(|| out_of_range(row))
                    })
                    .collect()
            }
            other => Err(ChartError::InvalidIndex(format!(
                "column '{index}' has unsupported type {other}"
            ))),
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn index_column(&self) -> &str {
        &self.index
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn height(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Filtered copy holding only the rows inside `range`, in their original order.
    pub fn slice(&self, range: &DateRange) -> Result<Self> {
        let keep: Vec<bool> = self.timestamps.iter().map(|ts| range.contains(ts)).collect();
        let mask = BooleanChunked::from_slice("mask".into(), &keep);
        let frame = self.frame.filter(&mask)?;
        let timestamps = self
            .timestamps
            .iter()
            .zip(keep.iter())
            .filter(|(_, &k)| k)
            .map(|(ts, _)| *ts)
            .collect();

        Ok(Self {
            frame,
            index: self.index.clone(),
            timestamps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn string_table(dates: &[&str]) -> TimeSeriesTable {
        let closes: Vec<f64> = (0..dates.len()).map(|i| i as f64).collect();
        let frame = DataFrame::new(vec![
            Column::new("date".into(), dates.to_vec()),
            Column::new("close".into(), closes),
        ])
        .unwrap();
        TimeSeriesTable::new(frame, "date").unwrap()
    }

    #[test]
    fn parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2024-01-03"), Some((day(3), Resolution::Day)));
        assert_eq!(
            parse_timestamp("2024-01-03 12:30:00").map(|(dt, _)| dt),
            day(3).date().and_hms_opt(12, 30, 0)
        );
        assert_eq!(
            parse_timestamp("2024-01-03T12:30:00Z").map(|(dt, _)| dt),
            day(3).date().and_hms_opt(12, 30, 0)
        );
        assert!(parse_timestamp("03/01/2024").is_none());
    }

    #[test]
    fn parse_partial_timestamps() {
        assert_eq!(parse_timestamp("2024"), Some((day(1), Resolution::Year)));
        assert_eq!(parse_timestamp("2024-01"), Some((day(1), Resolution::Month)));
        assert_eq!(
            parse_timestamp("2024-01-03 10"),
            Some((day(3).date().and_hms_opt(10, 0, 0).unwrap(), Resolution::Hour))
        );
        assert_eq!(
            parse_timestamp("2024-01-03 10:15").map(|(_, r)| r),
            Some(Resolution::Minute)
        );
        assert!(parse_timestamp("2024-13").is_none());
        assert!(parse_timestamp("202").is_none());
        assert!(parse_timestamp("2024-01-03 1").is_none());
    }

    #[test]
    fn month_bounds_cover_whole_month() {
        let range = DateRange::between("2024-03", "2024-03").unwrap();
        let march = |d: u32, h: u32| {
            NaiveDate::from_ymd_opt(2024, 3, d)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
        };
        assert!(range.contains(&march(1, 0)));
        assert!(range.contains(&march(31, 23)));
        assert!(!range.contains(&day(29)));
        let april = NaiveDate::from_ymd_opt(2024, 4, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(!range.contains(&april));
    }

    #[test]
    fn year_bounds_cover_whole_year() {
        let range = DateRange::between("2024", "2024").unwrap();
        assert!(range.contains(&day(1)));
        let new_years_eve = NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert!(range.contains(&new_years_eve));
        assert!(!range.contains(&(new_years_eve + Duration::seconds(1))));
        assert!(!range.contains(&(day(1) - Duration::seconds(1))));
    }

    #[test]
    fn hour_end_bound_covers_the_hour() {
        let range = DateRange::parse(None, Some("2024-01-03 10")).unwrap();
        let at = |h: u32, m: u32| day(3).date().and_hms_opt(h, m, 0).unwrap();
        assert!(range.contains(&at(10, 59)));
        assert!(!range.contains(&at(11, 0)));
    }

    #[test]
    fn month_slice_selects_rows() {
        let table = string_table(&["2024-02-29", "2024-03-01", "2024-03-15", "2024-04-01"]);
        let sliced = table.slice(&DateRange::between("2024-03", "2024-03").unwrap()).unwrap();
        assert_eq!(sliced.height(), 2);
    }

    #[test]
    fn end_date_covers_whole_day() {
        let range = DateRange::between("2024-01-02", "2024-01-03").unwrap();
        let late = day(3).date().and_hms_opt(18, 0, 0).unwrap();
        assert!(range.contains(&late));
        assert!(!range.contains(&day(4)));
        assert!(range.contains(&day(2)));
        assert!(!range.contains(&day(1)));
    }

    #[test]
    fn invalid_bound_is_rejected() {
        assert!(matches!(
            DateRange::between("yesterday", "2024-01-03"),
            Err(ChartError::InvalidDate(_))
        ));
    }

    #[test]
    fn open_range_contains_everything() {
        assert!(DateRange::all().contains(&day(1)));
        let from = DateRange::parse(Some("2024-01-02"), None).unwrap();
        assert!(!from.contains(&day(1)));
        assert!(from.contains(&day(31)));
    }

    #[test]
    fn string_index_is_parsed_and_sorted() {
        let table = string_table(&["2024-01-03", "2024-01-01", "2024-01-02"]);
        assert_eq!(table.timestamps(), &[day(1), day(2), day(3)]);
        let closes: Vec<Option<f64>> = table
            .frame()
            .column("close")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(closes, vec![Some(1.0), Some(2.0), Some(0.0)]);
    }

    #[test]
    fn integer_index_is_epoch_millis() {
        let frame = DataFrame::new(vec![
            Column::new("ts".into(), vec![0i64, 86_400_000]),
            Column::new("close".into(), vec![1.0, 2.0]),
        ])
        .unwrap();
        let table = TimeSeriesTable::new(frame, "ts").unwrap();
        assert_eq!(
            table.timestamps()[1],
            NaiveDate::from_ymd_opt(1970, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn missing_index_column() {
        let frame = DataFrame::new(vec![Column::new("close".into(), vec![1.0])]).unwrap();
        assert!(matches!(
            TimeSeriesTable::new(frame, "date"),
            Err(ChartError::ColumnNotFound(name)) if name == "date"
        ));
    }

    #[test]
    fn null_index_is_rejected() {
        let frame = DataFrame::new(vec![
            Column::new("date".into(), vec![Some("2024-01-01"), None]),
            Column::new("close".into(), vec![1.0, 2.0]),
        ])
        .unwrap();
        assert!(matches!(
            TimeSeriesTable::new(frame, "date"),
            Err(ChartError::InvalidIndex(_))
        ));
    }

    #[test]
    fn slice_keeps_order_and_leaves_source_untouched() {
        let table = string_table(&[
            "2024-01-01",
            "2024-01-02",
            "2024-01-03",
            "2024-01-04",
            "2024-01-05",
        ]);
        let range = DateRange::between("2024-01-02", "2024-01-04").unwrap();
        let sliced = table.slice(&range).unwrap();

        assert_eq!(sliced.height(), 3);
        assert_eq!(sliced.frame().height(), 3);
        assert_eq!(sliced.timestamps(), &[day(2), day(3), day(4)]);
        assert_eq!(table.height(), 5);
    }

    #[test]
    fn reversed_range_is_empty() {
        let table = string_table(&["2024-01-01", "2024-01-02"]);
        let range = DateRange::between("2024-01-02", "2024-01-01").unwrap();
        assert!(table.slice(&range).unwrap().is_empty());
    }
}
