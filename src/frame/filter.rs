//! Date-range filtering over a loaded frame.
//!
//! The filtered view is derived, never owned: it is recomputed from the full
//! frame whenever the interval changes. Filtering is a pure function — the
//! input frame is untouched, column order and row order are preserved, and no
//! re-sorting happens.

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::{DATE_COLUMN, Frame, Value};

/// Keep the rows whose `Date` value lies within `[start, end]`, both ends
/// inclusive.
///
/// `start > end` is not an error; it just selects nothing. Rows with a null
/// `Date` never match. A frame without a `Date` column filters to empty.
pub fn filter_by_date(frame: &Frame, start: NaiveDateTime, end: NaiveDateTime) -> Frame {
    let Some(idx) = frame.column_index(DATE_COLUMN) else {
        return Frame {
            columns: frame.columns.clone(),
            rows: Vec::new(),
        };
    };

    let rows = frame
        .rows
        .iter()
        .filter(|row| match &row[idx] {
            Value::Timestamp(ts) => *ts >= start && *ts <= end,
            _ => false,
        })
        .cloned()
        .collect();

    Frame {
        columns: frame.columns.clone(),
        rows,
    }
}

/// Min and max `Date` over the frame — the default interval on first render.
///
/// `None` when there is no `Date` column or no non-null dates.
pub fn date_bounds(frame: &Frame) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let idx = frame.column_index(DATE_COLUMN)?;

    let mut min: Option<NaiveDateTime> = None;
    let mut max: Option<NaiveDateTime> = None;
    for row in &frame.rows {
        if let Value::Timestamp(ts) = &row[idx] {
            min = Some(min.map_or(*ts, |m| m.min(*ts)));
            max = Some(max.map_or(*ts, |m| m.max(*ts)));
        }
    }

    Some((min?, max?))
}

/// Distinct calendar dates present in the `Date` column, ascending.
///
/// This is the domain of the TUI's interval selector: the start/end cursors
/// move over these dates rather than over free-form timestamps.
pub fn unique_dates(frame: &Frame) -> Vec<NaiveDate> {
    let Some(idx) = frame.column_index(DATE_COLUMN) else {
        return Vec::new();
    };

    let mut dates: Vec<NaiveDate> = frame
        .rows
        .iter()
        .filter_map(|row| match &row[idx] {
            Value::Timestamp(ts) => Some(ts.date()),
            _ => None,
        })
        .collect();
    dates.sort();
    dates.dedup();
    dates
}

/// Expand a closed calendar-date interval to the timestamp interval covering
/// those whole days.
pub fn day_interval(start: NaiveDate, end: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (
        start.and_hms_opt(0, 0, 0).expect("midnight is always valid"),
        end.and_hms_opt(23, 59, 59).expect("end of day is always valid"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_frame_from_reader;

    fn ten_day_frame() -> Frame {
        let mut csv = String::from("Date,Close,Volume\n");
        for day in 1..=10 {
            csv.push_str(&format!("2024-01-{day:02},{},{}\n", 100.0 + day as f64, 1000 * day));
        }
        load_frame_from_reader(csv.as_bytes(), "test.csv").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn inclusive_both_ends() {
        let frame = ten_day_frame();
        let (start, end) = day_interval(day(3), day(5));
        let filtered = filter_by_date(&frame, start, end);

        assert_eq!(filtered.n_rows(), 3);
        let dates = unique_dates(&filtered);
        assert_eq!(dates, vec![day(3), day(4), day(5)]);
    }

    #[test]
    fn subset_property() {
        let frame = ten_day_frame();
        let (start, end) = day_interval(day(2), day(8));
        let filtered = filter_by_date(&frame, start, end);

        // Every filtered row appears (identically) in the source frame.
        for row in &filtered.rows {
            assert!(frame.rows.contains(row));
        }
    }

    #[test]
    fn identity_at_full_range_and_order_preserved() {
        let frame = ten_day_frame();
        let (min, max) = date_bounds(&frame).unwrap();
        let filtered = filter_by_date(&frame, min, max);

        assert_eq!(filtered, frame);
    }

    #[test]
    fn inverted_interval_is_empty_not_an_error() {
        let frame = ten_day_frame();
        let (start, _) = day_interval(day(8), day(8));
        let (_, end) = day_interval(day(2), day(2));
        let filtered = filter_by_date(&frame, start, end);

        assert!(filtered.is_empty());
        assert_eq!(filtered.columns, frame.columns);
    }

    #[test]
    fn null_dates_never_match() {
        let frame = load_frame_from_reader(
            "Date,Close\n2024-01-01,1.0\n,2.0\n".as_bytes(),
            "test.csv",
        )
        .unwrap();
        let (min, max) = date_bounds(&frame).unwrap();
        let filtered = filter_by_date(&frame, min, max);
        assert_eq!(filtered.n_rows(), 1);
    }

    #[test]
    fn bounds_none_without_dates() {
        let frame = load_frame_from_reader("Close\n1.0\n".as_bytes(), "test.csv").unwrap();
        assert!(date_bounds(&frame).is_none());
        assert!(unique_dates(&frame).is_empty());
    }
}
