//! Pure calendar-grid and month-arithmetic functions.
//!
//! Everything here is a pure function of `(year, month[, day])` except
//! [`is_today`], which compares against an injected [`Clock`]. The calendar
//! widget recomputes its grid from these on every render; nothing in this
//! module is persisted.
//!
//! Inputs are assumed pre-validated at the boundary (worker input parsing):
//! month must be in `1..=12` and year in `1..=9999`. Violations are
//! programmer errors and the functions assert.

use crate::clock::Clock;
use chrono::{Datelike, NaiveDate};

/// Rows in the default month grid. Six weeks covers any Gregorian month
/// (offset up to 6 + 31 days = 37 cells ≤ 42).
pub const GRID_ROWS: usize = 6;

/// Columns in the month grid — one per weekday, Sunday first.
pub const GRID_COLS: usize = 7;

/// One cell of the month grid.
///
/// `day` is always populated by [`build_grid`]; it is optional so renderers
/// can blank out-of-month cells instead of showing the adjacent month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarGridCell {
    /// Day-of-month number shown in this cell.
    pub day: Option<u32>,
    /// `true` when the cell belongs to the displayed month.
    pub in_current_month: bool,
}

fn assert_valid(year: i32, month: u32) {
    assert!((1..=12).contains(&month), "month out of range: {month}");
    assert!((1..=9999).contains(&year), "year out of range: {year}");
}

/// Gregorian leap-year rule: divisible by 4, except centuries, except
/// multiples of 400.
#[must_use]
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in the given month.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    assert_valid(year, month);
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => unreachable!("month validated above"),
    }
}

/// Weekday offset of day 1 of the month, in `[0, 6]` with 0 = Sunday.
#[must_use]
pub fn first_weekday_offset(year: i32, month: u32) -> u32 {
    assert_valid(year, month);
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| unreachable!("date validated above"));
    first.weekday().num_days_from_sunday()
}

/// Build the default 6×7 month grid.
///
/// Cells before day 1 carry the tail of the previous month, cells after the
/// last day carry the head of the next month; both are flagged
/// `in_current_month = false`. The result is always exactly
/// [`GRID_ROWS`] × [`GRID_COLS`] cells.
#[must_use]
pub fn build_grid(year: i32, month: u32) -> Vec<Vec<CalendarGridCell>> {
    build_grid_sized(year, month, GRID_ROWS)
}

/// Build a month grid with an explicit row count.
///
/// If the month needs more than `rows` weeks, current-month days that fall
/// beyond the last cell are silently truncated — the grid never grows.
#[must_use]
pub fn build_grid_sized(year: i32, month: u32, rows: usize) -> Vec<Vec<CalendarGridCell>> {
    assert_valid(year, month);

    let offset = first_weekday_offset(year, month) as usize;
    let current_days = days_in_month(year, month);
    let (prev_year, prev_month) = previous_month(year, month);
    let prev_days = days_in_month(prev_year, prev_month);

    let total = rows * GRID_COLS;
    let mut cells = Vec::with_capacity(total);

    for index in 0..total {
        let cell = if index < offset {
            // Tail of the previous month, in order.
            CalendarGridCell {
                day: Some(prev_days - (offset - index - 1) as u32),
                in_current_month: false,
            }
        } else if index < offset + current_days as usize {
            CalendarGridCell {
                day: Some((index - offset + 1) as u32),
                in_current_month: true,
            }
        } else {
            CalendarGridCell {
                day: Some((index - offset - current_days as usize + 1) as u32),
                in_current_month: false,
            }
        };
        cells.push(cell);
    }

    cells
        .chunks(GRID_COLS)
        .map(<[CalendarGridCell]>::to_vec)
        .collect()
}

/// The month after `(year, month)`, wrapping December into January.
#[must_use]
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    assert_valid(year, month);
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// The month before `(year, month)`, wrapping January into December.
#[must_use]
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    assert_valid(year, month);
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// `true` when `(year, month, day)` is the clock's current local date.
#[must_use]
pub fn is_today(clock: &dyn Clock, year: i32, month: u32, day: u32) -> bool {
    assert_valid(year, month);
    let today = clock.today();
    today.year() == year && today.month() == month && today.day() == day
}
