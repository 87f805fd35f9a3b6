//! Period arithmetic for calendar-aligned windows.
//!
//! Each calculator counts whole calendar periods between a window's anchor
//! and a civil date, finds the instant on a civil date at which the anchor's
//! clock time recurs, and adds whole periods to the anchor. Period boundaries
//! are computed on wall-clock fields and only then attached to the window's
//! zone, so the anchor's clock time is preserved across DST transitions.
//!
//! # Calendar overflow
//!
//! Dates whose day does not exist in the target month roll forward into the
//! next month instead of clamping: January 31 plus one month is March 3 (or
//! March 2 in a leap year). The month correction term in
//! [`MonthPeriodCalculator`] relies on exactly this behaviour.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;

use crate::period::TimePeriod;
use crate::unit::MONTHS_IN_YEAR;
use crate::window::CalendarTimeWindow;

pub(crate) trait PeriodCalculator {
    /// Signed number of whole periods between the window's anchor and `date`.
    /// `date` must already be expressed in the window's zone.
    fn periods_count_diff(&self, window: &CalendarTimeWindow, date: NaiveDate) -> i64;

    /// The instant within the period candidate for `date` at which the
    /// anchor's clock time occurs, if that date is representable.
    fn periods_threshold_at_date(
        &self,
        window: &CalendarTimeWindow,
        date: NaiveDate,
    ) -> Option<DateTime<Tz>>;

    /// Add whole periods to a wall-clock time and attach `tz`. `None` when
    /// the result leaves chrono's range.
    fn add_periods(&self, tz: &Tz, civil: NaiveDateTime, periods: i64) -> Option<DateTime<Tz>>;
}

pub(crate) struct YearPeriodCalculator;

impl PeriodCalculator for YearPeriodCalculator {
    fn periods_count_diff(&self, window: &CalendarTimeWindow, date: NaiveDate) -> i64 {
        i64::from(date.year()) - i64::from(window.anchor().year())
    }

    fn periods_threshold_at_date(
        &self,
        window: &CalendarTimeWindow,
        date: NaiveDate,
    ) -> Option<DateTime<Tz>> {
        let anchor = window.anchor();
        let day = normalized_date(
            i64::from(date.year()),
            i64::from(anchor.month()),
            i64::from(anchor.day()),
        )?;
        Some(resolve_local(&window.time_zone(), &day.and_time(anchor.time())))
    }

    fn add_periods(&self, tz: &Tz, civil: NaiveDateTime, periods: i64) -> Option<DateTime<Tz>> {
        add_to_civil(tz, civil, periods, 0, 0)
    }
}

pub(crate) struct MonthPeriodCalculator;

impl PeriodCalculator for MonthPeriodCalculator {
    fn periods_count_diff(&self, window: &CalendarTimeWindow, date: NaiveDate) -> i64 {
        let anchor = window.anchor();
        (i64::from(date.year()) - i64::from(anchor.year())) * MONTHS_IN_YEAR
            + i64::from(date.month())
            - i64::from(anchor.month())
            + normalized_date_correction(anchor.day(), date)
    }

    fn periods_threshold_at_date(
        &self,
        window: &CalendarTimeWindow,
        date: NaiveDate,
    ) -> Option<DateTime<Tz>> {
        let anchor = window.anchor();
        let month = i64::from(date.month()) + normalized_date_correction(anchor.day(), date);
        let day = normalized_date(i64::from(date.year()), month, i64::from(anchor.day()))?;
        Some(resolve_local(&window.time_zone(), &day.and_time(anchor.time())))
    }

    fn add_periods(&self, tz: &Tz, civil: NaiveDateTime, periods: i64) -> Option<DateTime<Tz>> {
        add_to_civil(tz, civil, 0, periods, 0)
    }
}

pub(crate) struct DayPeriodCalculator;

impl PeriodCalculator for DayPeriodCalculator {
    fn periods_count_diff(&self, window: &CalendarTimeWindow, date: NaiveDate) -> i64 {
        days_between_dates(window.anchor().date(), date)
    }

    fn periods_threshold_at_date(
        &self,
        window: &CalendarTimeWindow,
        date: NaiveDate,
    ) -> Option<DateTime<Tz>> {
        Some(resolve_local(&window.time_zone(), &date.and_time(window.anchor().time())))
    }

    fn add_periods(&self, tz: &Tz, civil: NaiveDateTime, periods: i64) -> Option<DateTime<Tz>> {
        add_to_civil(tz, civil, 0, 0, periods)
    }
}

/// Find the period of `window` that contains `timestamp`, with periods
/// `count` calculator units long.
///
/// Counting is done on civil fields, which truncates toward zero; the
/// correction step turns that into floor division so instants before the
/// anchor land in the right period. Boundaries are offsets from the anchor's
/// wall-clock value, never from its resolved instant, so an anchor inside a
/// DST gap does not drag later boundaries off its clock time. Boundaries
/// beyond chrono's range clamp to `MIN_UTC` / `MAX_UTC`.
pub(crate) fn time_period<C: PeriodCalculator>(
    calculator: &C,
    window: &CalendarTimeWindow,
    count: i64,
    timestamp: DateTime<Utc>,
) -> TimePeriod {
    let tz = window.time_zone();
    let anchor = window.anchor();
    let local_date = timestamp.with_timezone(&tz).date_naive();

    let delta = calculator.periods_count_diff(window, local_date);
    let modulo = delta % count;
    let before_threshold = || {
        calculator
            .periods_threshold_at_date(window, local_date)
            .is_some_and(|threshold| timestamp < threshold.with_timezone(&Utc))
    };
    let correction = if modulo < 0 || (modulo == 0 && before_threshold()) {
        -1
    } else {
        0
    };
    let mut periods = delta / count + correction;

    let boundary = |periods: i64| {
        let offset = periods * count;
        match calculator.add_periods(&tz, anchor, offset) {
            Some(dt) => dt.with_timezone(&Utc),
            None if offset < 0 => DateTime::<Utc>::MIN_UTC,
            None => DateTime::<Utc>::MAX_UTC,
        }
    };

    // Settle on the period with start <= timestamp < end.
    let mut start = boundary(periods);
    while timestamp < start && start > DateTime::<Utc>::MIN_UTC {
        periods -= 1;
        start = boundary(periods);
    }
    let mut end = boundary(periods + 1);
    while end <= timestamp && end < DateTime::<Utc>::MAX_UTC {
        periods += 1;
        start = end;
        end = boundary(periods + 1);
    }

    TimePeriod::new(start, end)
}

/// Correction for anchors on a day that some months lack.
///
/// With an anchor on the 31st, adding one month to January 31 lands on
/// March 3, so March 1..=3 still belong to the period that began in January.
/// Counting months naively would put them one period later.
fn normalized_date_correction(anchor_day: u32, date: NaiveDate) -> i64 {
    let days_in_previous_month =
        days_in_month(i64::from(date.year()), i64::from(date.month()) - 1);
    let anchor_day = i64::from(anchor_day);
    let is_normalized = anchor_day > days_in_previous_month
        && i64::from(date.day()) <= anchor_day - days_in_previous_month;
    if is_normalized {
        -1
    } else {
        0
    }
}

/// Whole days between two civil dates, independent of any zone's DST rules.
fn days_between_dates(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Number of days in `month` of `year`; out-of-range months wrap into the
/// neighbouring years (month 0 is December of the previous year).
fn days_in_month(year: i64, month: i64) -> i64 {
    // Only December borders chrono's range, and it has 31 days.
    normalized_date(year, month + 1, 1)
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| i64::from(last.day()))
}

/// Build a civil date from fields that may be out of range, rolling any
/// overflow forward the way calendar addition does. `None` if the result
/// is outside the range chrono can represent.
fn normalized_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let months = year.checked_mul(MONTHS_IN_YEAR)?.checked_add(month - 1)?;
    let year = i32::try_from(months.div_euclid(MONTHS_IN_YEAR)).ok()?;
    let month = u32::try_from(months.rem_euclid(MONTHS_IN_YEAR) + 1).ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_signed(Duration::try_days(day - 1)?)
}

/// Shift a wall-clock time by whole years, months and days, keeping its
/// clock time, and attach `tz`.
fn add_to_civil(
    tz: &Tz,
    civil: NaiveDateTime,
    years: i64,
    months: i64,
    days: i64,
) -> Option<DateTime<Tz>> {
    let date = normalized_date(
        i64::from(civil.year()).checked_add(years)?,
        i64::from(civil.month()).checked_add(months)?,
        i64::from(civil.day()).checked_add(days)?,
    )?;
    Some(resolve_local(tz, &date.and_time(civil.time())))
}

/// Attach `tz` to a wall-clock time.
///
/// A time repeated by a DST fall-back resolves to its earlier occurrence.
/// A time skipped by a spring-forward gap resolves to the instant the gap
/// ends, the first instant whose wall-clock reading comes after it.
pub(crate) fn resolve_local(tz: &Tz, naive: &NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // No valid wall-clock time follows within chrono's range.
            gap_end(tz, naive).unwrap_or_else(|| tz.from_utc_datetime(naive))
        }
    }
}

/// The transition instant ending the gap that skips `naive`.
///
/// Steps forward in doubling increments until a wall-clock time exists,
/// then bisects back to the first existing second.
fn gap_end(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    let earliest = |t: &NaiveDateTime| tz.from_local_datetime(t).earliest();

    let mut skipped = *naive;
    let mut step = Duration::seconds(1);
    let (mut valid, mut resolved) = loop {
        let candidate = naive.checked_add_signed(step)?;
        if let Some(dt) = earliest(&candidate) {
            break (candidate, dt);
        }
        skipped = candidate;
        step = step.checked_mul(2)?;
    };

    while valid - skipped > Duration::seconds(1) {
        let mid = skipped + Duration::seconds((valid - skipped).num_seconds() / 2);
        match earliest(&mid) {
            Some(dt) => (valid, resolved) = (mid, dt),
            None => skipped = mid,
        }
    }
    Some(resolved)
}

/// The anchor's clock time, dropping sub-second precision.
pub(crate) fn whole_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalized_date_rolls_day_overflow_forward() {
        assert_eq!(normalized_date(2023, 2, 31), Some(date(2023, 3, 3)));
        assert_eq!(normalized_date(2024, 2, 31), Some(date(2024, 3, 2)));
        assert_eq!(normalized_date(2023, 4, 31), Some(date(2023, 5, 1)));
        assert_eq!(normalized_date(2023, 1, 31), Some(date(2023, 1, 31)));
    }

    #[test]
    fn test_normalized_date_wraps_months() {
        assert_eq!(normalized_date(2023, 13, 1), Some(date(2024, 1, 1)));
        assert_eq!(normalized_date(2023, 0, 15), Some(date(2022, 12, 15)));
        assert_eq!(normalized_date(2023, -11, 1), Some(date(2022, 1, 1)));
        assert_eq!(normalized_date(2023, 25, 1), Some(date(2025, 1, 1)));
    }

    #[test]
    fn test_normalized_date_out_of_range() {
        assert_eq!(normalized_date(300_000, 1, 1), None);
        assert_eq!(normalized_date(2023, 1, 400_000_000), None);
        assert_eq!(normalized_date(i64::MAX, 1, 1), None);
    }

    #[test]
    fn test_normalized_date_feb_29_in_non_leap_year() {
        assert_eq!(normalized_date(2023, 2, 29), Some(date(2023, 3, 1)));
        assert_eq!(normalized_date(2024, 2, 29), Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 4), 30);
        // Month 0 is December of the previous year
        assert_eq!(days_in_month(2023, 0), 31);
    }

    #[test]
    fn test_correction_for_late_anchor_day() {
        // Anchor on the 31st, February has 28 days: March 1..=3 are
        // rollovers from January 31 + 1 month.
        assert_eq!(normalized_date_correction(31, date(2023, 3, 1)), -1);
        assert_eq!(normalized_date_correction(31, date(2023, 3, 3)), -1);
        assert_eq!(normalized_date_correction(31, date(2023, 3, 4)), 0);
        // Leap year February has 29 days
        assert_eq!(normalized_date_correction(31, date(2024, 3, 2)), -1);
        assert_eq!(normalized_date_correction(31, date(2024, 3, 3)), 0);
        // Day exists in every month
        assert_eq!(normalized_date_correction(15, date(2023, 3, 1)), 0);
    }

    #[test]
    fn test_days_between_dates_ignores_dst() {
        // US spring forward falls inside this range
        assert_eq!(days_between_dates(date(2026, 3, 7), date(2026, 3, 9)), 2);
        assert_eq!(days_between_dates(date(2026, 3, 9), date(2026, 3, 7)), -2);
    }

    #[test]
    fn test_resolve_local_single() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let naive = date(2026, 1, 15).and_hms_opt(12, 0, 0).unwrap();
        let dt = resolve_local(&tz, &naive);
        assert_eq!(dt.with_timezone(&Utc).hour(), 17);
    }

    #[test]
    fn test_resolve_local_gap_takes_transition_instant() {
        // March 8 2026: New York skips 02:00-03:00
        let tz: Tz = "America/New_York".parse().unwrap();
        let naive = date(2026, 3, 8).and_hms_opt(2, 30, 0).unwrap();
        let dt = resolve_local(&tz, &naive);
        assert_eq!(
            dt.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2026, 3, 8, 7, 0, 0).unwrap()
        );
        assert_eq!(dt.hour(), 3);
        assert_eq!(dt.minute(), 0);
    }

    #[test]
    fn test_resolve_local_skipped_day() {
        // Samoa jumped from 2011-12-29 23:59:59 (UTC-10) to 2011-12-31 (UTC+14)
        let tz: Tz = "Pacific/Apia".parse().unwrap();
        let transition = Utc.with_ymd_and_hms(2011, 12, 30, 10, 0, 0).unwrap();
        for hour in [0, 12, 23] {
            let naive = date(2011, 12, 30).and_hms_opt(hour, 0, 0).unwrap();
            assert_eq!(resolve_local(&tz, &naive).with_timezone(&Utc), transition);
        }
        let last_second = date(2011, 12, 29).and_hms_opt(23, 59, 59).unwrap();
        assert_eq!(
            resolve_local(&tz, &last_second).with_timezone(&Utc),
            transition - Duration::seconds(1)
        );
    }

    #[test]
    fn test_resolve_local_half_hour_gap() {
        // Lord Howe Island moves from +10:30 to +11:00 at 02:00 local
        let tz: Tz = "Australia/Lord_Howe".parse().unwrap();
        let naive = date(2025, 10, 5).and_hms_opt(2, 15, 0).unwrap();
        assert_eq!(
            resolve_local(&tz, &naive).with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 10, 4, 15, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_resolve_local_overlap_takes_earlier() {
        // November 1 2026: New York repeats 01:00-02:00
        let tz: Tz = "America/New_York".parse().unwrap();
        let naive = date(2026, 11, 1).and_hms_opt(1, 30, 0).unwrap();
        let dt = resolve_local(&tz, &naive);
        assert_eq!(
            dt.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2026, 11, 1, 5, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_add_to_civil_preserves_wall_clock_across_dst() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let civil = date(2026, 3, 7).and_hms_opt(9, 0, 0).unwrap();
        let start = add_to_civil(&tz, civil, 0, 0, 0).unwrap();
        let next = add_to_civil(&tz, civil, 0, 0, 1).unwrap();
        assert_eq!(next.hour(), 9);
        assert_eq!(next - start, Duration::hours(23));
    }

    #[test]
    fn test_add_months_rolls_over_month_end() {
        let civil = date(2023, 1, 31).and_hms_opt(0, 0, 0).unwrap();
        let shifted = |months| add_to_civil(&Tz::UTC, civil, 0, months, 0).unwrap().date_naive();
        assert_eq!(shifted(1), date(2023, 3, 3));
        assert_eq!(shifted(-2), date(2022, 12, 1));
    }

    #[test]
    fn test_add_years_from_leap_day() {
        let civil = date(2024, 2, 29).and_hms_opt(0, 0, 0).unwrap();
        let shifted = |years| add_to_civil(&Tz::UTC, civil, years, 0, 0).unwrap().date_naive();
        assert_eq!(shifted(1), date(2025, 3, 1));
        assert_eq!(shifted(4), date(2028, 2, 29));
    }

    #[test]
    fn test_add_to_civil_beyond_range() {
        let civil = date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap();
        assert!(add_to_civil(&Tz::UTC, civil, 0, 0, i64::from(u32::MAX) * 7).is_none());
        assert!(add_to_civil(&Tz::UTC, civil, i64::from(u32::MAX), 0, 0).is_none());
        assert!(add_to_civil(&Tz::UTC, civil, 0, -i64::from(u32::MAX) * 3, 0).is_none());
    }

    #[test]
    fn test_add_to_civil_keeps_clock_time_of_gap_anchor() {
        // The anchor itself is skipped; the next day still starts at 02:30
        let tz: Tz = "America/New_York".parse().unwrap();
        let civil = date(2026, 3, 8).and_hms_opt(2, 30, 0).unwrap();
        let next = add_to_civil(&tz, civil, 0, 0, 1).unwrap();
        assert_eq!(next.hour(), 2);
        assert_eq!(next.minute(), 30);
    }

    #[test]
    fn test_whole_seconds_drops_nanos() {
        let t = NaiveTime::from_hms_nano_opt(10, 11, 12, 500_000_000).unwrap();
        assert_eq!(whole_seconds(t), NaiveTime::from_hms_opt(10, 11, 12).unwrap());
    }
}
