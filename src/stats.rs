//! Statistics Aggregator: per-schedule counts and hour totals.
//!
//! Consumes a schedule's 6×7 grid flattened in (week, day) order. All
//! arithmetic is in minutes since the shift-day's midnight; an end time
//! numerically before its start rolls into the next day, so a rolled end
//! past 1440 means the shift crosses midnight. Hour totals are rounded to
//! one decimal only at emission.

use crate::schedule::{ScheduleRecord, ScheduleStore, Weekday};
use chrono::{NaiveTime, Timelike};
use serde::Serialize;

const DAY_MIN: i64 = 24 * 60;

/// One statistics row per schedule.
///
/// `points` belongs to a downstream ranking feature and is always emitted
/// zero-initialized here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduleStats {
    pub name: String,

    // ── Counts ────────────────────────────────────────────────────────────
    /// Days with a real shift (distinct start and end).
    pub shift_count: usize,
    /// Shifts ending before 16:00 with a start before 12:00.
    pub early_count: usize,
    /// Early shifts starting before 06:00.
    pub before_six_count: usize,
    /// Shifts ending 16:00 or later (rolled end within the evening window).
    pub afternoon_count: usize,
    /// Afternoon shifts whose end falls before 20:00.
    pub afternoon_before_20_count: usize,
    /// Shifts whose rolled end passes 03:00 the next day.
    pub night_count: usize,
    /// Days contributing weekend time.
    pub weekend_day_count: usize,

    // ── Hour totals, rounded to one decimal ───────────────────────────────
    pub weekend_hours: f64,
    pub weekend_daytime_hours: f64,
    pub weekend_afternoon_hours: f64,
    pub weekend_night_hours: f64,

    /// Owned by the downstream ranking feature; always 0 here.
    pub points: u32,
}

/// Aggregate statistics for every schedule in a store.
pub fn aggregate_store(store: &ScheduleStore) -> Vec<ScheduleStats> {
    store.schedules.iter().map(aggregate).collect()
}

/// Aggregate one schedule's days in (week, day) order.
pub fn aggregate(schedule: &ScheduleRecord) -> ScheduleStats {
    let mut acc = Accumulator::default();
    for (_, day) in schedule.days_in_order() {
        let (Some(start), Some(end)) = (day.start, day.end) else {
            continue;
        };
        if start == end {
            continue;
        }
        acc.add_shift(day.weekday, minutes(start), minutes(end));
    }
    acc.emit(schedule.name.clone())
}

fn minutes(t: NaiveTime) -> i64 {
    t.hour() as i64 * 60 + t.minute() as i64
}

fn round_hours(min: i64) -> f64 {
    (min as f64 / 60.0 * 10.0).round() / 10.0
}

#[derive(Default)]
struct Accumulator {
    shift: usize,
    early: usize,
    before_six: usize,
    afternoon: usize,
    afternoon_before_20: usize,
    night: usize,
    weekend_days: usize,
    weekend_min: i64,
    weekend_day_min: i64,
    weekend_aft_min: i64,
    weekend_night_min: i64,
}

impl Accumulator {
    fn add_shift(&mut self, weekday: Weekday, start: i64, raw_end: i64) {
        // Roll an end numerically before its start into the next day.
        let end = if raw_end < start { raw_end + DAY_MIN } else { raw_end };
        let duration = end - start;
        debug_assert!(duration > 0);

        self.shift += 1;

        // Early: done before 16:00, started before noon.
        if end < 16 * 60 && start < 12 * 60 {
            self.early += 1;
            if start < 6 * 60 {
                self.before_six += 1;
            }
        }

        // Afternoon: ends 16:00 or later (a midnight-crossing end always
        // qualifies), within the evening window up to 04:00 next day.
        if end >= 16 * 60 && end < DAY_MIN + 4 * 60 {
            self.afternoon += 1;
            if end < 20 * 60 {
                self.afternoon_before_20 += 1;
            }
        }

        // Night: rolled end past 03:00 next day.
        if end > DAY_MIN + 3 * 60 {
            self.night += 1;
        }

        match weekday {
            Weekday::Friday => {
                // Only the portion spilling into Saturday is weekend time.
                if end > DAY_MIN {
                    let portion = end - DAY_MIN;
                    self.weekend_min += portion;
                    self.weekend_night_min += portion;
                    if portion > 0 {
                        self.weekend_days += 1;
                    }
                }
            }
            Weekday::Saturday => {
                self.weekend_min += duration;
                self.weekend_days += 1;
                if start < 14 * 60 {
                    self.weekend_day_min += duration;
                }
                if start > 16 * 60 {
                    self.weekend_aft_min += duration;
                }
                if end > DAY_MIN {
                    self.weekend_night_min += end - DAY_MIN;
                }
            }
            Weekday::Sunday => {
                self.weekend_days += 1;
                if end > DAY_MIN {
                    // Crossing into Monday: only the pre-midnight portion.
                    let portion = DAY_MIN - start;
                    self.weekend_min += portion;
                    if start > 16 * 60 {
                        self.weekend_aft_min += portion;
                    }
                } else {
                    self.weekend_min += duration;
                    if start < 14 * 60 {
                        self.weekend_day_min += duration;
                    }
                    if start > 16 * 60 {
                        self.weekend_aft_min += duration;
                    }
                }
            }
            _ => {}
        }
    }

    fn emit(self, name: String) -> ScheduleStats {
        ScheduleStats {
            name,
            shift_count: self.shift,
            early_count: self.early,
            before_six_count: self.before_six,
            afternoon_count: self.afternoon,
            afternoon_before_20_count: self.afternoon_before_20,
            night_count: self.night,
            weekend_day_count: self.weekend_days,
            weekend_hours: round_hours(self.weekend_min),
            weekend_daytime_hours: round_hours(self.weekend_day_min),
            weekend_afternoon_hours: round_hours(self.weekend_aft_min),
            weekend_night_hours: round_hours(self.weekend_night_min),
            points: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Cell;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn schedule_with(shifts: &[(Cell, (u32, u32), (u32, u32))]) -> ScheduleRecord {
        let mut s = ScheduleRecord::new("E14");
        for &(cell, (sh, sm), (eh, em)) in shifts {
            let d = s.day_mut(cell);
            d.start = Some(t(sh, sm));
            d.end = Some(t(eh, em));
        }
        s
    }

    #[test]
    fn shift_count_equals_real_shifts() {
        let mut s = schedule_with(&[
            (Cell::new(1, 1), (7, 0), (15, 0)),
            (Cell::new(2, 3), (14, 0), (22, 0)),
        ]);
        // start == end is not a shift
        let d = s.day_mut(Cell::new(3, 1));
        d.start = Some(t(8, 0));
        d.end = Some(t(8, 0));

        let stats = aggregate(&s);
        assert_eq!(stats.shift_count, 2);
        assert_eq!(stats.points, 0);
    }

    #[test]
    fn early_shift_counts_with_before_six_subcount() {
        let s = schedule_with(&[
            (Cell::new(1, 1), (5, 30), (13, 30)),
            (Cell::new(1, 2), (7, 0), (15, 0)),
        ]);
        let stats = aggregate(&s);
        assert_eq!(stats.early_count, 2);
        assert_eq!(stats.before_six_count, 1);
    }

    #[test]
    fn afternoon_windows_and_before_20_subcount() {
        let s = schedule_with(&[
            (Cell::new(1, 1), (11, 0), (19, 0)),  // afternoon, ends before 20
            (Cell::new(1, 2), (14, 0), (22, 30)), // afternoon
            (Cell::new(1, 3), (19, 0), (2, 0)),   // crossing → afternoon
            (Cell::new(1, 4), (22, 0), (6, 0)),   // rolled end 06:00 > 04:00 window
        ]);
        let stats = aggregate(&s);
        assert_eq!(stats.afternoon_count, 3);
        assert_eq!(stats.afternoon_before_20_count, 1);
    }

    #[test]
    fn night_requires_rolled_end_past_three() {
        let s = schedule_with(&[
            (Cell::new(1, 1), (19, 0), (2, 0)), // ends 02:00 → not night
            (Cell::new(1, 2), (22, 0), (6, 0)), // ends 06:00 → night
        ]);
        let stats = aggregate(&s);
        assert_eq!(stats.night_count, 1);
    }

    #[test]
    fn saturday_evening_shift_is_all_afternoon_weekend() {
        // Spec'd example: Saturday 22:00→06:00 gives 8.0 weekend hours,
        // all in the afternoon/evening bucket, zero daytime, 1 weekend day.
        let s = schedule_with(&[(Cell::new(1, 6), (22, 0), (6, 0))]);
        let stats = aggregate(&s);
        assert_eq!(stats.weekend_hours, 8.0);
        assert_eq!(stats.weekend_afternoon_hours, 8.0);
        assert_eq!(stats.weekend_daytime_hours, 0.0);
        assert_eq!(stats.weekend_day_count, 1);
        // Post-midnight portion: 6 hours of weekend night.
        assert_eq!(stats.weekend_night_hours, 6.0);
    }

    #[test]
    fn friday_contributes_only_post_midnight_portion() {
        let s = schedule_with(&[
            (Cell::new(1, 5), (22, 0), (3, 30)), // 3.5 h into Saturday
            (Cell::new(2, 5), (8, 0), (16, 0)),  // day shift: no weekend time
        ]);
        let stats = aggregate(&s);
        assert_eq!(stats.weekend_hours, 3.5);
        assert_eq!(stats.weekend_night_hours, 3.5);
        assert_eq!(stats.weekend_day_count, 1);
    }

    #[test]
    fn saturday_daytime_shift_fills_daytime_bucket() {
        let s = schedule_with(&[(Cell::new(1, 6), (7, 0), (15, 0))]);
        let stats = aggregate(&s);
        assert_eq!(stats.weekend_hours, 8.0);
        assert_eq!(stats.weekend_daytime_hours, 8.0);
        assert_eq!(stats.weekend_afternoon_hours, 0.0);
        assert_eq!(stats.weekend_day_count, 1);
    }

    #[test]
    fn sunday_crossing_contributes_pre_midnight_portion() {
        let s = schedule_with(&[(Cell::new(1, 7), (20, 0), (4, 0))]);
        let stats = aggregate(&s);
        // 20:00 → 24:00 = 4 h, start > 16:00 → afternoon bucket
        assert_eq!(stats.weekend_hours, 4.0);
        assert_eq!(stats.weekend_afternoon_hours, 4.0);
        assert_eq!(stats.weekend_day_count, 1);
    }

    #[test]
    fn sunday_day_shift_contributes_full_duration() {
        let s = schedule_with(&[(Cell::new(1, 7), (8, 0), (15, 30))]);
        let stats = aggregate(&s);
        assert_eq!(stats.weekend_hours, 7.5);
        assert_eq!(stats.weekend_daytime_hours, 7.5);
        assert_eq!(stats.weekend_afternoon_hours, 0.0);
        assert_eq!(stats.weekend_day_count, 1);
    }

    #[test]
    fn rounding_is_one_decimal() {
        // Duration 7h50m on a Saturday = 7.833… → 7.8
        let s = schedule_with(&[(Cell::new(1, 6), (8, 0), (15, 50))]);
        let stats = aggregate(&s);
        assert_eq!(stats.weekend_hours, 7.8);
    }

    #[test]
    fn crossing_duration_is_positive() {
        // Property: once rollover applies, every shift has duration > 0.
        let s = schedule_with(&[(Cell::new(1, 1), (23, 30), (0, 15))]);
        let stats = aggregate(&s);
        assert_eq!(stats.shift_count, 1);
    }

    #[test]
    fn store_aggregation_is_one_row_per_schedule() {
        let mut store = ScheduleStore::default();
        store.push(ScheduleRecord::new("E14"));
        store.push(ScheduleRecord::new("E15"));
        let rows = aggregate_store(&store);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "E14");
        assert_eq!(rows[1].name, "E15");
    }
}
