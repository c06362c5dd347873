//! The normalized schedule data model: the unit of output.
//!
//! A [`ScheduleRecord`] is a fully pre-allocated 6-week × 7-day grid. Using
//! fixed-size arrays indexed by bounded week/day integers (instead of nested
//! maps) removes every missing-key path and turns "previous cell in reading
//! order" into a linear index walk — which is exactly what the boundary
//! spillover rules in the assembler need.
//!
//! Serialization follows the canonical consumer shape:
//! `{schedule-name → {week → {day → day-record}}}`.

use crate::geometry::Cell;
use crate::pipeline::markers::MarkerScan;
use chrono::NaiveTime;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::warn;

/// Day of week, Monday-first to match the roster columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Day number 1–7 → weekday.
    pub fn from_day(day: u8) -> Self {
        match day {
            1 => Weekday::Monday,
            2 => Weekday::Tuesday,
            3 => Weekday::Wednesday,
            4 => Weekday::Thursday,
            5 => Weekday::Friday,
            6 => Weekday::Saturday,
            7 => Weekday::Sunday,
            _ => unreachable!("day numbers are bounded 1–7"),
        }
    }

    /// Norwegian display name as printed in the roster header.
    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Monday => "Mandag",
            Weekday::Tuesday => "Tirsdag",
            Weekday::Wednesday => "Onsdag",
            Weekday::Thursday => "Torsdag",
            Weekday::Friday => "Fredag",
            Weekday::Saturday => "Lørdag",
            Weekday::Sunday => "Søndag",
        }
    }
}

impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

fn hhmm<S: Serializer>(t: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
    match t {
        Some(t) => serializer.serialize_str(&t.format("%H:%M").to_string()),
        None => serializer.serialize_none(),
    }
}

/// One day of one week of one schedule. Pre-allocated empty; mutated in
/// place by the assembler and continuation detector, never partially
/// deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRecord {
    pub weekday: Weekday,
    /// Raw time tokens in placement order (0–2; free-day markers included).
    pub times: Vec<String>,
    #[serde(serialize_with = "hhmm")]
    pub start: Option<NaiveTime>,
    #[serde(serialize_with = "hhmm")]
    pub end: Option<NaiveTime>,
    /// Space-joined duty code.
    pub code: String,
    /// This duty feeds into the next day's duty.
    pub is_consecutive_shift: bool,
    /// This duty continues the previous day's duty.
    pub is_consecutive_receiver: bool,
}

impl DayRecord {
    fn empty(day: u8) -> Self {
        Self {
            weekday: Weekday::from_day(day),
            times: Vec::new(),
            start: None,
            end: None,
            code: String::new(),
            is_consecutive_shift: false,
            is_consecutive_receiver: false,
        }
    }

    /// Leading digit run of the duty code, the duty's base number.
    pub fn code_number(&self) -> Option<u64> {
        let digits: String = self.code.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            None
        } else {
            digits.parse().ok()
        }
    }

    /// A real shift occupies the day: distinct start and end present.
    pub fn is_shift(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s != e)
    }

    /// No token was ever placed here.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty() && self.code.is_empty()
    }
}

/// Seven day records, Monday through Sunday.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekRecord {
    pub days: [DayRecord; 7],
}

impl WeekRecord {
    fn empty() -> Self {
        Self {
            days: std::array::from_fn(|i| DayRecord::empty(i as u8 + 1)),
        }
    }
}

impl Serialize for WeekRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7))?;
        for (i, day) in self.days.iter().enumerate() {
            map.serialize_entry(&(i + 1).to_string(), day)?;
        }
        map.end()
    }
}

/// One named schedule: six pre-allocated week records.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRecord {
    pub name: String,
    /// No name run was found on the page; callers normally discard these.
    pub unnamed: bool,
    pub weeks: [WeekRecord; 6],
}

impl ScheduleRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unnamed: false,
            weeks: std::array::from_fn(|_| WeekRecord::empty()),
        }
    }

    /// A schedule whose page carried no discoverable name run; keyed by
    /// page/slot so the store stays collision-free.
    pub fn new_unnamed(page: usize, slot: usize) -> Self {
        let mut s = Self::new(format!("unnamed-p{page}-s{slot}"));
        s.unnamed = true;
        s
    }

    pub fn day(&self, cell: Cell) -> &DayRecord {
        &self.weeks[cell.week as usize - 1].days[cell.day as usize - 1]
    }

    pub fn day_mut(&mut self, cell: Cell) -> &mut DayRecord {
        &mut self.weeks[cell.week as usize - 1].days[cell.day as usize - 1]
    }

    /// All 42 day records in reading order with their cells.
    pub fn days_in_order(&self) -> impl Iterator<Item = (Cell, &DayRecord)> {
        (0..42).map(move |i| {
            let cell = Cell::from_index(i);
            (cell, self.day(cell))
        })
    }

    /// True when no cell holds any token.
    pub fn is_blank(&self) -> bool {
        self.days_in_order().all(|(_, d)| d.is_empty())
    }
}

impl Serialize for ScheduleRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(6))?;
        for (i, week) in self.weeks.iter().enumerate() {
            map.serialize_entry(&(i + 1).to_string(), week)?;
        }
        map.end()
    }
}

/// Ordered list of schedules; the serialization unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleStore {
    pub schedules: Vec<ScheduleRecord>,
}

impl ScheduleStore {
    /// Append a schedule, enforcing name uniqueness. A later page carrying
    /// an already-stored name is skipped (first page wins) and reported
    /// back as `false`.
    pub fn push(&mut self, schedule: ScheduleRecord) -> bool {
        if self.schedules.iter().any(|s| s.name == schedule.name) {
            warn!(name = %schedule.name, "duplicate schedule name, keeping first occurrence");
            return false;
        }
        self.schedules.push(schedule);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ScheduleRecord> {
        self.schedules.iter().find(|s| s.name == name)
    }

    /// Drop unnamed (tagged) schedules.
    pub fn retain_named(&mut self) {
        self.schedules.retain(|s| !s.unnamed);
    }

    /// Apply strike-list marker pairs as continuation flags, matching
    /// duties by code base number rather than geometric adjacency.
    pub fn apply_marker_scan(&mut self, scan: &MarkerScan) {
        for (first, second) in &scan.pairs {
            let (Ok(first), Ok(second)) = (first.parse::<u64>(), second.parse::<u64>()) else {
                continue;
            };
            for schedule in &mut self.schedules {
                for week in &mut schedule.weeks {
                    for day in &mut week.days {
                        match day.code_number() {
                            Some(n) if n == first => day.is_consecutive_shift = true,
                            Some(n) if n == second => day.is_consecutive_receiver = true,
                            _ => {}
                        }
                    }
                }
            }
        }
    }
}

impl Serialize for ScheduleStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.schedules.len()))?;
        for s in &self.schedules {
            map.serialize_entry(&s.name, s)?;
        }
        map.end()
    }
}
