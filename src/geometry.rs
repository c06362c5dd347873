//! Geometry catalog: the static cell rectangles of one roster template.
//!
//! A roster page lays out two schedule slots stacked vertically, each with a
//! name row and six week rows, crossed by seven shared day columns. All
//! constants are calibrated to one fixed document template and live in
//! [`crate::config::TemplateConfig`]; nothing here is auto-detected.
//!
//! Coordinates are top-down page points: y grows downward, matching the
//! printed page. The pdfium extraction layer flips pdfium's bottom-up axis
//! before tokens reach this module.

use serde::{Deserialize, Serialize};

/// A half-open interval `[min, max)` on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f32,
    pub max: f32,
}

impl Band {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Containment test for a point coordinate.
    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v < self.max
    }

    pub fn mid(&self) -> f32 {
        (self.min + self.max) / 2.0
    }
}

/// A cell coordinate within one schedule slot: week 1–6, day 1–7 (Mon=1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub week: u8,
    pub day: u8,
}

impl Cell {
    pub const fn new(week: u8, day: u8) -> Self {
        Self { week, day }
    }

    /// Linear reading-order index 0..42 ((week-1)*7 + day-1).
    pub fn index(&self) -> usize {
        (self.week as usize - 1) * 7 + (self.day as usize - 1)
    }

    pub fn from_index(i: usize) -> Self {
        Self {
            week: (i / 7) as u8 + 1,
            day: (i % 7) as u8 + 1,
        }
    }

    /// The cell preceding this one in reading order: previous day, or the
    /// previous week's Sunday when day = 1. None for (week 1, Monday).
    pub fn pred(&self) -> Option<Cell> {
        match self.index() {
            0 => None,
            i => Some(Cell::from_index(i - 1)),
        }
    }

    /// The cell following this one in reading order: next day, or the next
    /// week's Monday after Sunday. None past (week 6, Sunday).
    pub fn succ(&self) -> Option<Cell> {
        match self.index() {
            i if i + 1 >= 42 => None,
            i => Some(Cell::from_index(i + 1)),
        }
    }

    pub fn is_first(&self) -> bool {
        self.week == 1 && self.day == 1
    }
}

/// Vertical layout of one schedule slot: the name row plus six week rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotGeometry {
    /// The label row above week 1 holding the schedule-name token run.
    pub name_band: Band,
    /// Week 1 through week 6, top to bottom, ordered and non-overlapping.
    pub week_bands: [Band; 6],
}

/// Full per-template cell geometry: two slots × six weeks × seven days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryCatalog {
    pub slots: [SlotGeometry; 2],
    /// Monday through Sunday, left to right, ordered and non-overlapping.
    pub day_columns: [Band; 7],
}

impl GeometryCatalog {
    /// Locate the (slot, cell) containing a token-center point, if any.
    pub fn locate(&self, x: f32, y: f32) -> Option<(usize, Cell)> {
        let day = self.day_for_x(x)?;
        let (slot, week) = self.slot_week_for_y(y)?;
        Some((slot, Cell::new(week, day)))
    }

    /// Day number (1–7) whose column contains x.
    pub fn day_for_x(&self, x: f32) -> Option<u8> {
        self.day_columns
            .iter()
            .position(|b| b.contains(x))
            .map(|i| i as u8 + 1)
    }

    /// (slot index, week number) whose band contains y.
    pub fn slot_week_for_y(&self, y: f32) -> Option<(usize, u8)> {
        for (slot, geom) in self.slots.iter().enumerate() {
            if let Some(w) = geom.week_bands.iter().position(|b| b.contains(y)) {
                return Some((slot, w as u8 + 1));
            }
        }
        None
    }

    /// Slot whose name band contains y, if any.
    pub fn name_slot_for_y(&self, y: f32) -> Option<usize> {
        self.slots.iter().position(|g| g.name_band.contains(y))
    }

    /// Horizontal extent covered by the day columns as a whole.
    pub fn day_extent(&self) -> Band {
        Band::new(self.day_columns[0].min, self.day_columns[6].max)
    }

    /// Whether a token ending at `right` spills past `day`'s column into the
    /// next one. Always false for Sunday at the page edge; the caller wraps
    /// to the next week's Monday itself.
    pub fn crosses_next_day(&self, right: f32, day: u8) -> bool {
        let col = self.day_columns[day as usize - 1];
        right > col.max
    }

    /// Check band ordering invariants (ordered, non-overlapping per axis).
    pub fn validate(&self) -> Result<(), String> {
        validate_axis("day columns", &self.day_columns)?;
        for (i, slot) in self.slots.iter().enumerate() {
            validate_axis(&format!("slot {i} week bands"), &slot.week_bands)?;
            if slot.name_band.max > slot.week_bands[0].min {
                return Err(format!("slot {i}: name band overlaps week 1"));
            }
        }
        Ok(())
    }
}

fn validate_axis(what: &str, bands: &[Band]) -> Result<(), String> {
    for b in bands {
        if b.min >= b.max {
            return Err(format!("{what}: empty band {b:?}"));
        }
    }
    for pair in bands.windows(2) {
        if pair[0].max > pair[1].min {
            return Err(format!("{what}: overlapping bands {pair:?}"));
        }
    }
    Ok(())
}
