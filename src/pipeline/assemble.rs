//! Cell Assembler and Continuation Detector.
//!
//! Classified tokens arrive in reading order; this module resolves the
//! boundary ambiguities the roster template produces when a token is printed
//! straddling two cells:
//!
//! * a start/end time pair visually split across a cell boundary,
//! * two `H:MM` times fused into one token crossing into the next column,
//! * a duty-code fragment spilling into the cell after its code.
//!
//! All placements are order-dependent mutations of a pre-allocated 6×7 grid,
//! expressed as a single pass over the sorted tokens so each tie-break rule
//! stays unit-testable without full-page geometry. Tokens no rule accepts
//! are dropped silently, never an error.

use crate::config::TemplateConfig;
use crate::geometry::Cell;
use crate::pipeline::classify::SlotTokens;
use crate::schedule::ScheduleRecord;
use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// Two concatenated clock times fused into one token, e.g. "15:3023:10".
static RE_DOUBLE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}:\d{2})(\d{1,2}:\d{2})$").unwrap());

/// Build one schedule from one slot's classified tokens.
pub fn assemble_slot(
    slot: &SlotTokens,
    page: usize,
    slot_idx: usize,
    config: &TemplateConfig,
) -> ScheduleRecord {
    let mut schedule = match &slot.name {
        Some(name) => ScheduleRecord::new(name.clone()),
        None => ScheduleRecord::new_unnamed(page, slot_idx),
    };

    place_times(&mut schedule, slot, config);
    derive_start_end(&mut schedule);
    place_codes(&mut schedule, slot, config);
    mark_consecutive(&mut schedule);

    schedule
}

// ── Time placement ───────────────────────────────────────────────────────

fn place_times(schedule: &mut ScheduleRecord, slot: &SlotTokens, config: &TemplateConfig) {
    for (cell, token) in &slot.times {
        if let Some((first, second)) = split_concatenated(&token.text) {
            if config.geometry.crosses_next_day(token.right, cell.day) {
                // The fused token spills into the next column: first half
                // belongs here, second half to the next day (next week's
                // Monday after Sunday). The second half bypasses the
                // lookbehind, which would otherwise pull it straight back
                // into the current cell.
                place_time(schedule, *cell, &first, config);
                match cell.succ() {
                    Some(next) => {
                        let day = schedule.day_mut(next);
                        if day.times.len() >= 2 {
                            trace!(%second, ?next, "cell already holds two time tokens, dropped");
                        } else {
                            day.times.push(second);
                        }
                    }
                    None => trace!(%second, "split time past week 6 Sunday, dropped"),
                }
            } else {
                place_time(schedule, *cell, &first, config);
                place_time(schedule, *cell, &second, config);
            }
        } else {
            place_time(schedule, *cell, &token.text, config);
        }
    }
}

/// Place one time token, applying the boundary-spillover lookbehind: a cell
/// whose predecessor holds exactly one time token receives the new token on
/// the predecessor's behalf (reassembling a start/end pair split across the
/// boundary), unless the predecessor is a free day.
fn place_time(schedule: &mut ScheduleRecord, cell: Cell, text: &str, config: &TemplateConfig) {
    let target = if cell.is_first() || is_free_day(text, config) {
        cell
    } else {
        match cell.pred() {
            Some(pred) => {
                let p = schedule.day(pred);
                if p.times.iter().any(|t| is_free_day(t, config)) {
                    cell
                } else if p.times.len() == 1 {
                    pred
                } else {
                    cell
                }
            }
            None => cell,
        }
    };

    let day = schedule.day_mut(target);
    if day.times.len() >= 2 {
        trace!(%text, ?target, "cell already holds two time tokens, dropped");
        return;
    }
    day.times.push(text.to_string());
}

/// Split a fused "H:MMH:MM" token into its two clock times.
fn split_concatenated(text: &str) -> Option<(String, String)> {
    RE_DOUBLE_TIME
        .captures(text)
        .map(|c| (c[1].to_string(), c[2].to_string()))
}

fn is_free_day(text: &str, config: &TemplateConfig) -> bool {
    config.free_day_markers.iter().any(|m| m == text)
}

/// Parse an "H:MM" token; free-day markers and junk yield None.
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M").ok()
}

fn derive_start_end(schedule: &mut ScheduleRecord) {
    for week in &mut schedule.weeks {
        for day in &mut week.days {
            match day.times.len() {
                2 => {
                    day.start = parse_clock(&day.times[0]);
                    day.end = parse_clock(&day.times[1]);
                }
                1 => day.start = parse_clock(&day.times[0]),
                _ => {}
            }
        }
    }
}

// ── Code placement ───────────────────────────────────────────────────────

fn place_codes(schedule: &mut ScheduleRecord, slot: &SlotTokens, config: &TemplateConfig) {
    for (cell, token) in &slot.codes {
        let text = token.text.trim();
        if text.is_empty() {
            continue;
        }

        // Cross-boundary code continuation: a short numeric fragment whose
        // predecessor's code ends in a recognized suffix family belongs to
        // that code, not to this (time-less) cell.
        if text.len() <= 3 && text.chars().all(|c| c.is_ascii_digit()) {
            if let Some(pred) = cell.pred() {
                let own = schedule.day(*cell);
                let prior = schedule.day(pred);
                if own.times.is_empty()
                    && !prior.code.is_empty()
                    && config.continuation.continues(&prior.code)
                {
                    append_code(schedule, pred, text);
                    continue;
                }
            }
        }

        // Single-character numeric tokens are print noise unless they are
        // the very first token placed for their cell.
        if text.len() == 1 && text.chars().all(|c| c.is_ascii_digit()) {
            let day = schedule.day(*cell);
            if !(day.code.is_empty() && day.times.is_empty()) {
                trace!(%text, ?cell, "single-digit noise token dropped");
                continue;
            }
        }

        // Boundary spillover: a code printed just past its cell belongs to
        // the predecessor when that cell has a full time pair but no code
        // yet (covers both the Monday→prior-Sunday case and the in-week
        // predecessor case; `pred()` wraps across the week boundary).
        let mut target = *cell;
        if let Some(pred) = cell.pred() {
            let p = schedule.day(pred);
            if p.times.len() == 2 && p.code.is_empty() {
                target = pred;
            }
        }
        append_code(schedule, target, text);
    }
}

fn append_code(schedule: &mut ScheduleRecord, cell: Cell, text: &str) {
    let day = schedule.day_mut(cell);
    if day.code.is_empty() {
        day.code = text.to_string();
    } else {
        day.code.push(' ');
        day.code.push_str(text);
    }
}

// ── Continuation detection ───────────────────────────────────────────────

/// Flag numerically consecutive duty codes on adjacent days: when day B's
/// code base number equals day A's + 1 (A, B adjacent in reading order),
/// A feeds into B.
pub fn mark_consecutive(schedule: &mut ScheduleRecord) {
    for i in 0..41 {
        let a = Cell::from_index(i);
        let b = Cell::from_index(i + 1);
        let (Some(na), Some(nb)) = (schedule.day(a).code_number(), schedule.day(b).code_number())
        else {
            continue;
        };
        if nb == na + 1 {
            schedule.day_mut(a).is_consecutive_shift = true;
            schedule.day_mut(b).is_consecutive_receiver = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateConfig;
    use crate::pipeline::extract::PositionedToken;

    fn cfg() -> TemplateConfig {
        TemplateConfig::default()
    }

    /// A token positioned inside the given cell's rectangle (slot 0).
    fn cell_token(cfg: &TemplateConfig, cell: Cell, text: &str) -> (Cell, PositionedToken) {
        let col = cfg.geometry.day_columns[cell.day as usize - 1];
        let band = cfg.geometry.slots[0].week_bands[cell.week as usize - 1];
        (
            cell,
            PositionedToken {
                text: text.into(),
                page: 0,
                left: col.mid() - 12.0,
                right: col.mid() + 12.0,
                top: band.mid() - 4.0,
                bottom: band.mid() + 4.0,
            },
        )
    }

    /// Same, but with the token's right edge pushed past the column border.
    fn crossing_token(cfg: &TemplateConfig, cell: Cell, text: &str) -> (Cell, PositionedToken) {
        let (cell, mut t) = cell_token(cfg, cell, text);
        t.right = cfg.geometry.day_columns[cell.day as usize - 1].max + 10.0;
        (cell, t)
    }

    fn slot(times: Vec<(Cell, PositionedToken)>, codes: Vec<(Cell, PositionedToken)>) -> SlotTokens {
        SlotTokens {
            name: Some("E14".into()),
            times,
            codes,
        }
    }

    #[test]
    fn simple_pair_sets_start_and_end() {
        let cfg = cfg();
        let s = assemble_slot(
            &slot(
                vec![
                    cell_token(&cfg, Cell::new(1, 2), "06:30"),
                    cell_token(&cfg, Cell::new(1, 2), "14:00"),
                ],
                vec![cell_token(&cfg, Cell::new(1, 2), "3006")],
            ),
            0,
            0,
            &cfg,
        );
        let d = s.day(Cell::new(1, 2));
        assert_eq!(d.times, vec!["06:30", "14:00"]);
        assert_eq!(d.start, NaiveTime::from_hms_opt(6, 30, 0));
        assert_eq!(d.end, NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(d.code, "3006");
        assert!(d.is_shift());
    }

    #[test]
    fn lone_time_sets_only_start() {
        let cfg = cfg();
        let s = assemble_slot(
            &slot(vec![cell_token(&cfg, Cell::new(1, 1), "08:00")], vec![]),
            0,
            0,
            &cfg,
        );
        let d = s.day(Cell::new(1, 1));
        assert_eq!(d.start, NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(d.end, None);
        assert!(!d.is_shift());
    }

    #[test]
    fn boundary_time_appends_to_predecessor_with_one_token() {
        let cfg = cfg();
        // End time printed across the Tuesday border: Tuesday's classifier
        // cell is (1,3) but Monday holds only a start.
        let s = assemble_slot(
            &slot(
                vec![
                    cell_token(&cfg, Cell::new(1, 2), "22:00"),
                    cell_token(&cfg, Cell::new(1, 3), "06:00"),
                ],
                vec![],
            ),
            0,
            0,
            &cfg,
        );
        let mon = s.day(Cell::new(1, 2));
        assert_eq!(mon.times, vec!["22:00", "06:00"]);
        assert!(s.day(Cell::new(1, 3)).times.is_empty());
    }

    #[test]
    fn free_day_predecessor_blocks_spillover() {
        let cfg = cfg();
        let s = assemble_slot(
            &slot(
                vec![
                    cell_token(&cfg, Cell::new(1, 2), "Fri"),
                    cell_token(&cfg, Cell::new(1, 3), "08:00"),
                ],
                vec![],
            ),
            0,
            0,
            &cfg,
        );
        assert_eq!(s.day(Cell::new(1, 2)).times, vec!["Fri"]);
        assert_eq!(s.day(Cell::new(1, 3)).times, vec!["08:00"]);
        // Free-day marker never parses as a clock time
        assert_eq!(s.day(Cell::new(1, 2)).start, None);
    }

    #[test]
    fn week_boundary_spillover_reaches_previous_sunday() {
        let cfg = cfg();
        let s = assemble_slot(
            &slot(
                vec![
                    cell_token(&cfg, Cell::new(1, 7), "22:15"),
                    cell_token(&cfg, Cell::new(2, 1), "06:45"),
                ],
                vec![],
            ),
            0,
            0,
            &cfg,
        );
        assert_eq!(s.day(Cell::new(1, 7)).times, vec!["22:15", "06:45"]);
        assert!(s.day(Cell::new(2, 1)).times.is_empty());
    }

    #[test]
    fn fused_token_splits_within_cell() {
        let cfg = cfg();
        let s = assemble_slot(
            &slot(vec![cell_token(&cfg, Cell::new(1, 1), "06:3014:00")], vec![]),
            0,
            0,
            &cfg,
        );
        let d = s.day(Cell::new(1, 1));
        assert_eq!(d.times, vec!["06:30", "14:00"]);
        assert_eq!(d.end, NaiveTime::from_hms_opt(14, 0, 0));
    }

    #[test]
    fn fused_crossing_token_moves_second_half_to_next_day() {
        let cfg = cfg();
        let s = assemble_slot(
            &slot(
                vec![crossing_token(&cfg, Cell::new(1, 3), "14:0015:00")],
                vec![],
            ),
            0,
            0,
            &cfg,
        );
        assert_eq!(s.day(Cell::new(1, 3)).times, vec!["14:00"]);
        assert_eq!(s.day(Cell::new(1, 4)).times, vec!["15:00"]);
    }

    #[test]
    fn fused_crossing_sunday_wraps_to_next_monday() {
        let cfg = cfg();
        let s = assemble_slot(
            &slot(
                vec![crossing_token(&cfg, Cell::new(2, 7), "23:0023:30")],
                vec![],
            ),
            0,
            0,
            &cfg,
        );
        assert_eq!(s.day(Cell::new(2, 7)).times, vec!["23:00"]);
        assert_eq!(s.day(Cell::new(3, 1)).times, vec!["23:30"]);
    }

    #[test]
    fn fused_crossing_second_half_dropped_when_next_day_full() {
        let cfg = cfg();
        let s = assemble_slot(
            &slot(
                vec![
                    cell_token(&cfg, Cell::new(1, 4), "07:00"),
                    cell_token(&cfg, Cell::new(1, 4), "15:30"),
                    crossing_token(&cfg, Cell::new(1, 3), "14:0015:00"),
                ],
                vec![],
            ),
            0,
            0,
            &cfg,
        );
        assert_eq!(s.day(Cell::new(1, 3)).times, vec!["14:00"]);
        assert_eq!(s.day(Cell::new(1, 4)).times, vec!["07:00", "15:30"]);
    }

    #[test]
    fn code_spillover_targets_predecessor_with_full_time_pair() {
        let cfg = cfg();
        // Sunday has its time pair; the code printed at the Monday boundary
        // belongs to Sunday.
        let s = assemble_slot(
            &slot(
                vec![
                    cell_token(&cfg, Cell::new(1, 7), "22:00"),
                    cell_token(&cfg, Cell::new(1, 7), "06:00"),
                ],
                vec![cell_token(&cfg, Cell::new(2, 1), "3010")],
            ),
            0,
            0,
            &cfg,
        );
        assert_eq!(s.day(Cell::new(1, 7)).code, "3010");
        assert!(s.day(Cell::new(2, 1)).code.is_empty());
    }

    #[test]
    fn multi_token_code_joins_with_spaces() {
        let cfg = cfg();
        let s = assemble_slot(
            &slot(
                vec![
                    cell_token(&cfg, Cell::new(1, 4), "07:00"),
                    cell_token(&cfg, Cell::new(1, 4), "15:00"),
                ],
                vec![
                    cell_token(&cfg, Cell::new(1, 4), "3006"),
                    cell_token(&cfg, Cell::new(1, 4), "D"),
                ],
            ),
            0,
            0,
            &cfg,
        );
        assert_eq!(s.day(Cell::new(1, 4)).code, "3006 D");
    }

    #[test]
    fn suffix_family_pulls_numeric_fragment_back() {
        let cfg = cfg();
        // "3006 D" on Thursday, stray "12" on time-less Friday: the default
        // suffix family ends in "D", so the fragment continues that code.
        let s = assemble_slot(
            &slot(
                vec![
                    cell_token(&cfg, Cell::new(1, 4), "07:00"),
                    cell_token(&cfg, Cell::new(1, 4), "15:00"),
                ],
                vec![
                    cell_token(&cfg, Cell::new(1, 4), "3006"),
                    cell_token(&cfg, Cell::new(1, 4), "D"),
                    cell_token(&cfg, Cell::new(1, 5), "12"),
                ],
            ),
            0,
            0,
            &cfg,
        );
        assert_eq!(s.day(Cell::new(1, 4)).code, "3006 D 12");
        assert!(s.day(Cell::new(1, 5)).code.is_empty());
    }

    #[test]
    fn single_digit_noise_dropped_unless_first() {
        let cfg = cfg();
        let s = assemble_slot(
            &slot(
                vec![],
                vec![
                    cell_token(&cfg, Cell::new(3, 2), "7"),
                    cell_token(&cfg, Cell::new(3, 3), "3006"),
                    cell_token(&cfg, Cell::new(3, 3), "4"),
                ],
            ),
            0,
            0,
            &cfg,
        );
        // First token for its cell: kept
        assert_eq!(s.day(Cell::new(3, 2)).code, "7");
        // Not first for its cell: dropped
        assert_eq!(s.day(Cell::new(3, 3)).code, "3006");
    }

    #[test]
    fn consecutive_codes_flag_shift_and_receiver() {
        let cfg = cfg();
        let mut s = ScheduleRecord::new("E14");
        s.day_mut(Cell::new(1, 4)).code = "3006 D".into();
        s.day_mut(Cell::new(1, 5)).code = "3007".into();
        s.day_mut(Cell::new(2, 1)).code = "3100".into();
        mark_consecutive(&mut s);

        assert!(s.day(Cell::new(1, 4)).is_consecutive_shift);
        assert!(s.day(Cell::new(1, 5)).is_consecutive_receiver);
        assert!(!s.day(Cell::new(1, 5)).is_consecutive_shift);
        assert!(!s.day(Cell::new(2, 1)).is_consecutive_receiver);
    }

    #[test]
    fn unnamed_slot_is_tagged() {
        let cfg = cfg();
        let s = assemble_slot(
            &SlotTokens {
                name: None,
                times: vec![],
                codes: vec![cell_token(&cfg, Cell::new(1, 1), "3006")],
            },
            2,
            1,
            &cfg,
        );
        assert!(s.unnamed);
        assert_eq!(s.name, "unnamed-p2-s1");
    }

    #[test]
    fn split_regex_only_matches_exact_double() {
        assert_eq!(
            split_concatenated("6:3014:00"),
            Some(("6:30".into(), "14:00".into()))
        );
        assert_eq!(split_concatenated("06:30"), None);
        assert_eq!(split_concatenated("Fri"), None);
        assert_eq!(split_concatenated("06:3014:00x"), None);
    }
}
