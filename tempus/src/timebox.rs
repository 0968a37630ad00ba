//! Day layout for planned time boxes
//!
//! Every entry belongs to the hour slot it starts in and nowhere else. Its
//! block is positioned with a fixed height per hour, so a long entry simply
//! runs past the bottom of its slot instead of being split or repeated.
//! Blocks that overlap in time are laid out side by side in lanes.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use serde::Deserialize;
use tempus_api::models::{Interval, ProjectId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Visible hours {start}..={end} are out of order or past 23")]
    InvalidRange { start: u32, end: u32 },

    #[error("Hour height must be positive, got {0}")]
    InvalidHourHeight(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// First visible hour, inclusive
    pub start_hour: u32,
    /// Last visible hour, inclusive
    pub end_hour: u32,
    /// Height of one hour slot in rendering units (rows, pixels, ...)
    pub hour_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_hour: 4,
            end_hour: 22,
            hour_height: 3.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.start_hour > self.end_hour || self.end_hour > 23 {
            return Err(LayoutError::InvalidRange {
                start: self.start_hour,
                end: self.end_hour,
            });
        }
        if !(self.hour_height > 0.0) {
            return Err(LayoutError::InvalidHourHeight(self.hour_height));
        }
        Ok(())
    }

    pub fn hours(&self) -> impl Iterator<Item = u32> {
        self.start_hour..=self.end_hour
    }

    pub fn total_hours(&self) -> u32 {
        (self.end_hour + 1).saturating_sub(self.start_hour)
    }

    pub fn total_height(&self) -> f64 {
        f64::from(self.total_hours()) * self.hour_height
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        (self.start_hour..=self.end_hour).contains(&hour)
    }
}

/// Vertical extent of a block, measured from the top of the first slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub top: f64,
    pub height: f64,
}

impl Placement {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug)]
pub struct HourSlot<'a, E> {
    pub hour: u32,
    pub entries: Vec<&'a E>,
}

/// Entries whose start falls on `day` in `tz`.
pub fn entries_for_day<'a, E, Tz>(entries: &'a [E], day: NaiveDate, tz: &Tz) -> Vec<&'a E>
where
    E: Interval,
    Tz: TimeZone,
{
    entries
        .iter()
        .filter(|entry| entry.start_date().with_timezone(tz).date_naive() == day)
        .collect()
}

/// One slot per visible hour; each entry lands in the slot of its start hour.
/// Entries starting outside the visible range are left out.
pub fn bucket_by_start_hour<'a, E, Tz>(
    entries: impl IntoIterator<Item = &'a E>,
    layout: &LayoutConfig,
    tz: &Tz,
) -> Vec<HourSlot<'a, E>>
where
    E: Interval + 'a,
    Tz: TimeZone,
{
    let mut slots: Vec<HourSlot<'a, E>> = layout
        .hours()
        .map(|hour| HourSlot {
            hour,
            entries: Vec::new(),
        })
        .collect();

    for entry in entries {
        let hour = entry.start_date().with_timezone(tz).hour();
        if layout.contains_hour(hour) {
            slots[(hour - layout.start_hour) as usize].entries.push(entry);
        }
    }
    slots
}

/// Fixed-height placement: `top = (hour - start_hour + minute/60) * hour_height`,
/// `height = duration_minutes/60 * hour_height`.
pub fn place<E, Tz>(entry: &E, layout: &LayoutConfig, tz: &Tz) -> Option<Placement>
where
    E: Interval,
    Tz: TimeZone,
{
    let start = entry.start_date().with_timezone(tz);
    let hour = start.hour();
    if !layout.contains_hour(hour) {
        return None;
    }
    let offset_hours = f64::from(hour - layout.start_hour) + f64::from(start.minute()) / 60.0;
    let duration_minutes = entry.duration_minutes().max(0) as f64;

    Some(Placement {
        top: offset_hours * layout.hour_height,
        height: duration_minutes / 60.0 * layout.hour_height,
    })
}

type TrackKey = (String, Option<ProjectId>, i64, i64);

fn minute_of(instant: DateTime<Utc>) -> i64 {
    instant.timestamp().div_euclid(60)
}

fn track_key(entry: &impl Interval) -> TrackKey {
    (
        entry.description().to_string(),
        entry.project_id(),
        minute_of(entry.start_date()),
        minute_of(entry.end_date()),
    )
}

/// Lookup of logged entries by description, project, and start/end minute,
/// so reconciling a day of time boxes is linear.
#[derive(Debug, Default)]
pub struct TrackedIndex {
    keys: HashSet<TrackKey>,
}

impl TrackedIndex {
    pub fn new<'a, E>(entries: impl IntoIterator<Item = &'a E>) -> Self
    where
        E: Interval + 'a,
    {
        Self {
            keys: entries.into_iter().map(track_key).collect(),
        }
    }

    /// A planned box counts as tracked when a logged entry has the same
    /// description and project and starts and ends in the same minutes.
    pub fn is_already_tracked(&self, planned: &impl Interval) -> bool {
        self.keys.contains(&track_key(planned))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaySummary {
    pub count: usize,
    pub total_minutes: i64,
}

#[derive(Debug)]
pub struct PlacedBlock<'a, E> {
    pub entry: &'a E,
    pub placement: Placement,
    pub tracked: bool,
    /// Lane among the blocks it overlaps in time
    pub column: usize,
    /// Lanes used by its overlap group
    pub columns: usize,
}

/// Everything a renderer needs for one day.
#[derive(Debug)]
pub struct DayLayout<'a, E> {
    pub day: NaiveDate,
    pub slots: Vec<HourSlot<'a, E>>,
    pub blocks: Vec<PlacedBlock<'a, E>>,
    pub summary: DaySummary,
}

impl<'a, E: Interval> DayLayout<'a, E> {
    pub fn build<Tz: TimeZone>(
        planned: &'a [E],
        tracked: &TrackedIndex,
        day: NaiveDate,
        layout: &LayoutConfig,
        tz: &Tz,
    ) -> Self {
        let day_entries = entries_for_day(planned, day, tz);
        let summary = DaySummary {
            count: day_entries.len(),
            total_minutes: day_entries.iter().map(|e| e.duration_minutes()).sum(),
        };
        let slots = bucket_by_start_hour(day_entries.iter().copied(), layout, tz);

        let mut blocks = Vec::new();
        for entry in slots.iter().flat_map(|slot| slot.entries.iter()) {
            if let Some(placement) = place(*entry, layout, tz) {
                blocks.push(PlacedBlock {
                    entry: *entry,
                    placement,
                    tracked: tracked.is_already_tracked(*entry),
                    column: 0,
                    columns: 1,
                });
            }
        }
        assign_columns(&mut blocks);

        Self {
            day,
            slots,
            blocks,
            summary,
        }
    }
}

/// Splits blocks into groups whose `[top, bottom)` ranges chain together and
/// packs each group into the fewest lanes, reusing a lane once its last block
/// has ended.
fn assign_columns<E>(blocks: &mut [PlacedBlock<'_, E>]) {
    blocks.sort_by(|a, b| a.placement.top.total_cmp(&b.placement.top));

    let mut start = 0;
    while start < blocks.len() {
        let mut group_bottom = blocks[start].placement.bottom();
        let mut lane_bottoms: Vec<f64> = Vec::new();
        let mut end = start;

        while end < blocks.len() && (end == start || blocks[end].placement.top < group_bottom) {
            let block = &mut blocks[end];
            let (top, bottom) = (block.placement.top, block.placement.bottom());
            block.column = match lane_bottoms.iter().position(|lane| *lane <= top) {
                Some(lane) => {
                    lane_bottoms[lane] = bottom;
                    lane
                }
                None => {
                    lane_bottoms.push(bottom);
                    lane_bottoms.len() - 1
                }
            };
            group_bottom = group_bottom.max(bottom);
            end += 1;
        }

        for block in &mut blocks[start..end] {
            block.columns = lane_bottoms.len();
        }
        start = end;
    }
}

/// `1h 30m`, or just `45m` under an hour.
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let (hours, rest) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours}h {rest}m")
    } else {
        format!("{rest}m")
    }
}
