use chrono::NaiveTime;

use crate::slot::{Slot, DEFAULT_SLOT_MINUTES};
use crate::time::{add_minutes, format_time, parse_time};
use crate::Notice;

/// Hard cap on slots per date, matching the authoring UI.
pub const MAX_SLOTS: usize = 10;

/// Earliest legal start for a slot: its predecessor's end time. Slot 0 has
/// no floor, and neither does a slot whose predecessor has no start yet.
pub fn chain_floor(slots: &[Slot], index: usize) -> Option<NaiveTime> {
    if index == 0 {
        return None;
    }
    let prev = slots.get(index - 1)?;
    add_minutes(prev.start_time, i64::from(prev.duration))
}

/// Forward-propagates chained start times: every slot after `from` starts
/// when its predecessor ends. Durations are left alone, and a slot keeps
/// its current start while its predecessor has none.
pub fn recalc_from(slots: &mut [Slot], from: usize) {
    for i in (from + 1)..slots.len() {
        let end = add_minutes(slots[i - 1].start_time, i64::from(slots[i - 1].duration));
        if let Some(end) = end {
            slots[i].start_time = Some(end);
        }
    }
}

/// Applies a start-time edit at `index` and re-derives everything after it.
/// Edits below the chain floor are clamped up to the floor and reported.
pub fn set_start_time(slots: &mut [Slot], index: usize, input: &str) -> Option<Notice> {
    if index >= slots.len() {
        return None;
    }
    let mut notice = None;
    if index == 0 {
        slots[0].start_time = parse_time(input);
    } else {
        let floor = chain_floor(slots, index);
        let value = match (parse_time(input), floor) {
            (Some(value), Some(floor)) if value < floor => {
                log::warn!(
                    "slot {index} start {} clamped to chain floor {}",
                    format_time(value),
                    format_time(floor)
                );
                notice = Some(Notice::StartClamped { slot: index, floor });
                Some(floor)
            }
            (Some(value), _) => Some(value),
            (None, Some(floor)) => {
                notice = Some(Notice::StartClamped { slot: index, floor });
                Some(floor)
            }
            (None, None) => None,
        };
        slots[index].start_time = value;
    }
    recalc_from(slots, index);
    notice
}

/// Applies a duration edit at `index` and re-derives every later start.
pub fn set_duration(slots: &mut [Slot], index: usize, minutes: u32) {
    if index >= slots.len() {
        return;
    }
    slots[index].duration = minutes;
    recalc_from(slots, index);
}

/// Appends one slot starting where the chain currently ends, with the
/// default duration. Consistent by construction, no recalc needed.
pub fn add_slot(slots: &mut Vec<Slot>) {
    let start = slots.last().and_then(|last| {
        let step = if last.duration > 0 {
            last.duration
        } else {
            DEFAULT_SLOT_MINUTES
        };
        add_minutes(last.start_time, i64::from(step))
    });
    slots.push(Slot {
        start_time: start,
        duration: DEFAULT_SLOT_MINUTES,
        ..Slot::default()
    });
}

/// Removes the slot at `index`, renumbering and re-chaining what follows.
/// The chain never collapses below one slot.
pub fn remove_slot(slots: &mut Vec<Slot>, index: usize) {
    if slots.len() <= 1 || index >= slots.len() {
        return;
    }
    slots.remove(index);
    recalc_from(slots, index.saturating_sub(1));
}

/// Grows or shrinks the chain to `desired` slots (clamped to 1..=MAX_SLOTS).
/// Growth appends by the add rule; shrinking truncates the tail. Existing
/// leading slots keep every field value.
pub fn set_slot_count(slots: &mut Vec<Slot>, desired: usize) {
    let desired = desired.clamp(1, MAX_SLOTS);
    while slots.len() < desired {
        add_slot(slots);
    }
    slots.truncate(desired);
}
