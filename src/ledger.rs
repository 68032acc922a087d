use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::event::{Booking, BookingMode, EventRecord};
use crate::validate::{evaluate, MissingField, Validity};

/// Every event record of one authoring session, keyed by date. Keys are
/// unique and iterate chronologically. The ledger is the single mutable
/// owner of its records; readers get shared references only. It lives for
/// one session and is discarded after submit or cancel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateLedger {
    events: BTreeMap<NaiveDate, EventRecord>,
    focused: Option<NaiveDate>,
}

impl DateLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selecting a date on the calendar picker. Idempotent; the first date
    /// added takes focus.
    pub fn add_date(&mut self, date: NaiveDate) {
        self.events.entry(date).or_default();
        if self.focused.is_none() {
            self.focused = Some(date);
        }
    }

    /// Deselecting a date discards its record. Focus falls back to the
    /// chronologically earliest remaining date.
    pub fn remove_date(&mut self, date: NaiveDate) {
        self.events.remove(&date);
        if self.focused == Some(date) {
            self.focused = self.events.keys().next().copied();
        }
    }

    /// Calendar-picker toggle: add if absent, remove if present.
    pub fn toggle_date(&mut self, date: NaiveDate) {
        if self.events.contains_key(&date) {
            self.remove_date(date);
        } else {
            self.add_date(date);
        }
    }

    pub fn focus(&mut self, date: NaiveDate) {
        if self.events.contains_key(&date) {
            self.focused = Some(date);
        }
    }

    pub fn focused(&self) -> Option<NaiveDate> {
        self.focused
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.events.contains_key(&date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.events.keys().copied()
    }

    pub fn event(&self, date: NaiveDate) -> Option<&EventRecord> {
        self.events.get(&date)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &EventRecord)> {
        self.events.iter().map(|(date, event)| (*date, event))
    }

    /// The single funnel for field edits; all mutation goes through the
    /// ledger so nothing else ever holds a writable record.
    pub fn update<F, T>(&mut self, date: NaiveDate, transform: F) -> Option<T>
    where
        F: FnOnce(&mut EventRecord) -> T,
    {
        self.events.get_mut(&date).map(transform)
    }

    /// Resets the date's sub-structure to the chosen mode's default shape;
    /// other dates are untouched.
    pub fn set_booking_mode(&mut self, date: NaiveDate, mode: BookingMode) {
        self.update(date, |event| event.set_booking_mode(mode));
    }

    /// Replaces every other date's record with a structural copy of the
    /// source's. The rental link token is cleared, never copied: each date
    /// must mint its own.
    pub fn copy_settings_to_all_other_dates(&mut self, source: NaiveDate) {
        let Some(template) = self.events.get(&source).cloned() else {
            return;
        };
        for (date, event) in self.events.iter_mut() {
            if *date == source {
                continue;
            }
            let mut copy = template.clone();
            if let Booking::Rental(rental) = &mut copy.booking {
                rental.link_token.clear();
            }
            *event = copy;
        }
    }

    /// True when there is something to submit and every date is complete.
    pub fn can_submit(&self) -> bool {
        !self.events.is_empty() && self.events.values().all(|event| evaluate(event) == Validity::Valid)
    }

    /// The focus target of a failed submit attempt: the chronologically
    /// first incomplete date and its first missing field.
    pub fn first_invalid(&self) -> Option<(NaiveDate, MissingField)> {
        self.events
            .iter()
            .find_map(|(date, event)| match evaluate(event) {
                Validity::Incomplete(field) => Some((*date, field)),
                Validity::Valid => None,
            })
    }
}
