use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::chain;
use crate::rental::RentalWindow;
use crate::slot::Slot;
use crate::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GigKind {
    #[default]
    LiveMusic,
    BackgroundMusic,
    Wedding,
    OpenMic,
    HouseParty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformerType {
    #[default]
    MusicianBand,
    Dj,
}

/// The two shapes a date can be authored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingMode {
    Artist,
    Rental,
}

/// Which sub-structure a date carries. Exactly one shape exists at a time;
/// an artist chain always holds at least one slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Booking {
    #[default]
    Unset,
    Artist {
        slots: Vec<Slot>,
    },
    Rental(RentalWindow),
}

impl Booking {
    pub fn mode(&self) -> Option<BookingMode> {
        match self {
            Booking::Unset => None,
            Booking::Artist { .. } => Some(BookingMode::Artist),
            Booking::Rental(_) => Some(BookingMode::Rental),
        }
    }

    pub fn slots(&self) -> Option<&[Slot]> {
        match self {
            Booking::Artist { slots } => Some(slots),
            _ => None,
        }
    }

    pub fn slots_mut(&mut self) -> Option<&mut Vec<Slot>> {
        match self {
            Booking::Artist { slots } => Some(slots),
            _ => None,
        }
    }

    pub fn rental(&self) -> Option<&RentalWindow> {
        match self {
            Booking::Rental(rental) => Some(rental),
            _ => None,
        }
    }

    pub fn rental_mut(&mut self) -> Option<&mut RentalWindow> {
        match self {
            Booking::Rental(rental) => Some(rental),
            _ => None,
        }
    }
}

/// The complete booking configuration for one calendar date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    pub booking: Booking,
    /// Listing title; blank means the assembler derives a venue-based one.
    pub title: String,
    pub kind: GigKind,
    pub performer_type: PerformerType,
    pub extra_notes: String,
    #[serde(with = "crate::time::hhmm")]
    pub load_in: Option<NaiveTime>,
    #[serde(with = "crate::time::hhmm")]
    pub sound_check: Option<NaiveTime>,
}

impl EventRecord {
    /// Switching mode resets the sub-structure to that mode's default shape
    /// (one blank slot, or an empty rental window). Re-selecting the current
    /// mode keeps whatever the operator has entered.
    pub fn set_booking_mode(&mut self, mode: BookingMode) {
        if self.booking.mode() == Some(mode) {
            return;
        }
        self.booking = match mode {
            BookingMode::Artist => Booking::Artist {
                slots: vec![Slot::default()],
            },
            BookingMode::Rental => Booking::Rental(RentalWindow::default()),
        };
    }

    pub fn slot_count(&self) -> usize {
        self.booking.slots().map_or(0, <[Slot]>::len)
    }

    pub fn set_slot_start_time(&mut self, index: usize, input: &str) -> Option<Notice> {
        self.booking
            .slots_mut()
            .and_then(|slots| chain::set_start_time(slots, index, input))
    }

    pub fn set_slot_duration(&mut self, index: usize, minutes: u32) {
        if let Some(slots) = self.booking.slots_mut() {
            chain::set_duration(slots, index, minutes);
        }
    }

    pub fn add_slot(&mut self) {
        if let Some(slots) = self.booking.slots_mut() {
            chain::add_slot(slots);
        }
    }

    pub fn remove_slot(&mut self, index: usize) {
        if let Some(slots) = self.booking.slots_mut() {
            chain::remove_slot(slots, index);
        }
    }

    pub fn set_slot_count(&mut self, desired: usize) {
        if let Some(slots) = self.booking.slots_mut() {
            chain::set_slot_count(slots, desired);
        }
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.booking.slots_mut()?.get_mut(index)
    }
}
