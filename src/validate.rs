use serde::Serialize;

use crate::event::{Booking, EventRecord};
use crate::rental::{RentalStatus, RentalWindow};
use crate::slot::{BookingStatus, Slot};
use crate::time::is_after;

/// The single field the operator should fix next. Variant order is the
/// reporting priority; the evaluator never returns a lower-priority field
/// while a higher one is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    BookingMode,
    // rental mode
    AccessFrom,
    HardCurfew,
    RentalFee,
    RentalStatus,
    RentalVisibility,
    HirerName,
    Capacity,
    DepositAmount,
    // artist mode
    StartTime,
    Duration,
    PaymentType { slot: usize },
    PerformerName { slot: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Incomplete(MissingField),
}

/// Reports whether one date's record is complete, and if not, which field
/// to steer the operator to first. Pure and O(slots).
pub fn evaluate(event: &EventRecord) -> Validity {
    let missing = match &event.booking {
        Booking::Unset => Some(MissingField::BookingMode),
        Booking::Rental(rental) => first_missing_rental(rental),
        Booking::Artist { slots } => first_missing_artist(slots),
    };
    match missing {
        Some(field) => Validity::Incomplete(field),
        None => Validity::Valid,
    }
}

pub fn is_valid(event: &EventRecord) -> bool {
    evaluate(event) == Validity::Valid
}

fn first_missing_rental(rental: &RentalWindow) -> Option<MissingField> {
    let Some(access) = rental.access_from else {
        return Some(MissingField::AccessFrom);
    };
    match rental.hard_curfew {
        Some(curfew) if is_after(curfew, access) => {}
        _ => return Some(MissingField::HardCurfew),
    }
    if !rental.fee.is_set() {
        return Some(MissingField::RentalFee);
    }
    let Some(status) = rental.status else {
        return Some(MissingField::RentalStatus);
    };
    match status {
        RentalStatus::SeekingHirer if rental.visibility.is_none() => {
            return Some(MissingField::RentalVisibility);
        }
        RentalStatus::HirerConfirmed if rental.hirer_name.trim().is_empty() => {
            return Some(MissingField::HirerName);
        }
        _ => {}
    }
    if !rental.capacity.is_some_and(|capacity| capacity > 0) {
        return Some(MissingField::Capacity);
    }
    if rental.deposit_required && !rental.deposit_amount.is_set() {
        return Some(MissingField::DepositAmount);
    }
    None
}

fn first_missing_artist(slots: &[Slot]) -> Option<MissingField> {
    // Only slot 0's time and duration are gated directly; later slots
    // inherit theirs through the chain.
    let Some(first) = slots.first() else {
        return Some(MissingField::StartTime);
    };
    if first.start_time.is_none() {
        return Some(MissingField::StartTime);
    }
    if first.duration == 0 {
        return Some(MissingField::Duration);
    }
    if let Some(slot) = slots.iter().position(|s| !s.payment_type.is_chosen()) {
        return Some(MissingField::PaymentType { slot });
    }
    if let Some(slot) = slots.iter().position(|s| {
        s.booking_status == BookingStatus::Confirmed && s.performer_name.trim().is_empty()
    }) {
        return Some(MissingField::PerformerName { slot });
    }
    None
}
