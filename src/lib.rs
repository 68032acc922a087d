pub mod chain;
pub mod directory;
pub mod event;
pub mod ledger;
pub mod money;
pub mod rental;
pub mod slot;
pub mod submit;
pub mod time;
pub mod validate;

use std::fmt;

use chrono::NaiveTime;

pub use directory::{save_performer, DirectoryClient, DirectoryEntry};
pub use event::{Booking, BookingMode, EventRecord, GigKind, PerformerType};
pub use ledger::DateLedger;
pub use money::CurrencyAmount;
pub use rental::{
    AgeRestriction, DocumentSource, HouseRules, Provision, RentalStatus, RentalWindow,
    TicketingResponsibility, Visibility,
};
pub use slot::{BookingStatus, PaymentType, Slot};
pub use submit::{
    submit, DocumentStore, PerformanceSlot, RentalOpportunity, RetryPolicy, Submission,
    SubmissionClient, SubmitError, SubmitOutcome, VenueRef,
};
pub use validate::{evaluate, is_valid, MissingField, Validity};

/// A rejected or adjusted edit, returned to the caller so the UI layer can
/// tell the operator what happened. Edits that produce a notice have already
/// been settled; nothing is left in a half-applied state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A chained slot's start was pushed up to its predecessor's end.
    StartClamped { slot: usize, floor: NaiveTime },
    /// A curfew at or before the access time was discarded.
    CurfewRejected { access: NaiveTime },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::StartClamped { floor, .. } => {
                write!(f, "Start time cannot be before {}", time::format_time(*floor))
            }
            Notice::CurfewRejected { access } => {
                write!(
                    f,
                    "Curfew must be after the access time {}",
                    time::format_time(*access)
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_render_operator_facing_messages() {
        let floor = time::parse_time("19:00").expect("valid time");
        let notice = Notice::StartClamped { slot: 1, floor };
        assert_eq!(notice.to_string(), "Start time cannot be before 19:00");

        let access = time::parse_time("14:00").expect("valid time");
        let notice = Notice::CurfewRejected { access };
        assert_eq!(
            notice.to_string(),
            "Curfew must be after the access time 14:00"
        );
    }
}
