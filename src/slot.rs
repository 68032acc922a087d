use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::money::CurrencyAmount;

/// Duration given to freshly appended slots, and the chain step used when a
/// predecessor has no duration of its own yet.
pub const DEFAULT_SLOT_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[default]
    Unset,
    Tickets,
    FlatFee,
    NoPayment,
}

impl PaymentType {
    pub fn is_chosen(&self) -> bool {
        !matches!(self, PaymentType::Unset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Unbooked,
    Confirmed,
}

/// One performance window within a date's chain. Position in the owning
/// `Vec<Slot>` is the slot index; every per-slot field lives on the record,
/// so the parallel field lists can never drift out of length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Slot {
    #[serde(with = "crate::time::hhmm")]
    pub start_time: Option<NaiveTime>,
    /// Minutes; 0 means the operator has not chosen one yet.
    pub duration: u32,
    pub payment_type: PaymentType,
    pub booking_status: BookingStatus,
    pub performer_name: String,
    pub performer_from_directory: bool,
    pub invite_only: bool,
    pub budget: CurrencyAmount,
}

impl Slot {
    /// The payment choice drives the budget field: only a flat fee keeps an
    /// amount, the other choices blank it.
    pub fn set_payment_type(&mut self, payment: PaymentType) {
        self.payment_type = payment;
        if matches!(payment, PaymentType::Tickets | PaymentType::NoPayment) {
            self.budget = CurrencyAmount::empty();
        }
    }

    pub fn set_budget(&mut self, raw: &str) {
        self.budget = CurrencyAmount::from_input(raw);
    }

    /// Typing a name by hand detaches the slot from the directory entry it
    /// may have been picked from.
    pub fn set_performer_name(&mut self, name: &str) {
        self.performer_name = name.to_string();
        self.performer_from_directory = false;
    }

    pub fn clear_performer(&mut self) {
        self.performer_name.clear();
        self.performer_from_directory = false;
    }
}
