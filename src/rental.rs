use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::money::{parse_count, CurrencyAmount};
use crate::time::{format_time, is_after, parse_time};
use crate::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    SeekingHirer,
    HirerConfirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    PrivateLink,
}

/// Whether a piece of house kit comes with the hire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provision {
    #[default]
    NotIncluded,
    Included,
    ForHire(CurrencyAmount),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketingResponsibility {
    #[default]
    PromoterSells,
    VenueSells,
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeRestriction {
    #[default]
    EighteenPlus,
    AllAges,
}

/// A supporting document as the operator supplied it. The engine never opens
/// it; the document-store collaborator resolves it to a URL at submit time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    #[default]
    None,
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseRules {
    Text(String),
    Document(DocumentSource),
}

impl Default for HouseRules {
    fn default() -> Self {
        HouseRules::Text(String::new())
    }
}

/// The single hire window a date is offered under when the venue is rented
/// out whole, the alternative to a slot chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalWindow {
    #[serde(with = "crate::time::hhmm")]
    pub access_from: Option<NaiveTime>,
    #[serde(with = "crate::time::hhmm")]
    pub hard_curfew: Option<NaiveTime>,
    pub fee: CurrencyAmount,
    pub capacity: Option<u32>,
    pub status: Option<RentalStatus>,
    pub hirer_name: String,
    pub visibility: Option<Visibility>,
    /// Token behind the private listing link. Unique per date; the
    /// copy-to-all-dates operation clears it instead of copying it.
    pub link_token: String,
    pub timing_notes: String,
    pub pa_system: Provision,
    pub sound_engineer: Provision,
    pub ticketing: TicketingResponsibility,
    pub age_restriction: AgeRestriction,
    pub deposit_required: bool,
    pub deposit_amount: CurrencyAmount,
    pub house_rules: HouseRules,
}

impl RentalWindow {
    pub fn set_access_from(&mut self, input: &str) {
        self.access_from = parse_time(input);
    }

    /// The curfew must land strictly after the access time. An earlier or
    /// equal value is discarded so the window never contradicts itself.
    pub fn set_hard_curfew(&mut self, input: &str) -> Option<Notice> {
        let Some(value) = parse_time(input) else {
            self.hard_curfew = None;
            return None;
        };
        if let Some(access) = self.access_from {
            if !is_after(value, access) {
                log::warn!(
                    "curfew {} rejected: not after access time {}",
                    format_time(value),
                    format_time(access)
                );
                return Some(Notice::CurfewRejected { access });
            }
        }
        self.hard_curfew = Some(value);
        None
    }

    pub fn set_fee(&mut self, raw: &str) {
        self.fee = CurrencyAmount::from_input(raw);
    }

    pub fn set_capacity(&mut self, raw: &str) {
        self.capacity = parse_count(raw);
    }

    pub fn set_status(&mut self, status: RentalStatus) {
        self.status = Some(status);
    }

    /// Choosing the private-link visibility mints a token for the date the
    /// first time around; switching back and forth keeps the same link.
    pub fn set_visibility(&mut self, visibility: Visibility, date: NaiveDate) {
        if visibility == Visibility::PrivateLink && self.link_token.is_empty() {
            self.link_token = link_token(date);
        }
        self.visibility = Some(visibility);
    }

    pub fn set_deposit_required(&mut self, required: bool) {
        self.deposit_required = required;
        if !required {
            self.deposit_amount = CurrencyAmount::empty();
        }
    }

    pub fn set_deposit_amount(&mut self, raw: &str) {
        self.deposit_amount = CurrencyAmount::from_input(raw);
    }
}

/// Stable hex token for a date's private listing link.
pub fn link_token(date: NaiveDate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(Utc::now().to_rfc3339().as_bytes());
    format!("{:x}", hasher.finalize())
}
