use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::time::sleep;

use crate::event::{Booking, EventRecord, GigKind, PerformerType};
use crate::ledger::DateLedger;
use crate::rental::{
    link_token, AgeRestriction, DocumentSource, HouseRules, Provision, RentalStatus,
    RentalWindow, TicketingResponsibility, Visibility,
};
use crate::slot::{BookingStatus, PaymentType, Slot};
use crate::time::format_time;
use crate::validate::MissingField;

#[derive(Debug, Clone, Serialize)]
pub struct VenueRef {
    pub venue_id: String,
    pub name: String,
}

/// One venue-hire listing, emitted per rental-mode date.
#[derive(Debug, Clone, Serialize)]
pub struct RentalOpportunity {
    pub venue_id: String,
    pub date: NaiveDate,
    pub title: String,
    pub access_from: String,
    pub hard_curfew: String,
    pub fee_value: u64,
    pub deposit_required: bool,
    pub deposit_amount: Option<u64>,
    pub capacity: u32,
    pub pa_system: Provision,
    pub sound_engineer: Provision,
    pub ticketing: TicketingResponsibility,
    pub age_restriction: AgeRestriction,
    pub status: RentalStatus,
    pub private: bool,
    pub hirer_name: Option<String>,
    pub link_token: Option<String>,
    pub timing_notes: String,
    pub house_rules_text: String,
    /// Forwarded unopened; resolved to `document_url` at submit time.
    pub document: DocumentSource,
    pub document_url: Option<String>,
}

/// One bookable performance window, emitted per populated slot. Sibling ids
/// tie a date's slots together so consumers can render one multi-set event.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSlot {
    pub group_id: String,
    pub sibling_ids: Vec<String>,
    pub venue_id: String,
    pub date: NaiveDate,
    pub title: String,
    pub start_time: String,
    pub duration_minutes: u32,
    pub payment_type: PaymentType,
    pub fee_value: u64,
    pub booking_status: BookingStatus,
    pub performer_name: Option<String>,
    pub invite_only: bool,
    pub kind: GigKind,
    pub performer_type: PerformerType,
    pub load_in: Option<String>,
    pub sound_check: Option<String>,
    pub extra_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Submission {
    pub rentals: Vec<RentalOpportunity>,
    pub performances: Vec<PerformanceSlot>,
    /// Slots dropped for having no start time or duration, as (date, slot
    /// index). Surfaced so the caller can warn the operator about the dead
    /// slot instead of it silently vanishing.
    pub skipped: Vec<(NaiveDate, usize)>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmitOutcome {
    pub rental_ids: Vec<String>,
    pub performance_ids: Vec<String>,
    pub skipped: Vec<(NaiveDate, usize)>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no dates selected")]
    EmptyLedger,
    #[error("{date} is incomplete: {missing:?}")]
    IncompleteLedger {
        date: NaiveDate,
        missing: MissingField,
    },
    #[error("rate limited by submission service")]
    RateLimited,
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Write boundary to the booking backend. Implementations map their
/// transport failures onto `SubmitError`; only `RateLimited` is retried.
pub trait SubmissionClient {
    fn create_performances(
        &self,
        records: &[PerformanceSlot],
    ) -> impl Future<Output = Result<Vec<String>, SubmitError>> + Send;

    fn create_rentals(
        &self,
        records: &[RentalOpportunity],
    ) -> impl Future<Output = Result<Vec<String>, SubmitError>> + Send;
}

/// Storage boundary for rental supporting documents. Returns the stored URL
/// for a file, passes an existing URL through, and `None` for no document.
pub trait DocumentStore {
    fn store(
        &self,
        source: &DocumentSource,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
}

/// Retry schedule for the submission call, kept as a value so it can be
/// tested without real sleeps.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delays: [2, 4, 6, 8, 10].iter().map(|s| Duration::from_secs(*s)).collect(),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delays: Vec::new(),
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.delays
            .get(attempt as usize)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    pub fn should_retry(&self, error: &SubmitError, attempt: u32) -> bool {
        attempt < self.max_retries && matches!(error, SubmitError::RateLimited)
    }
}

/// Flattens a fully valid ledger into the outgoing record shapes. Pure; the
/// ledger is only read. An incomplete ledger is refused with its first
/// missing field so the caller can steer focus.
pub fn assemble(ledger: &DateLedger, venue: &VenueRef) -> Result<Submission, SubmitError> {
    if ledger.is_empty() {
        return Err(SubmitError::EmptyLedger);
    }
    if let Some((date, missing)) = ledger.first_invalid() {
        return Err(SubmitError::IncompleteLedger { date, missing });
    }

    let mut submission = Submission::default();
    for (date, event) in ledger.iter() {
        match &event.booking {
            Booking::Rental(rental) => {
                submission
                    .rentals
                    .push(rental_record(venue, date, event, rental));
            }
            Booking::Artist { slots } => {
                assemble_performances(venue, date, event, slots, &mut submission);
            }
            // Unreachable once the ledger validated, but harmless.
            Booking::Unset => {}
        }
    }
    Ok(submission)
}

/// Assembles and sends the ledger. Rate-limit failures are retried on the
/// policy's schedule; anything else surfaces immediately. The ledger itself
/// is untouched either way, so the operator can retry without re-entering
/// anything.
pub async fn submit<C, D>(
    ledger: &DateLedger,
    venue: &VenueRef,
    client: &C,
    documents: &D,
    policy: &RetryPolicy,
) -> Result<SubmitOutcome, SubmitError>
where
    C: SubmissionClient,
    D: DocumentStore,
{
    let mut submission = assemble(ledger, venue)?;

    for rental in &mut submission.rentals {
        if rental.document == DocumentSource::None {
            continue;
        }
        rental.document_url = documents
            .store(&rental.document)
            .await
            .map_err(|err| SubmitError::Rejected(err.to_string()))?;
    }

    let rental_ids = if submission.rentals.is_empty() {
        Vec::new()
    } else {
        with_retry(policy, || client.create_rentals(&submission.rentals)).await?
    };
    let performance_ids = if submission.performances.is_empty() {
        Vec::new()
    } else {
        with_retry(policy, || {
            client.create_performances(&submission.performances)
        })
        .await?
    };

    Ok(SubmitOutcome {
        rental_ids,
        performance_ids,
        skipped: submission.skipped,
    })
}

async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut call: F) -> Result<T, SubmitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SubmitError>>,
{
    let mut attempt = 0u32;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if policy.should_retry(&err, attempt) => {
                let wait = policy.delay_for(attempt);
                log::warn!(
                    "submission rate limited, retrying in {:?} (attempt {} of {})",
                    wait,
                    attempt + 1,
                    policy.max_retries
                );
                sleep(wait).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn rental_record(
    venue: &VenueRef,
    date: NaiveDate,
    event: &EventRecord,
    rental: &RentalWindow,
) -> RentalOpportunity {
    let status = rental.status.unwrap_or(RentalStatus::SeekingHirer);
    let confirmed = status == RentalStatus::HirerConfirmed;
    // A confirmed hire is never publicly listed.
    let private = confirmed || rental.visibility == Some(Visibility::PrivateLink);
    let token = if !confirmed && rental.visibility == Some(Visibility::PrivateLink) {
        Some(if rental.link_token.is_empty() {
            link_token(date)
        } else {
            rental.link_token.clone()
        })
    } else {
        None
    };
    let hirer_name = confirmed
        .then(|| rental.hirer_name.trim().to_string())
        .filter(|name| !name.is_empty());
    let title = if event.title.trim().is_empty() {
        format!("{} For Hire", venue.name)
    } else {
        event.title.trim().to_string()
    };
    let (house_rules_text, document) = match &rental.house_rules {
        HouseRules::Text(text) => (text.trim().to_string(), DocumentSource::None),
        HouseRules::Document(source) => (String::new(), source.clone()),
    };

    RentalOpportunity {
        venue_id: venue.venue_id.clone(),
        date,
        title,
        access_from: rental.access_from.map(format_time).unwrap_or_default(),
        hard_curfew: rental.hard_curfew.map(format_time).unwrap_or_default(),
        fee_value: rental.fee.value_or_zero(),
        deposit_required: rental.deposit_required,
        deposit_amount: rental
            .deposit_required
            .then(|| rental.deposit_amount.value_or_zero()),
        capacity: rental.capacity.unwrap_or(0),
        pa_system: rental.pa_system.clone(),
        sound_engineer: rental.sound_engineer.clone(),
        ticketing: rental.ticketing,
        age_restriction: rental.age_restriction,
        status,
        private,
        hirer_name,
        link_token: token,
        timing_notes: rental.timing_notes.trim().to_string(),
        house_rules_text,
        document,
        document_url: None,
    }
}

fn assemble_performances(
    venue: &VenueRef,
    date: NaiveDate,
    event: &EventRecord,
    slots: &[Slot],
    out: &mut Submission,
) {
    // An extra slot the operator added then left blank is dropped here, not
    // failed; the skip is reported back instead.
    let mut emitted = Vec::new();
    for (index, slot) in slots.iter().enumerate() {
        match slot.start_time {
            Some(start) if slot.duration > 0 => emitted.push((index, slot, start)),
            _ => out.skipped.push((date, index)),
        }
    }

    let group_ids: Vec<String> = emitted
        .iter()
        .map(|(index, _, _)| group_id(&venue.venue_id, date, *index))
        .collect();
    let base_title = if event.title.trim().is_empty() {
        format!("Gig at {}", venue.name)
    } else {
        event.title.trim().to_string()
    };

    for (position, (index, slot, start)) in emitted.iter().enumerate() {
        let sibling_ids = if group_ids.len() > 1 {
            group_ids
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != position)
                .map(|(_, id)| id.clone())
                .collect()
        } else {
            Vec::new()
        };
        let payment_type = if slot.payment_type.is_chosen() {
            slot.payment_type
        } else {
            PaymentType::NoPayment
        };
        let fee_value = if payment_type == PaymentType::FlatFee {
            slot.budget.value_or_zero()
        } else {
            0
        };
        let performer_name = (slot.booking_status == BookingStatus::Confirmed)
            .then(|| slot.performer_name.trim().to_string())
            .filter(|name| !name.is_empty());
        let title = if *index == 0 {
            base_title.clone()
        } else {
            format!("{} (Set {})", base_title, index + 1)
        };

        out.performances.push(PerformanceSlot {
            group_id: group_ids[position].clone(),
            sibling_ids,
            venue_id: venue.venue_id.clone(),
            date,
            title,
            start_time: format_time(*start),
            duration_minutes: slot.duration,
            payment_type,
            fee_value,
            booking_status: slot.booking_status,
            performer_name,
            invite_only: slot.invite_only,
            kind: event.kind,
            performer_type: event.performer_type,
            load_in: event.load_in.map(format_time),
            sound_check: event.sound_check.map(format_time),
            extra_notes: Some(event.extra_notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
        });
    }
}

/// Stable group identifier for one slot of one date, hashed the same way
/// regardless of which sibling asks.
fn group_id(venue_id: &str, date: NaiveDate, slot_index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(venue_id.as_bytes());
    hasher.update(b"|");
    hasher.update(date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(slot_index.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::event::BookingMode;
    use crate::slot::PaymentType;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).expect("valid date")
    }

    fn venue() -> VenueRef {
        VenueRef {
            venue_id: "venue-1".to_string(),
            name: "The Cellar".to_string(),
        }
    }

    fn artist_ledger(date: NaiveDate, slot_count: usize) -> DateLedger {
        let mut ledger = DateLedger::new();
        ledger.add_date(date);
        ledger.set_booking_mode(date, BookingMode::Artist);
        ledger.update(date, |event| {
            event.set_slot_start_time(0, "18:00");
            event.set_slot_duration(0, 60);
            event.set_slot_count(slot_count);
            for index in 0..slot_count {
                event
                    .slot_mut(index)
                    .expect("slot")
                    .set_payment_type(PaymentType::Tickets);
            }
        });
        ledger
    }

    fn rental_ledger(date: NaiveDate) -> DateLedger {
        let mut ledger = DateLedger::new();
        ledger.add_date(date);
        ledger.set_booking_mode(date, BookingMode::Rental);
        ledger.update(date, |event| {
            let rental = event.booking.rental_mut().expect("rental window");
            rental.set_access_from("14:00");
            rental.set_hard_curfew("23:00");
            rental.set_fee("£500");
            rental.set_status(RentalStatus::SeekingHirer);
            rental.set_visibility(Visibility::PrivateLink, date);
            rental.set_capacity("150");
        });
        ledger
    }

    struct FlakyClient {
        rate_limited_calls: usize,
        calls: AtomicUsize,
    }

    impl FlakyClient {
        fn new(rate_limited_calls: usize) -> Self {
            Self {
                rate_limited_calls,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SubmissionClient for FlakyClient {
        async fn create_performances(
            &self,
            records: &[PerformanceSlot],
        ) -> Result<Vec<String>, SubmitError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.rate_limited_calls {
                return Err(SubmitError::RateLimited);
            }
            Ok(records.iter().map(|r| r.group_id.clone()).collect())
        }

        async fn create_rentals(
            &self,
            records: &[RentalOpportunity],
        ) -> Result<Vec<String>, SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(records.iter().map(|r| r.venue_id.clone()).collect())
        }
    }

    struct RejectingClient {
        calls: AtomicUsize,
    }

    impl SubmissionClient for RejectingClient {
        async fn create_performances(
            &self,
            _records: &[PerformanceSlot],
        ) -> Result<Vec<String>, SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SubmitError::Rejected("bad payload".to_string()))
        }

        async fn create_rentals(
            &self,
            _records: &[RentalOpportunity],
        ) -> Result<Vec<String>, SubmitError> {
            Err(SubmitError::Rejected("bad payload".to_string()))
        }
    }

    struct NoopDocuments;

    impl DocumentStore for NoopDocuments {
        async fn store(&self, source: &DocumentSource) -> anyhow::Result<Option<String>> {
            Ok(match source {
                DocumentSource::None => None,
                DocumentSource::Url(url) => Some(url.clone()),
                DocumentSource::File(path) => Some(format!("stored:{}", path.display())),
            })
        }
    }

    fn instant_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            delays: vec![Duration::ZERO; 5],
        }
    }

    #[test]
    fn incomplete_ledger_is_refused_with_the_focus_target() {
        let mut ledger = artist_ledger(day(5), 1);
        ledger.add_date(day(9));
        match assemble(&ledger, &venue()) {
            Err(SubmitError::IncompleteLedger { date, missing }) => {
                assert_eq!(date, day(9));
                assert_eq!(missing, MissingField::BookingMode);
            }
            other => panic!("expected incomplete-ledger error, got {other:?}"),
        }
        assert!(matches!(
            assemble(&DateLedger::new(), &venue()),
            Err(SubmitError::EmptyLedger)
        ));
    }

    #[test]
    fn blank_extra_slot_is_skipped_and_reported() {
        let mut ledger = artist_ledger(day(5), 3);
        ledger.update(day(5), |event| event.set_slot_duration(2, 0));
        let submission = assemble(&ledger, &venue()).expect("valid ledger");

        assert_eq!(submission.performances.len(), 2);
        assert_eq!(submission.skipped, vec![(day(5), 2)]);
        for record in &submission.performances {
            assert_eq!(record.sibling_ids.len(), 1);
            assert_ne!(record.sibling_ids[0], record.group_id);
        }
    }

    #[test]
    fn single_slot_date_has_no_siblings() {
        let ledger = artist_ledger(day(5), 1);
        let submission = assemble(&ledger, &venue()).expect("valid ledger");
        assert_eq!(submission.performances.len(), 1);
        assert!(submission.performances[0].sibling_ids.is_empty());
        assert_eq!(submission.performances[0].title, "Gig at The Cellar");
        assert_eq!(submission.performances[0].start_time, "18:00");
    }

    #[test]
    fn later_sets_are_titled_by_slot_position() {
        let ledger = artist_ledger(day(5), 2);
        let submission = assemble(&ledger, &venue()).expect("valid ledger");
        assert_eq!(submission.performances[1].title, "Gig at The Cellar (Set 2)");
        assert_eq!(submission.performances[1].start_time, "19:00");
    }

    #[test]
    fn only_flat_fees_carry_an_amount() {
        let mut ledger = artist_ledger(day(5), 2);
        ledger.update(day(5), |event| {
            let slot = event.slot_mut(1).expect("slot 1");
            slot.set_payment_type(PaymentType::FlatFee);
            slot.set_budget("£120");
        });
        let submission = assemble(&ledger, &venue()).expect("valid ledger");
        assert_eq!(submission.performances[0].fee_value, 0);
        assert_eq!(submission.performances[1].fee_value, 120);
    }

    #[test]
    fn confirmed_hire_is_private_and_unlinked() {
        let date = day(7);
        let mut ledger = rental_ledger(date);
        let submission = assemble(&ledger, &venue()).expect("valid ledger");
        let record = &submission.rentals[0];
        assert!(record.private);
        assert!(record.link_token.is_some());
        assert_eq!(record.hirer_name, None);

        ledger.update(date, |event| {
            let rental = event.booking.rental_mut().expect("rental window");
            rental.set_status(RentalStatus::HirerConfirmed);
            rental.hirer_name = "Warehouse Collective".to_string();
        });
        let submission = assemble(&ledger, &venue()).expect("valid ledger");
        let record = &submission.rentals[0];
        assert!(record.private);
        assert_eq!(record.link_token, None);
        assert_eq!(record.hirer_name.as_deref(), Some("Warehouse Collective"));
        assert_eq!(record.access_from, "14:00");
        assert_eq!(record.fee_value, 500);
    }

    #[test]
    fn default_retry_schedule_backs_off_and_saturates() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for(7), Duration::from_secs(10));
        assert!(policy.should_retry(&SubmitError::RateLimited, 4));
        assert!(!policy.should_retry(&SubmitError::RateLimited, 5));
        assert!(!policy.should_retry(&SubmitError::Rejected("nope".to_string()), 0));
    }

    #[tokio::test]
    async fn rate_limited_submission_is_retried_until_it_lands() {
        let ledger = artist_ledger(day(5), 2);
        let client = FlakyClient::new(3);
        let outcome = submit(&ledger, &venue(), &client, &NoopDocuments, &instant_policy())
            .await
            .expect("submission lands on the fourth attempt");
        assert_eq!(outcome.performance_ids.len(), 2);
        assert_eq!(client.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn rate_limit_gives_up_after_max_retries() {
        let ledger = artist_ledger(day(5), 1);
        let client = FlakyClient::new(usize::MAX);
        let err = submit(&ledger, &venue(), &client, &NoopDocuments, &instant_policy())
            .await
            .expect_err("exhausted retries");
        assert!(matches!(err, SubmitError::RateLimited));
        assert_eq!(client.calls.load(Ordering::SeqCst), 6, "1 try + 5 retries");
    }

    #[tokio::test]
    async fn terminal_rejection_is_not_retried() {
        let ledger = artist_ledger(day(5), 1);
        let client = RejectingClient {
            calls: AtomicUsize::new(0),
        };
        let err = submit(&ledger, &venue(), &client, &NoopDocuments, &instant_policy())
            .await
            .expect_err("rejected");
        assert!(matches!(err, SubmitError::Rejected(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn house_rules_document_is_resolved_before_sending() {
        let date = day(7);
        let mut ledger = rental_ledger(date);
        ledger.update(date, |event| {
            let rental = event.booking.rental_mut().expect("rental window");
            rental.house_rules =
                HouseRules::Document(DocumentSource::Url("https://docs.example/rules.pdf".into()));
        });
        let client = FlakyClient::new(0);
        let outcome = submit(&ledger, &venue(), &client, &NoopDocuments, &RetryPolicy::none())
            .await
            .expect("rental submission");
        assert_eq!(outcome.rental_ids.len(), 1);
    }
}
