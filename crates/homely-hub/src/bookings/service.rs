use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::availability::{self, AvailabilityConflict};
use super::domain::{
    ActorRole, Booking, BookingId, BookingRequest, BookingStatus, GuestId, HostId,
    InvalidDateRange, PropertyId, StatusChange, StayRange,
};
use super::lifecycle::{check_transition, InvalidTransition, TransitionContext};
use super::policy::BookingPolicy;
use super::repository::{
    BookingNotice, BookingNotifier, BookingRepository, PropertyCatalog, RepositoryError,
};

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_booking_id() -> BookingId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("bkg-{id:06}"))
}

/// One mutex per property; check-then-write sequences run under it.
#[derive(Default)]
struct PropertyLocks {
    locks: Mutex<HashMap<PropertyId, Arc<Mutex<()>>>>,
}

impl PropertyLocks {
    fn lock_for(&self, property_id: &PropertyId) -> Arc<Mutex<()>> {
        let mut guard = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .entry(property_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Result of a read-only availability probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityReport {
    pub property_id: PropertyId,
    pub stay: StayRange,
    pub available: bool,
    pub conflicts: Vec<BookingId>,
}

/// Service composing the availability checker, state machine, and collaborators.
pub struct BookingService<R, P, N> {
    repository: Arc<R>,
    catalog: Arc<P>,
    notifier: Arc<N>,
    policy: BookingPolicy,
    locks: PropertyLocks,
}

impl<R, P, N> BookingService<R, P, N>
where
    R: BookingRepository + 'static,
    P: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    pub fn new(
        repository: Arc<R>,
        catalog: Arc<P>,
        notifier: Arc<N>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            repository,
            catalog,
            notifier,
            policy,
            locks: PropertyLocks::default(),
        }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Validate a guest request and store it if the nights are free.
    pub fn request_booking(
        &self,
        request: BookingRequest,
        today: NaiveDate,
    ) -> Result<Booking, BookingServiceError> {
        let stay = StayRange::upcoming(request.check_in, request.check_out, today)?;

        let listing = self
            .catalog
            .listing(&request.property_id)?
            .ok_or_else(|| BookingServiceError::PropertyNotFound(request.property_id.clone()))?;

        if request.guests == 0 || request.guests > listing.max_guests {
            return Err(BookingServiceError::InvalidGuestCount {
                requested: request.guests,
                max: listing.max_guests,
            });
        }

        let lock = self.locks.lock_for(&request.property_id);
        let serialized = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let existing = self.repository.find_by_property(&request.property_id)?;
        if let Err(conflict) =
            availability::ensure_available(&request.property_id, &stay, &existing)
        {
            warn!(
                property_id = %request.property_id,
                requested = %stay,
                conflicts = conflict.conflicting.len(),
                "booking request overlaps existing stay"
            );
            return Err(conflict.into());
        }

        let now = Utc::now();
        let booking = Booking {
            id: next_booking_id(),
            property_id: request.property_id,
            guest_id: request.guest_id,
            host_id: listing.host_id.clone(),
            stay,
            nights: stay.nights(),
            total_guests: request.guests,
            pricing: self.policy.quote(&listing, &stay),
            status: self.policy.initial_status(),
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        };

        let stored = self.repository.create(booking)?;
        drop(serialized);

        info!(
            booking_id = %stored.id,
            property_id = %stored.property_id,
            status = %stored.status,
            nights = stored.nights,
            total = stored.pricing.total,
            "booking created"
        );

        let template = match stored.status {
            BookingStatus::Confirmed => "booking_confirmed",
            _ => "booking_requested",
        };
        self.notify(template, &stored);

        Ok(stored)
    }

    /// Move a booking to `target` on behalf of `actor`.
    pub fn transition_booking(
        &self,
        booking_id: &BookingId,
        target: BookingStatus,
        actor: ActorRole,
        today: NaiveDate,
    ) -> Result<Booking, BookingServiceError> {
        let property_id = self.get(booking_id)?.property_id;

        let lock = self.locks.lock_for(&property_id);
        let serialized = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.get(booking_id)?;
        let context = TransitionContext {
            stay: current.stay,
            today,
            enforce_cancellation_cutoff: self.policy.enforce_cancellation_cutoff(),
        };
        check_transition(current.status, target, actor, &context)?;

        let change = StatusChange {
            from: current.status,
            to: target,
            actor,
            at: Utc::now(),
        };
        let updated = self.repository.update_status(booking_id, change)?;
        drop(serialized);

        info!(
            booking_id = %updated.id,
            from = %current.status,
            to = %updated.status,
            actor = %actor,
            "booking status changed"
        );

        let template = match updated.status {
            BookingStatus::Confirmed => Some("booking_confirmed"),
            BookingStatus::Cancelled => Some("booking_cancelled"),
            BookingStatus::Completed => Some("stay_completed"),
            BookingStatus::Pending => None,
        };
        if let Some(template) = template {
            self.notify(template, &updated);
        }

        Ok(updated)
    }

    /// Complete every confirmed stay whose check-out is on or before `today`.
    pub fn complete_elapsed(&self, today: NaiveDate) -> Result<Vec<Booking>, BookingServiceError> {
        let due: Vec<Booking> = self
            .repository
            .find_by_status(BookingStatus::Confirmed, usize::MAX)?
            .into_iter()
            .filter(|booking| booking.stay.check_out() <= today)
            .collect();

        let mut completed = Vec::with_capacity(due.len());
        for booking in due {
            match self.transition_booking(
                &booking.id,
                BookingStatus::Completed,
                ActorRole::System,
                today,
            ) {
                Ok(updated) => completed.push(updated),
                // Cancelled between the scan and the transition.
                Err(BookingServiceError::InvalidTransition(err)) => {
                    debug!(booking_id = %booking.id, %err, "skipping completion");
                }
                Err(other) => return Err(other),
            }
        }

        if !completed.is_empty() {
            info!(count = completed.len(), %today, "completed elapsed stays");
        }
        Ok(completed)
    }

    pub fn check_availability(
        &self,
        property_id: &PropertyId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<AvailabilityReport, BookingServiceError> {
        let stay = StayRange::new(check_in, check_out)?;
        let existing = self.repository.find_by_property(property_id)?;
        let conflicts: Vec<BookingId> = availability::conflicts(property_id, &stay, &existing)
            .map(|booking| booking.id.clone())
            .collect();

        Ok(AvailabilityReport {
            property_id: property_id.clone(),
            stay,
            available: conflicts.is_empty(),
            conflicts,
        })
    }

    pub fn get(&self, booking_id: &BookingId) -> Result<Booking, BookingServiceError> {
        let booking = self
            .repository
            .fetch(booking_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(booking)
    }

    pub fn bookings_for_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<Vec<Booking>, BookingServiceError> {
        Ok(self.repository.find_by_property(property_id)?)
    }

    pub fn bookings_for_guest(
        &self,
        guest_id: &GuestId,
    ) -> Result<Vec<Booking>, BookingServiceError> {
        Ok(self.repository.find_by_guest(guest_id)?)
    }

    /// Bookings across every listing the host owns.
    pub fn bookings_for_host(
        &self,
        host_id: &HostId,
    ) -> Result<Vec<Booking>, BookingServiceError> {
        Ok(self.repository.find_by_host(host_id)?)
    }

    fn notify(&self, template: &str, booking: &Booking) {
        if let Err(err) = self
            .notifier
            .publish(BookingNotice::for_booking(template, booking))
        {
            warn!(booking_id = %booking.id, template, %err, "booking notification failed");
        }
    }
}

/// Error raised by the booking service.
#[derive(Debug, thiserror::Error)]
pub enum BookingServiceError {
    #[error(transparent)]
    InvalidDateRange(#[from] InvalidDateRange),
    #[error("guest count {requested} must be between 1 and {max}")]
    InvalidGuestCount { requested: u32, max: u32 },
    #[error("property {0} not found")]
    PropertyNotFound(PropertyId),
    #[error(transparent)]
    AvailabilityConflict(#[from] AvailabilityConflict),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
