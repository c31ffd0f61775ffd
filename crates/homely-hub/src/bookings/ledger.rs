//! Immutable booking snapshots.
//!
//! A [`BookingLedger`] is never mutated in place: [`BookingLedger::reduce`] returns a new
//! snapshot, so readers holding an older one keep a consistent view. Stores swap the
//! current snapshot under a lock after a successful reduction; [`LedgerRepository`] is
//! that store.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::domain::{Booking, BookingId, BookingStatus, GuestId, HostId, PropertyId, StatusChange};
use super::repository::{BookingRepository, RepositoryError};

#[derive(Debug, Clone)]
pub enum LedgerEvent {
    Recorded(Booking),
    StatusChanged {
        booking_id: BookingId,
        change: StatusChange,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("booking {0} already recorded")]
    DuplicateBooking(BookingId),
    #[error("booking {0} is not in the ledger")]
    UnknownBooking(BookingId),
    #[error("booking {incoming} overlaps blocking booking {existing}")]
    OverlappingStay {
        incoming: BookingId,
        existing: BookingId,
    },
    #[error("status change for {booking_id} starts from {expected} but booking is {actual}")]
    StaleStatus {
        booking_id: BookingId,
        expected: BookingStatus,
        actual: BookingStatus,
    },
}

impl From<LedgerError> for RepositoryError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::DuplicateBooking(_)
            | LedgerError::OverlappingStay { .. }
            | LedgerError::StaleStatus { .. } => RepositoryError::Conflict,
            LedgerError::UnknownBooking(_) => RepositoryError::NotFound,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingLedger {
    bookings: Arc<BTreeMap<BookingId, Booking>>,
}

impl BookingLedger {
    pub fn reduce(&self, event: &LedgerEvent) -> Result<BookingLedger, LedgerError> {
        match event {
            LedgerEvent::Recorded(booking) => self.record(booking),
            LedgerEvent::StatusChanged { booking_id, change } => {
                self.change_status(booking_id, change)
            }
        }
    }

    fn record(&self, booking: &Booking) -> Result<BookingLedger, LedgerError> {
        if self.bookings.contains_key(&booking.id) {
            return Err(LedgerError::DuplicateBooking(booking.id.clone()));
        }

        if booking.is_blocking() {
            if let Some(existing) = self.bookings.values().find(|other| {
                other.property_id == booking.property_id
                    && other.is_blocking()
                    && other.stay.overlaps(&booking.stay)
            }) {
                return Err(LedgerError::OverlappingStay {
                    incoming: booking.id.clone(),
                    existing: existing.id.clone(),
                });
            }
        }

        let mut next = (*self.bookings).clone();
        next.insert(booking.id.clone(), booking.clone());
        Ok(Self {
            bookings: Arc::new(next),
        })
    }

    fn change_status(
        &self,
        booking_id: &BookingId,
        change: &StatusChange,
    ) -> Result<BookingLedger, LedgerError> {
        let current = self
            .bookings
            .get(booking_id)
            .ok_or_else(|| LedgerError::UnknownBooking(booking_id.clone()))?;

        if current.status != change.from {
            return Err(LedgerError::StaleStatus {
                booking_id: booking_id.clone(),
                expected: change.from,
                actual: current.status,
            });
        }

        let mut next = (*self.bookings).clone();
        next.insert(booking_id.clone(), current.with_change(change.clone()));
        Ok(Self {
            bookings: Arc::new(next),
        })
    }

    pub fn get(&self, id: &BookingId) -> Option<&Booking> {
        self.bookings.get(id)
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    pub fn for_property(&self, property_id: &PropertyId) -> Vec<Booking> {
        self.select(|booking| &booking.property_id == property_id)
    }

    pub fn for_guest(&self, guest_id: &GuestId) -> Vec<Booking> {
        self.select(|booking| &booking.guest_id == guest_id)
    }

    pub fn for_host(&self, host_id: &HostId) -> Vec<Booking> {
        self.select(|booking| &booking.host_id == host_id)
    }

    pub fn with_status(&self, status: BookingStatus) -> Vec<Booking> {
        self.select(|booking| booking.status == status)
    }

    /// Matching bookings ordered by check-in, then id.
    fn select(&self, predicate: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let mut selected: Vec<Booking> = self
            .bookings
            .values()
            .filter(|booking| predicate(booking))
            .cloned()
            .collect();
        selected.sort_by(|a, b| {
            a.stay
                .check_in()
                .cmp(&b.stay.check_in())
                .then_with(|| a.id.cmp(&b.id))
        });
        selected
    }
}

/// Booking store holding one immutable ledger snapshot at a time.
#[derive(Debug, Default)]
pub struct LedgerRepository {
    snapshot: RwLock<BookingLedger>,
}

impl LedgerRepository {
    pub fn snapshot(&self) -> BookingLedger {
        self.snapshot
            .read()
            .expect("booking ledger lock poisoned")
            .clone()
    }

    fn apply(&self, event: LedgerEvent) -> Result<BookingLedger, RepositoryError> {
        let mut guard = self
            .snapshot
            .write()
            .expect("booking ledger lock poisoned");
        let next = guard.reduce(&event)?;
        *guard = next.clone();
        Ok(next)
    }
}

impl BookingRepository for LedgerRepository {
    fn find_by_property(&self, property_id: &PropertyId) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self.snapshot().for_property(property_id))
    }

    fn find_by_guest(&self, guest_id: &GuestId) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self.snapshot().for_guest(guest_id))
    }

    fn find_by_host(&self, host_id: &HostId) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self.snapshot().for_host(host_id))
    }

    fn find_by_status(
        &self,
        status: BookingStatus,
        limit: usize,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let mut bookings = self.snapshot().with_status(status);
        bookings.truncate(limit);
        Ok(bookings)
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        Ok(self.snapshot().get(id).cloned())
    }

    fn create(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        let id = booking.id.clone();
        let next = self.apply(LedgerEvent::Recorded(booking))?;
        next.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    fn update_status(
        &self,
        id: &BookingId,
        change: StatusChange,
    ) -> Result<Booking, RepositoryError> {
        let next = self.apply(LedgerEvent::StatusChanged {
            booking_id: id.clone(),
            change,
        })?;
        next.get(id).cloned().ok_or(RepositoryError::NotFound)
    }
}
