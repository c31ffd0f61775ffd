use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::bookings::domain::{
    Booking, BookingId, BookingRequest, BookingStatus, GuestId, HostId, Pricing, PropertyId,
    PropertyListing, StatusChange, StayRange,
};
use crate::bookings::policy::BookingPolicy;
use crate::bookings::repository::{
    BookingNotice, BookingNotifier, BookingRepository, NotificationError, PropertyCatalog,
    RepositoryError,
};
use crate::bookings::{booking_router, BookingService};

pub(super) const LAKESIDE: &str = "prop-lakeside";
pub(super) const LOFT: &str = "prop-loft";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn june(day: u32) -> NaiveDate {
    date(2024, 6, day)
}

/// Reference "today" for scenarios set in June 2024.
pub(super) fn may_first() -> NaiveDate {
    date(2024, 5, 1)
}

pub(super) fn stay(check_in: NaiveDate, check_out: NaiveDate) -> StayRange {
    StayRange::new(check_in, check_out).expect("valid stay")
}

pub(super) fn listing(property: &str) -> PropertyListing {
    PropertyListing {
        property_id: PropertyId(property.to_string()),
        host_id: HostId("host-ana".to_string()),
        title: "Lakeside cabin".to_string(),
        nightly_rate: 12_500,
        cleaning_fee: 4_000,
        max_guests: 4,
    }
}

pub(super) fn request(check_in: NaiveDate, check_out: NaiveDate) -> BookingRequest {
    BookingRequest {
        property_id: PropertyId(LAKESIDE.to_string()),
        guest_id: GuestId("guest-sam".to_string()),
        check_in,
        check_out,
        guests: 2,
    }
}

/// Stored booking fixture for pure availability checks.
pub(super) fn booking(
    id: &str,
    property: &str,
    range: StayRange,
    status: BookingStatus,
) -> Booking {
    let created = Utc
        .with_ymd_and_hms(2024, 4, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp");
    Booking {
        id: BookingId(id.to_string()),
        property_id: PropertyId(property.to_string()),
        guest_id: GuestId("guest-kim".to_string()),
        host_id: HostId("host-ana".to_string()),
        stay: range,
        nights: range.nights(),
        total_guests: 2,
        pricing: Pricing {
            nightly_rate: 10_000,
            nights: range.nights(),
            subtotal: 10_000 * u64::from(range.nights()),
            cleaning_fee: 0,
            service_fee: 0,
            total: 10_000 * u64::from(range.nights()),
        },
        status,
        created_at: created,
        updated_at: created,
        history: Vec::new(),
    }
}

pub(super) fn build_service(
    policy: BookingPolicy,
) -> (
    BookingService<MemoryRepository, MemoryCatalog, MemoryNotifier>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = BookingService::new(
        repository.clone(),
        Arc::new(MemoryCatalog::with_listings([listing(LAKESIDE), listing(LOFT)])),
        notifier.clone(),
        policy,
    );
    (service, repository, notifier)
}

pub(super) fn booking_router_with_service(
    service: BookingService<MemoryRepository, MemoryCatalog, MemoryNotifier>,
) -> axum::Router {
    booking_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<BookingId, Booking>>>,
}

impl MemoryRepository {
    fn select(&self, predicate: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut matches: Vec<Booking> = guard.values().filter(|b| predicate(b)).cloned().collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    pub(super) fn insert_raw(&self, booking: Booking) {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(booking.id.clone(), booking);
    }
}

impl BookingRepository for MemoryRepository {
    fn find_by_property(&self, property_id: &PropertyId) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self.select(|booking| &booking.property_id == property_id))
    }

    fn find_by_guest(&self, guest_id: &GuestId) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self.select(|booking| &booking.guest_id == guest_id))
    }

    fn find_by_host(&self, host_id: &HostId) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self.select(|booking| &booking.host_id == host_id))
    }

    fn find_by_status(
        &self,
        status: BookingStatus,
        limit: usize,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let mut matches = self.select(|booking| booking.status == status);
        matches.truncate(limit);
        Ok(matches)
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn create(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&booking.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(booking.id.clone(), booking.clone());
        Ok(booking)
    }

    fn update_status(
        &self,
        id: &BookingId,
        change: StatusChange,
    ) -> Result<Booking, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let current = guard.get(id).ok_or(RepositoryError::NotFound)?;
        let updated = current.with_change(change);
        guard.insert(id.clone(), updated.clone());
        Ok(updated)
    }
}

pub(super) struct MemoryCatalog {
    listings: HashMap<PropertyId, PropertyListing>,
}

impl MemoryCatalog {
    pub(super) fn with_listings(listings: impl IntoIterator<Item = PropertyListing>) -> Self {
        Self {
            listings: listings
                .into_iter()
                .map(|listing| (listing.property_id.clone(), listing))
                .collect(),
        }
    }
}

impl PropertyCatalog for MemoryCatalog {
    fn listing(
        &self,
        property_id: &PropertyId,
    ) -> Result<Option<PropertyListing>, RepositoryError> {
        Ok(self.listings.get(property_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<BookingNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<BookingNotice> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|notice| notice.template)
            .collect()
    }
}

impl BookingNotifier for MemoryNotifier {
    fn publish(&self, notice: BookingNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct OfflineNotifier;

impl BookingNotifier for OfflineNotifier {
    fn publish(&self, _notice: BookingNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl BookingRepository for UnavailableRepository {
    fn find_by_property(&self, _property_id: &PropertyId) -> Result<Vec<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_guest(&self, _guest_id: &GuestId) -> Result<Vec<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_host(&self, _host_id: &HostId) -> Result<Vec<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_status(
        &self,
        _status: BookingStatus,
        _limit: usize,
    ) -> Result<Vec<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn create(&self, _booking: Booking) -> Result<Booking, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_status(
        &self,
        _id: &BookingId,
        _change: StatusChange,
    ) -> Result<Booking, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
