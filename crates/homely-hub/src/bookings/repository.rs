use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    Booking, BookingId, BookingStatus, GuestId, HostId, PropertyId, PropertyListing,
    StatusChange,
};

/// Storage abstraction so the service can be exercised in isolation.
pub trait BookingRepository: Send + Sync {
    fn find_by_property(&self, property_id: &PropertyId) -> Result<Vec<Booking>, RepositoryError>;
    fn find_by_guest(&self, guest_id: &GuestId) -> Result<Vec<Booking>, RepositoryError>;
    fn find_by_host(&self, host_id: &HostId) -> Result<Vec<Booking>, RepositoryError>;
    fn find_by_status(
        &self,
        status: BookingStatus,
        limit: usize,
    ) -> Result<Vec<Booking>, RepositoryError>;
    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;
    fn create(&self, booking: Booking) -> Result<Booking, RepositoryError>;
    fn update_status(
        &self,
        id: &BookingId,
        change: StatusChange,
    ) -> Result<Booking, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or violates a uniqueness constraint")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the listings guests book against.
pub trait PropertyCatalog: Send + Sync {
    fn listing(&self, property_id: &PropertyId) -> Result<Option<PropertyListing>, RepositoryError>;
}

/// Outbound hook for transactional e-mail adapters.
pub trait BookingNotifier: Send + Sync {
    fn publish(&self, notice: BookingNotice) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingNotice {
    pub template: String,
    pub booking_id: BookingId,
    pub details: BTreeMap<String, String>,
}

impl BookingNotice {
    pub fn for_booking(template: &str, booking: &Booking) -> Self {
        let mut details = BTreeMap::new();
        details.insert("property_id".to_string(), booking.property_id.0.clone());
        details.insert("guest_id".to_string(), booking.guest_id.0.clone());
        details.insert("host_id".to_string(), booking.host_id.0.clone());
        details.insert("check_in".to_string(), booking.stay.check_in().to_string());
        details.insert("check_out".to_string(), booking.stay.check_out().to_string());
        details.insert("status".to_string(), booking.status.label().to_string());
        details.insert("total".to_string(), booking.pricing.total.to_string());

        Self {
            template: template.to_string(),
            booking_id: booking.id.clone(),
            details,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
