//! Booking lifecycle: availability checks, status transitions, and the service and HTTP
//! router composing them over pluggable repository, catalog, and notifier collaborators.

pub mod availability;
pub mod domain;
pub mod ledger;
pub mod lifecycle;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use availability::{is_available, overlaps, AvailabilityConflict};
pub use domain::{
    ActorRole, Booking, BookingId, BookingRequest, BookingStatus, GuestId, HostId,
    InvalidDateRange, Pricing, PropertyId, PropertyListing, StatusChange, StayRange,
};
pub use ledger::{BookingLedger, LedgerError, LedgerEvent, LedgerRepository};
pub use lifecycle::{check_transition, InvalidTransition, TransitionContext, TransitionRejection};
pub use policy::BookingPolicy;
pub use repository::{
    BookingNotice, BookingNotifier, BookingRepository, NotificationError, PropertyCatalog,
    RepositoryError,
};
pub use router::{booking_router, status_for, AvailabilityQuery, TransitionRequest};
pub use service::{AvailabilityReport, BookingService, BookingServiceError};
