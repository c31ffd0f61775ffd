use chrono::NaiveDate;

use super::domain::{Booking, BookingId, InvalidDateRange, PropertyId, StayRange};

/// Raised when a requested stay collides with blocking bookings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{requested} overlaps {} existing booking(s) on property {property_id}",
    .conflicting.len()
)]
pub struct AvailabilityConflict {
    pub property_id: PropertyId,
    pub requested: StayRange,
    pub conflicting: Vec<BookingId>,
}

pub fn overlaps(a: &StayRange, b: &StayRange) -> bool {
    a.overlaps(b)
}

/// Blocking bookings on `property_id` that overlap `requested`.
pub fn conflicts<'a>(
    property_id: &'a PropertyId,
    requested: &'a StayRange,
    existing: &'a [Booking],
) -> impl Iterator<Item = &'a Booking> + 'a {
    existing.iter().filter(move |booking| {
        &booking.property_id == property_id
            && booking.is_blocking()
            && booking.stay.overlaps(requested)
    })
}

pub fn is_range_available(
    property_id: &PropertyId,
    requested: &StayRange,
    existing: &[Booking],
) -> bool {
    conflicts(property_id, requested, existing).next().is_none()
}

/// Date-level entry point; zero-night and reversed ranges are errors, not "available".
pub fn is_available(
    property_id: &PropertyId,
    check_in: NaiveDate,
    check_out: NaiveDate,
    existing: &[Booking],
) -> Result<bool, InvalidDateRange> {
    let requested = StayRange::new(check_in, check_out)?;
    Ok(is_range_available(property_id, &requested, existing))
}

pub fn ensure_available(
    property_id: &PropertyId,
    requested: &StayRange,
    existing: &[Booking],
) -> Result<(), AvailabilityConflict> {
    let conflicting: Vec<BookingId> = conflicts(property_id, requested, existing)
        .map(|booking| booking.id.clone())
        .collect();

    if conflicting.is_empty() {
        Ok(())
    } else {
        Err(AvailabilityConflict {
            property_id: property_id.clone(),
            requested: *requested,
            conflicting,
        })
    }
}
