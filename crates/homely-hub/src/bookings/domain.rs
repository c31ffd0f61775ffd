use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored bookings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostId(pub String);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reasons a pair of calendar dates cannot describe a stay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDateRange {
    #[error("check-in and check-out both fall on {date}; a stay needs at least one night")]
    ZeroNights { date: NaiveDate },
    #[error("check-out {check_out} is before check-in {check_in}")]
    CheckOutBeforeCheckIn {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    #[error("check-in {check_in} is in the past (today is {today})")]
    CheckInPast { check_in: NaiveDate, today: NaiveDate },
}

/// Half-open `[check_in, check_out)` range of nights. Always at least one night long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, InvalidDateRange> {
        if check_in == check_out {
            return Err(InvalidDateRange::ZeroNights { date: check_in });
        }
        if check_out < check_in {
            return Err(InvalidDateRange::CheckOutBeforeCheckIn {
                check_in,
                check_out,
            });
        }

        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Same as [`StayRange::new`], additionally refusing stays that start before `today`.
    pub fn upcoming(
        check_in: NaiveDate,
        check_out: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, InvalidDateRange> {
        let range = Self::new(check_in, check_out)?;
        if check_in < today {
            return Err(InvalidDateRange::CheckInPast { check_in, today });
        }
        Ok(range)
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn nights(&self) -> u32 {
        let days = (self.check_out - self.check_in).num_days();
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

impl<'de> Deserialize<'de> for StayRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawRange {
            check_in: NaiveDate,
            check_out: NaiveDate,
        }

        let raw = RawRange::deserialize(deserializer)?;
        StayRange::new(raw.check_in, raw.check_out).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for StayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.check_in, self.check_out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Pending and confirmed stays hold their nights; everything else releases them.
    pub const fn is_blocking(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Guest,
    Host,
    Admin,
    System,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            ActorRole::Guest => "guest",
            ActorRole::Host => "host",
            ActorRole::Admin => "admin",
            ActorRole::System => "system",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Price breakdown in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub nightly_rate: u64,
    pub nights: u32,
    pub subtotal: u64,
    pub cleaning_fee: u64,
    pub service_fee: u64,
    pub total: u64,
}

/// Listing details the booking core needs from the property catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyListing {
    pub property_id: PropertyId,
    pub host_id: HostId,
    pub title: String,
    pub nightly_rate: u64,
    pub cleaning_fee: u64,
    pub max_guests: u32,
}

/// Raw reservation request as received from a guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub property_id: PropertyId,
    pub guest_id: GuestId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
}

/// One entry of a booking's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub actor: ActorRole,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub property_id: PropertyId,
    pub guest_id: GuestId,
    pub host_id: HostId,
    #[serde(flatten)]
    pub stay: StayRange,
    pub nights: u32,
    pub total_guests: u32,
    pub pricing: Pricing,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<StatusChange>,
}

impl Booking {
    pub fn is_blocking(&self) -> bool {
        self.status.is_blocking()
    }

    /// Copy of this booking with `change` applied and recorded in the history.
    pub fn with_change(&self, change: StatusChange) -> Booking {
        let mut next = self.clone();
        next.status = change.to;
        next.updated_at = change.at;
        next.history.push(change);
        next
    }
}
