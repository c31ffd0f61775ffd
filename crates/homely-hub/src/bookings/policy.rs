use crate::config::BookingPolicyConfig;

use super::domain::{BookingStatus, Pricing, PropertyListing, StayRange};

const BASIS_POINTS: u64 = 10_000;

/// Policy dials applied by the booking service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingPolicy {
    auto_confirm: bool,
    enforce_cancellation_cutoff: bool,
    service_fee_bps: u32,
}

impl BookingPolicy {
    pub fn new(
        auto_confirm: bool,
        enforce_cancellation_cutoff: bool,
        service_fee_bps: u32,
    ) -> Self {
        Self {
            auto_confirm,
            enforce_cancellation_cutoff,
            service_fee_bps: service_fee_bps.min(BASIS_POINTS as u32),
        }
    }

    pub fn initial_status(&self) -> BookingStatus {
        if self.auto_confirm {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        }
    }

    pub fn enforce_cancellation_cutoff(&self) -> bool {
        self.enforce_cancellation_cutoff
    }

    pub fn service_fee_bps(&self) -> u32 {
        self.service_fee_bps
    }

    pub fn quote(&self, listing: &PropertyListing, stay: &StayRange) -> Pricing {
        let nights = stay.nights();
        let subtotal = listing.nightly_rate.saturating_mul(u64::from(nights));
        let service_fee = subtotal.saturating_mul(u64::from(self.service_fee_bps)) / BASIS_POINTS;
        let total = subtotal
            .saturating_add(listing.cleaning_fee)
            .saturating_add(service_fee);

        Pricing {
            nightly_rate: listing.nightly_rate,
            nights,
            subtotal,
            cleaning_fee: listing.cleaning_fee,
            service_fee,
            total,
        }
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self::from(&BookingPolicyConfig::default())
    }
}

impl From<&BookingPolicyConfig> for BookingPolicy {
    fn from(config: &BookingPolicyConfig) -> Self {
        Self::new(
            config.auto_confirm,
            config.enforce_cancellation_cutoff,
            config.service_fee_bps,
        )
    }
}
