use chrono::NaiveDate;
use homely_hub::bookings::{
    BookingNotice, BookingNotifier, HostId, NotificationError, PropertyCatalog, PropertyId,
    PropertyListing, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPropertyCatalog {
    listings: Arc<HashMap<PropertyId, PropertyListing>>,
}

impl InMemoryPropertyCatalog {
    pub(crate) fn with_listings(listings: impl IntoIterator<Item = PropertyListing>) -> Self {
        let listings = listings
            .into_iter()
            .map(|listing| (listing.property_id.clone(), listing))
            .collect();
        Self {
            listings: Arc::new(listings),
        }
    }
}

impl PropertyCatalog for InMemoryPropertyCatalog {
    fn listing(
        &self,
        property_id: &PropertyId,
    ) -> Result<Option<PropertyListing>, RepositoryError> {
        Ok(self.listings.get(property_id).cloned())
    }
}

/// Notifier standing in for the e-mail adapter: logs each notice and keeps it for inspection.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifier {
    events: Arc<Mutex<Vec<BookingNotice>>>,
}

impl BookingNotifier for LoggingNotifier {
    fn publish(&self, notice: BookingNotice) -> Result<(), NotificationError> {
        info!(
            template = %notice.template,
            booking_id = %notice.booking_id,
            "booking notice dispatched"
        );
        let mut guard = self.events.lock().expect("notifier mutex poisoned");
        guard.push(notice);
        Ok(())
    }
}

impl LoggingNotifier {
    pub(crate) fn events(&self) -> Vec<BookingNotice> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

/// Listings the service boots with until a catalog backend is attached.
pub(crate) fn seed_listings() -> Vec<PropertyListing> {
    vec![
        PropertyListing {
            property_id: PropertyId("prop-lakeside-cabin".to_string()),
            host_id: HostId("host-ana".to_string()),
            title: "Lakeside cabin with private dock".to_string(),
            nightly_rate: 14_500,
            cleaning_fee: 6_000,
            max_guests: 4,
        },
        PropertyListing {
            property_id: PropertyId("prop-city-loft".to_string()),
            host_id: HostId("host-lee".to_string()),
            title: "Downtown loft near the river walk".to_string(),
            nightly_rate: 9_800,
            cleaning_fee: 3_500,
            max_guests: 2,
        },
        PropertyListing {
            property_id: PropertyId("prop-hillside-villa".to_string()),
            host_id: HostId("host-ana".to_string()),
            title: "Hillside villa with pool".to_string(),
            nightly_rate: 32_000,
            cleaning_fee: 12_000,
            max_guests: 10,
        },
    ]
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
