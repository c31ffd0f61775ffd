use crate::infra::{seed_listings, InMemoryPropertyCatalog, LoggingNotifier};
use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use homely_hub::bookings::{
    ActorRole, Booking, BookingPolicy, BookingRequest, BookingService, BookingServiceError,
    BookingStatus, GuestId, LedgerRepository, PropertyId,
};
use homely_hub::error::AppError;
use std::sync::Arc;

type DemoService = BookingService<LedgerRepository, InMemoryPropertyCatalog, LoggingNotifier>;

const DEMO_PROPERTY: &str = "prop-lakeside-cabin";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for the scenario (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Create bookings directly in the confirmed state.
    #[arg(long)]
    pub(crate) auto_confirm: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        auto_confirm,
    } = args;

    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    let day = |offset: i64| today + Duration::days(offset);

    let repository = Arc::new(LedgerRepository::default());
    let notifier = Arc::new(LoggingNotifier::default());
    let service: DemoService = BookingService::new(
        repository.clone(),
        Arc::new(InMemoryPropertyCatalog::with_listings(seed_listings())),
        notifier.clone(),
        BookingPolicy::new(auto_confirm, true, 1_000),
    );

    println!("HomelyHub booking demo (today {today})");
    println!("Property: {DEMO_PROPERTY}");

    println!("\n1. Guest requests a four-night stay");
    let first = service.request_booking(demo_request("guest-sam", day(30), day(34)), today)?;
    print_booking(&first);

    println!("\n2. Another guest books the adjacent nights");
    let adjacent = service.request_booking(demo_request("guest-kim", day(34), day(37)), today)?;
    print_booking(&adjacent);

    println!("\n3. A third guest asks for nights that straddle both stays");
    report_attempt(&service, demo_request("guest-jo", day(33), day(35)), today)?;

    if first.status == BookingStatus::Pending {
        println!("\n4. Host accepts the first request");
        let confirmed = service.transition_booking(
            &first.id,
            BookingStatus::Confirmed,
            ActorRole::Host,
            today,
        )?;
        print_booking(&confirmed);
    } else {
        println!("\n4. Auto-confirm policy: first request already confirmed");
    }

    println!("\n5. Second guest cancels, releasing their nights");
    let cancelled = service.transition_booking(
        &adjacent.id,
        BookingStatus::Cancelled,
        ActorRole::Guest,
        today,
    )?;
    print_booking(&cancelled);
    report_attempt(&service, demo_request("guest-jo", day(34), day(37)), today)?;

    println!("\n6. Completion sweep after the first stay checks out");
    let sweep_day = day(34);
    for booking in service.complete_elapsed(sweep_day)? {
        print_booking(&booking);
    }

    println!("\n7. Host tries to re-confirm the completed stay");
    match service.transition_booking(
        &first.id,
        BookingStatus::Confirmed,
        ActorRole::Host,
        sweep_day,
    ) {
        Ok(booking) => print_booking(&booking),
        Err(BookingServiceError::InvalidTransition(err)) => println!("  Rejected: {err}"),
        Err(other) => return Err(other.into()),
    }

    let snapshot = repository.snapshot();
    println!("\nLedger holds {} booking(s):", snapshot.len());
    for booking in snapshot.for_property(&PropertyId(DEMO_PROPERTY.to_string())) {
        println!(
            "  - {} {} {} ({} change(s) recorded)",
            booking.id,
            booking.stay,
            booking.status,
            booking.history.len()
        );
    }

    let notices = notifier.events();
    if notices.is_empty() {
        println!("\nNotifications: none dispatched");
    } else {
        println!("\nNotifications:");
        for notice in notices {
            println!("  - template={} -> {}", notice.template, notice.booking_id);
        }
    }

    Ok(())
}

fn demo_request(guest: &str, check_in: NaiveDate, check_out: NaiveDate) -> BookingRequest {
    BookingRequest {
        property_id: PropertyId(DEMO_PROPERTY.to_string()),
        guest_id: GuestId(guest.to_string()),
        check_in,
        check_out,
        guests: 2,
    }
}

fn report_attempt(
    service: &DemoService,
    request: BookingRequest,
    today: NaiveDate,
) -> Result<(), AppError> {
    let property_id = request.property_id.clone();
    let probe = service.check_availability(&property_id, request.check_in, request.check_out)?;
    println!(
        "  Availability for {}: {}",
        probe.stay,
        if probe.available { "free" } else { "taken" }
    );

    match service.request_booking(request, today) {
        Ok(booking) => print_booking(&booking),
        Err(BookingServiceError::AvailabilityConflict(conflict)) => {
            println!("  Rejected: {conflict}");
        }
        Err(other) => return Err(other.into()),
    }
    Ok(())
}

fn print_booking(booking: &Booking) {
    println!(
        "  {} | guest {} | {} ({} nights) | {} | total {}.{:02}",
        booking.id,
        booking.guest_id.0,
        booking.stay,
        booking.nights,
        booking.status,
        booking.pricing.total / 100,
        booking.pricing.total % 100
    );
}
