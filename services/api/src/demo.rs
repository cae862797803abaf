use crate::infra::{
    demo_landlord, demo_second_student, demo_student, seed_demo_properties, CollectingNotifier,
    InMemoryBookingStore, InMemoryOwnershipDirectory,
};
use campusnest::bookings::{BookingService, BookingSubmission, GuardedStore, PropertyId};
use campusnest::error::AppError;
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Requested check-in date (YYYY-MM-DD). Defaults to 30 days out.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) check_in: Option<NaiveDate>,
    /// Requested check-out date (YYYY-MM-DD). Defaults to check-in + 270 days.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) check_out: Option<NaiveDate>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let check_in = args
        .check_in
        .unwrap_or_else(|| Local::now().date_naive() + Duration::days(30));
    let check_out = args.check_out.unwrap_or(check_in + Duration::days(270));

    println!("CampusNest booking lifecycle demo");

    let store = Arc::new(GuardedStore::new(InMemoryBookingStore::default()));
    let directory = Arc::new(InMemoryOwnershipDirectory::default());
    seed_demo_properties(&directory);
    let notifier = Arc::new(CollectingNotifier::default());
    let service = BookingService::new(store, directory, notifier.clone());

    let student = demo_student();
    let landlord = demo_landlord();
    let submission = BookingSubmission {
        property_id: PropertyId("maple-12".to_string()),
        check_in: Some(check_in),
        check_out: Some(check_out),
        total_price: Some(7_650.0),
        notes: Some("Arriving a day early if possible.".to_string()),
    };

    let record = service.request_booking(&student, submission.clone())?;
    println!(
        "- {} requested {} -> booking {} ({})",
        student.id.0, record.booking.property.0, record.booking.id.0, record.booking.status
    );

    match service.request_booking(&student, submission.clone()) {
        Err(err) => println!("- repeat request refused: {err}"),
        Ok(_) => println!("- repeat request unexpectedly admitted"),
    }

    let approved = service.approve_booking(&landlord, &record.booking.id)?;
    println!(
        "- {} approved the booking ({})",
        landlord.id.0, approved.booking.status
    );

    let cancelled = service.cancel_booking(&student, &record.booking.id)?;
    println!(
        "- {} cancelled the booking ({}, by {})",
        student.id.0,
        cancelled.booking.status,
        cancelled
            .booking
            .cancelled_by
            .map(|party| party.label())
            .unwrap_or("unknown")
    );

    match service.approve_booking(&landlord, &record.booking.id) {
        Err(err) => println!("- late approval refused: {err}"),
        Ok(_) => println!("- late approval unexpectedly admitted"),
    }

    let second = service.request_booking(&student, submission)?;
    println!(
        "- cancellation freed the pair: new booking {} ({})",
        second.booking.id.0, second.booking.status
    );

    let other = demo_second_student();
    let other_submission = BookingSubmission {
        property_id: PropertyId("birch-4".to_string()),
        check_in: Some(check_in),
        check_out: None,
        total_price: None,
        notes: None,
    };
    let other_record = service.request_booking(&other, other_submission)?;
    let rejected = service.reject_booking(&landlord, &other_record.booking.id)?;
    println!(
        "- {} rejected {}'s request for {} ({})",
        landlord.id.0, other.id.0, rejected.booking.property.0, rejected.booking.status
    );

    println!("\nNotices dispatched");
    for notice in notifier.notices() {
        println!(
            "- template={} booking={} recipient={}",
            notice.template, notice.booking_id.0, notice.recipient.0
        );
    }

    Ok(())
}
