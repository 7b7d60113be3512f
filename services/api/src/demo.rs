use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Args;

use huntfield::config::AppConfig;
use huntfield::error::AppError;
use huntfield::workflows::booking::{
    Actor, DateRange, FieldDraft, GeoPoint, PriceSchedule, RequestContext, Role, SpeciesQuota,
};
use huntfield::workflows::hunt::{AnimalCondition, AnimalDraft, ReportDraft};
use huntfield::workflows::roster::RosterImporter;

use crate::server::build_core_state;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the demo's notion of today (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Optional roster CSV to bulk-register fields before the walkthrough
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let core = build_core_state(config.verification);
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let admin = RequestContext::new(Actor::new("demo-admin", Role::Admin), today);
    let owner = RequestContext::new(Actor::new("demo-owner", Role::LandownerMember), today);
    let hunter = RequestContext::new(Actor::new("demo-hunter", Role::ShootingMember), today);

    println!("Huntfield marketplace demo ({today})");

    if let Some(path) = args.roster {
        let importer = RosterImporter::new(&core.catalog);
        let outcome = importer.from_path(&admin, &path)?;
        println!(
            "roster import: {} registered, {} rejected",
            outcome.registered.len(),
            outcome.rejected.len()
        );
        for rejection in &outcome.rejected {
            println!("  line {}: {}", rejection.line, rejection.reason);
        }
    }

    let field = core
        .catalog
        .register_field(
            &owner,
            FieldDraft {
                name: "Black Fen".to_string(),
                owner: None,
                location: GeoPoint { lat: 52.2, lon: 0.12 },
                species: vec![
                    SpeciesQuota {
                        species: "Deer".to_string(),
                        limit: 2,
                    },
                    SpeciesQuota {
                        species: "Pheasant".to_string(),
                        limit: 10,
                    },
                ],
                pricing: PriceSchedule::flat(250).with_rate(Role::ShootingMember, 80),
                capacity: 4,
                blocked_dates: Vec::new(),
                auto_approve: false,
            },
        )?;
    println!("registered field {} ({})", field.id, field.name);

    let dates = DateRange::single(today);
    let booking = core
        .bookings
        .create_booking(&hunter, &field.id, dates, 2)?;
    println!(
        "booking {} created: {} at {} for the day",
        booking.id, booking.status, booking.price
    );

    let booking = core
        .bookings
        .approve(&owner, &booking.id)?;
    println!(
        "booking {} approved, payment reference {}",
        booking.id,
        booking.payment_reference.as_deref().unwrap_or("-")
    );

    let session = core
        .hunts
        .start_day(&hunter, &booking.id)?;
    println!("session {} is {}", session.id, session.state);

    let report = core
        .hunts
        .finish_hunt(
            &hunter,
            &booking.id,
            ReportDraft {
                ground_remarks: "clear morning, tracks by the beck".to_string(),
                conditions: Some("light frost".to_string()),
                hours_afield: Some(5.5),
                animals: vec![AnimalDraft {
                    species: "Deer".to_string(),
                    condition: AnimalCondition::Good,
                    disease: None,
                }],
            },
        )?;
    println!(
        "report {} committed with {} animal(s)",
        report.id,
        report.animals_taken()
    );

    for animal in &report.animals {
        if let Some(number) = animal.tag_number {
            let tag = core.issuer.verify(&number)?;
            println!(
                "  {} tag {} -> {}",
                tag.species,
                tag.verification_code,
                core.verification.link_for(&number)
            );
        }
    }

    let report = core
        .hunts
        .attach_review(&hunter, &report.id, 5, "good stalking ground".to_string())?;
    if let Some(review) = &report.review {
        println!(
            "review attached: {}/5 (verified: {})",
            review.rating, review.verified
        );
    }

    Ok(())
}
