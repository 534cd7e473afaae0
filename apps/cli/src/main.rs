use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use directory_core::{BakeryDirectory, DetailPresenter};
use maps_integration::MapStyle;
use places_integration::HttpPlaceLookup;
use shared::domain::{BakeryRecord, GeoPoint, TagState};
use tracing::{info, warn};

mod config;

use config::{load_seeds, load_settings, Settings};

#[derive(Parser, Debug)]
struct Cli {
    /// Latitude of the user position, for nearest-first ordering.
    #[arg(long, requires = "lng")]
    lat: Option<f64>,
    /// Longitude of the user position.
    #[arg(long, requires = "lat")]
    lng: Option<f64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every bakery, nearest first when a position is given.
    List,
    /// Case-insensitive search over names and addresses.
    Search { term: String },
    /// Print the full detail card for one bakery, matched by name.
    Show { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let settings = load_settings();
    let seeds = load_seeds(&settings.seed_path)?;

    let directory = if settings.places_api_key.is_empty() {
        warn!("no places API key configured; listings stay seed-only");
        BakeryDirectory::new()
    } else {
        let lookup = match &settings.details_endpoint {
            Some(endpoint) => HttpPlaceLookup::with_endpoint(endpoint, &settings.places_api_key)?,
            None => HttpPlaceLookup::new(&settings.places_api_key),
        };
        BakeryDirectory::with_lookup(Arc::new(lookup))
    };

    directory.load(seeds).await;
    if !settings.places_api_key.is_empty() {
        let report = directory.enrich_all().await;
        if report.failed > 0 {
            warn!(
                failed = report.failed,
                "some detail lookups failed; those records stay seed-only"
            );
        }
    }
    if let (Some(lat), Some(lng)) = (cli.lat, cli.lng) {
        directory.set_user_location(GeoPoint::new(lat, lng)).await;
    }

    let presenter = DetailPresenter::new();
    match cli.command {
        Command::List => {
            print_listing(&directory, &presenter, &directory.records().await);
        }
        Command::Search { term } => {
            let matches = directory.search(&term).await;
            if matches.is_empty() {
                println!("no bakery matches '{term}'");
            } else {
                print_listing(&directory, &presenter, &matches);
            }
        }
        Command::Show { name } => {
            let matches = directory.search(&name).await;
            match matches.first() {
                Some(record) => {
                    check_map_style(&settings);
                    print_detail(&directory, &presenter, &settings, record);
                }
                None => println!("no bakery matches '{name}'"),
            }
        }
    }

    Ok(())
}

fn print_listing(
    directory: &BakeryDirectory,
    presenter: &DetailPresenter,
    records: &[BakeryRecord],
) {
    for record in records {
        let name = directory.display_name(record);
        match presenter.distance_label(record) {
            Some(distance) => println!("{name} ({distance})"),
            None => println!("{name}"),
        }
        println!("  {}", record.formatted_address);
    }
}

fn print_detail(
    directory: &BakeryDirectory,
    presenter: &DetailPresenter,
    settings: &Settings,
    record: &BakeryRecord,
) {
    println!("{}", directory.display_name(record));
    println!("{}", presenter.format_address_lines(record));
    if let Some(distance) = presenter.distance_label(record) {
        println!("{distance}");
    }
    println!();
    println!("{}", presenter.format_hours(record));
    println!();
    println!("Website: {}", presenter.website_action(record).label);
    println!("Phone:   {}", presenter.phone_action(record).label);
    for row in presenter.tag_rows(record) {
        let mark = match row.state {
            TagState::Confirmed => "yes",
            TagState::Absent => "no",
            TagState::Unknown => "unknown",
        };
        println!("{}: {mark}", row.label);
    }
    if let Some(note) = &record.info_note {
        println!("{note}");
    }
    if !settings.places_api_key.is_empty() {
        for url in presenter.photo_urls(record, settings.photo_max_width, &settings.places_api_key)
        {
            println!("Photo: {url}");
        }
    }
    println!("Directions: {}", presenter.directions_url(record));
}

/// A bad or missing style file is logged; the detail card renders either way.
fn check_map_style(settings: &Settings) {
    let Some(path) = &settings.map_style_path else {
        return;
    };
    match MapStyle::load(Path::new(path)) {
        Ok(_) => info!(path = %path, "map style loaded"),
        Err(error) => warn!(path = %path, %error, "map style unusable; continuing without it"),
    }
}
