use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

use exotransit::catalog::{Candidate, EphemerisStore, JsonFileStore, Priority};
use exotransit::config::ExoConfig;
use exotransit::light_curve::relative_flux;
use exotransit::reconcile::{FeedOutcome, FeedStatus, Reconciler};
use exotransit::sky::{classify, moon_altitude, tier_bands, timeline_samples};
use exotransit::time::{format_utc, parse_epoch, TimeWindow};
use exotransit::transit::{find_transits, search_transits, SearchRequest, TransitEvent};

/// Samples drawn along a transit timeline by `sky`.
const TIMELINE_SAMPLES: usize = 61;

#[derive(Debug, Parser)]
#[command(
    name = "exotransit",
    version,
    about = "Exoplanet ephemeris reconciliation and transit observability"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to exotransit.toml lookup)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch both catalogs and reconcile them into the local store
    Update,
    /// List observable transits, soonest first
    Search(SearchArgs),
    /// Twilight bands and Moon altitude around the next observable transit of a planet
    Sky(SkyArgs),
    /// Replace the local store with an empty catalog
    Reset,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Window start, ISO 8601 (UTC unless a timescale is given)
    #[arg(long)]
    start: String,
    /// Window length in hours
    #[arg(long)]
    hours: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    min_alt: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    max_sun_alt: Option<f64>,
    /// Minimum depth, milli-magnitudes
    #[arg(long)]
    min_depth: Option<f64>,
    /// Faintest host magnitude
    #[arg(long)]
    max_mag: Option<f64>,
    /// Accepted priorities (repeatable)
    #[arg(long = "priority")]
    priorities: Vec<Priority>,
    /// Telescope aperture, inches
    #[arg(long)]
    aperture: Option<f64>,
}

#[derive(Debug, Args)]
struct SkyArgs {
    #[arg(long)]
    planet: String,
    #[arg(long)]
    start: String,
    /// How far ahead to look for an observable transit, hours
    #[arg(long, default_value_t = 720.0)]
    hours: f64,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("exotransit error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => ExoConfig::from_file(path)?,
        None => ExoConfig::from_default_location()?,
    };
    let store = JsonFileStore::open(&config.store.path)
        .with_context(|| format!("failed to open store {}", config.store.path.display()))?;

    match cli.command {
        Command::Update => update(&config, &store),
        Command::Search(args) => search(&config, &store, &args),
        Command::Sky(args) => sky(&config, &store, &args),
        Command::Reset => reset(&store),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("EXOTRANSIT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn describe(label: &str, outcome: &FeedOutcome) {
    let status = match &outcome.status {
        FeedStatus::Committed => "committed".to_string(),
        FeedStatus::Empty => "empty".to_string(),
        FeedStatus::RolledBack(reason) => format!("rolled back ({reason})"),
        FeedStatus::Unavailable(reason) => format!("unavailable ({reason})"),
    };
    println!(
        "{label:<9} {status}: {} processed, {} skipped, {} shadowed",
        outcome.processed, outcome.skipped, outcome.shadowed
    );
}

fn update(config: &ExoConfig, store: &JsonFileStore) -> anyhow::Result<()> {
    let report = Reconciler::new(store).update_from(&config.feed_client());

    describe("primary", &report.primary);
    describe("secondary", &report.secondary);
    println!(
        "{} stars, {} planets upserted",
        report.upserted_stars().len(),
        report.upserted_planets().len()
    );
    if !report.is_complete() {
        println!("update incomplete");
    }
    Ok(())
}

fn print_event(event: &TransitEvent) {
    let marker = if event.is_timing_uncertain() { " (!)" } else { "" };
    println!(
        "{}  {:<16} {:>3}  alt {:>5.1}° az {:>5.1}°  sun {:>6.1}°  moon {:>5.1}° {:>3.0}%  \
         depth {:>5.1} mmag  ±{:.1} min{marker}{}",
        format_utc(&event.mid_time),
        event.planet,
        event.priority.to_string(),
        event.altitude,
        event.azimuth,
        event.sun_altitude,
        event.moon_separation,
        event.moon_illumination * 100.0,
        event.depth_mmag,
        event.uncertainty_minutes,
        if event.meridian_flip { "  meridian flip" } else { "" },
    );
}

fn search(config: &ExoConfig, store: &JsonFileStore, args: &SearchArgs) -> anyhow::Result<()> {
    let start = parse_epoch(&args.start)?;
    let window = TimeWindow::from_start(start, args.hours.unwrap_or(config.search.window_hours))?;

    let mut constraints = config.constraints();
    if let Some(min_alt) = args.min_alt {
        constraints.min_altitude = min_alt;
    }
    if let Some(max_sun_alt) = args.max_sun_alt {
        constraints.max_sun_altitude = max_sun_alt;
    }

    let mut filter = config.candidate_filter()?;
    if let Some(min_depth) = args.min_depth {
        filter.min_depth_mmag = min_depth;
    }
    if let Some(max_mag) = args.max_mag {
        filter.max_magnitude = max_mag;
    }
    if !args.priorities.is_empty() {
        filter.priorities = args.priorities.clone();
    }

    let request = SearchRequest {
        observer: config.observer()?,
        window,
        constraints,
        filter,
        aperture_in: args.aperture.or(config.observer.aperture_in),
    };
    let outcome = search_transits(&store.snapshot(), &request);

    for event in &outcome.events {
        print_event(event);
    }
    println!(
        "{} transits from {} candidates, {} hidden by aperture",
        outcome.events.len(),
        outcome.candidates_considered,
        outcome.hidden_by_aperture
    );
    Ok(())
}

fn sky(config: &ExoConfig, store: &JsonFileStore, args: &SkyArgs) -> anyhow::Result<()> {
    let snapshot = store.snapshot();
    let Some(planet) = snapshot.planet(&args.planet) else {
        bail!("unknown planet '{}'", args.planet);
    };
    let star = snapshot
        .star(&planet.host)
        .with_context(|| format!("host star '{}' is missing", planet.host))?;

    let observer = config.observer()?;
    let window = TimeWindow::from_start(parse_epoch(&args.start)?, args.hours)?;
    let events = find_transits(
        &Candidate { planet, star },
        &observer,
        &window,
        &config.constraints(),
    );
    let Some(event) = events.first() else {
        println!("no observable transit of {} in the window", planet.name);
        return Ok(());
    };
    print_event(event);
    println!(
        "flux at mid-transit: {:.4}",
        relative_flux(event, &event.mid_time)
    );

    let samples = timeline_samples(event, TIMELINE_SAMPLES);
    let context = classify(&observer, &samples);
    for band in tier_bands(&samples, &context.tiers) {
        println!(
            "{:?}: {} → {}",
            band.tier,
            format_utc(&band.start),
            format_utc(&band.end)
        );
    }
    for (epoch, altitude) in samples
        .iter()
        .zip(moon_altitude(&observer, &samples))
        .step_by(10)
    {
        println!("moon {}  {altitude:>5.1}°", format_utc(epoch));
    }
    Ok(())
}

fn reset(store: &JsonFileStore) -> anyhow::Result<()> {
    let mut tx = store.begin();
    tx.clear();
    store.commit(tx)?;
    println!("store {} reset", store.path().display());
    Ok(())
}
