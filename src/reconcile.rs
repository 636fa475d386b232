//! # Ephemeris reconciliation
//!
//! Merges the primary (curated) and secondary (archive) feeds into the ephemeris store.
//!
//! ## Precedence
//!
//! 1. The primary feed is processed in full and committed as one batch. Every planet name it
//!    contains is recorded, normalized, in a [`SeenNames`] set.
//! 2. The secondary feed is processed next, as a second batch. Rows whose normalized planet
//!    name is in the seen set are skipped entirely, so archive values never overwrite a
//!    planet the primary feed described in the same run.
//!
//! Across runs, records are matched by normalized name as well. A primary record replaces
//! an archive record stored under another spelling, and archive rows never touch a record
//! the primary feed wrote in an earlier run.
//!
//! The seen set is returned by [`Reconciler::apply_primary`] and passed explicitly to
//! [`Reconciler::apply_secondary`].
//!
//! ## Overwrite rules
//!
//! | Feed | Star | Planet |
//! |------|------|--------|
//! | primary | RA/Dec/magnitude always overwritten | every ephemeris field overwritten |
//! | secondary | only defined values overwrite | only defined values overwrite, priority reset to `Normal` |
//!
//! ## Failure handling
//!
//! - A feed that could not be fetched or read is logged and handled as an empty feed.
//! - A record that cannot be used is logged and skipped.
//! - A batch the store refuses to commit is rolled back as a whole and reported in the
//!   [`ReconcileReport`]; the other batch is unaffected.
//!
//! Running the reconciler twice on identical feeds leaves the store unchanged the second time.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, error, info, warn};

use crate::catalog::{
    CatalogTransaction, EphemerisRepository, EphemerisStore, Planet, Priority, Provenance, Star,
};
use crate::constants::{Degree, MilliMag};
use crate::conversion::parse_radec;
use crate::exo_errors::ExoError;
use crate::feeds::{FeedError, FeedSource, PrimaryFeed, PrimaryRecord, SecondaryFeed, SecondaryRow};

/// Normalized planet names already supplied by the primary feed during this run.
pub type SeenNames = HashSet<String>;

pub use crate::catalog::normalize_name;

/// Convert a transit depth in percent of the stellar flux into milli-magnitudes.
///
/// ```text
/// f = pct / 100
/// depth = −2.5 · log10(1 − f) · 1000   if 0 < f < 1
///       = 0                             otherwise
/// ```
pub fn depth_percent_to_mmag(depth_percent: f64) -> MilliMag {
    let fraction = depth_percent / 100.0;
    if fraction > 0.0 && fraction < 1.0 {
        -2.5 * (1.0 - fraction).log10() * 1000.0
    } else {
        0.0
    }
}

/// Final state of one feed's batch.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedStatus {
    /// The batch is visible in the store.
    Committed,
    /// The store refused the batch; none of its changes are visible.
    RolledBack(String),
    /// The feed had no records.
    Empty,
    /// The feed could not be fetched or read; handled as empty.
    Unavailable(String),
}

/// Per-feed summary of a reconciliation run.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOutcome {
    /// Records written to the batch.
    pub processed: usize,
    /// Records rejected because they could not be used.
    pub skipped: usize,
    /// Secondary rows ignored because the primary feed already supplied the planet.
    pub shadowed: usize,
    /// Names of the upserted stars.
    pub stars: BTreeSet<String>,
    /// Names of the upserted planets.
    pub planets: BTreeSet<String>,
    pub status: FeedStatus,
}

impl FeedOutcome {
    fn with_status(status: FeedStatus) -> Self {
        FeedOutcome {
            processed: 0,
            skipped: 0,
            shadowed: 0,
            stars: BTreeSet::new(),
            planets: BTreeSet::new(),
            status,
        }
    }

    fn record(&mut self, star: &str, planet: &str) {
        self.processed += 1;
        self.stars.insert(star.to_string());
        self.planets.insert(planet.to_string());
    }

    /// `false` when the batch was rolled back.
    pub fn is_complete(&self) -> bool {
        !matches!(self.status, FeedStatus::RolledBack(_))
    }
}

/// Result of [`Reconciler::reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub primary: FeedOutcome,
    pub secondary: FeedOutcome,
}

impl ReconcileReport {
    /// `false` when at least one batch was rolled back ("update incomplete").
    pub fn is_complete(&self) -> bool {
        self.primary.is_complete() && self.secondary.is_complete()
    }

    /// Stars upserted by either feed, sorted by name.
    pub fn upserted_stars(&self) -> BTreeSet<String> {
        self.committed()
            .flat_map(|outcome| outcome.stars.iter().cloned())
            .collect()
    }

    /// Planets upserted by either feed, sorted by name.
    pub fn upserted_planets(&self) -> BTreeSet<String> {
        self.committed()
            .flat_map(|outcome| outcome.planets.iter().cloned())
            .collect()
    }

    fn committed(&self) -> impl Iterator<Item = &FeedOutcome> {
        [&self.primary, &self.secondary]
            .into_iter()
            .filter(|outcome| outcome.status == FeedStatus::Committed)
    }
}

/// Sole writer of the ephemeris store.
pub struct Reconciler<'s, S: EphemerisStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: EphemerisStore + ?Sized> Reconciler<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Reconciler { store }
    }

    /// Fetch both feeds from `source` and reconcile them.
    ///
    /// The secondary feed is only fetched once the primary batch has been committed or
    /// rolled back.
    pub fn update_from(&self, source: &impl FeedSource) -> ReconcileReport {
        let (primary, seen) = self.apply_primary(source.fetch_primary());
        let secondary = self.apply_secondary(source.fetch_secondary(), &seen);
        ReconcileReport { primary, secondary }
    }

    /// Reconcile two already fetched feeds.
    pub fn reconcile(
        &self,
        primary: Result<PrimaryFeed, FeedError>,
        secondary: Result<SecondaryFeed, FeedError>,
    ) -> ReconcileReport {
        let (primary, seen) = self.apply_primary(primary);
        let secondary = self.apply_secondary(secondary, &seen);
        ReconcileReport { primary, secondary }
    }

    /// Process and commit the primary feed.
    ///
    /// Return
    /// ------
    /// * The batch outcome and the normalized names of every planet the feed describes.
    ///   The names are collected whatever the commit outcome, so precedence only depends on
    ///   feed content.
    pub fn apply_primary(&self, feed: Result<PrimaryFeed, FeedError>) -> (FeedOutcome, SeenNames) {
        let mut seen = SeenNames::new();
        let records = match feed {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "primary feed unavailable, continuing without it");
                return (FeedOutcome::with_status(FeedStatus::Unavailable(e.to_string())), seen);
            }
        };
        if records.is_empty() {
            info!("primary feed is empty");
            return (FeedOutcome::with_status(FeedStatus::Empty), seen);
        }

        let mut tx = self.store.begin();
        let mut outcome = FeedOutcome::with_status(FeedStatus::Committed);
        for record in records {
            let applied = record.and_then(|rec| {
                seen.insert(normalize_name(&rec.name));
                upsert_primary(&mut tx, &rec).map(|()| rec)
            });
            match applied {
                Ok(rec) => outcome.record(&rec.host, &rec.name),
                Err(e) => {
                    warn!(error = %e, "primary record skipped");
                    outcome.skipped += 1;
                }
            }
        }

        outcome.status = self.commit("primary", tx, &outcome);
        (outcome, seen)
    }

    /// Process and commit the secondary feed, ignoring planets listed in `seen`.
    pub fn apply_secondary(
        &self,
        feed: Result<SecondaryFeed, FeedError>,
        seen: &SeenNames,
    ) -> FeedOutcome {
        let rows = match feed {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "secondary feed unavailable, continuing without it");
                return FeedOutcome::with_status(FeedStatus::Unavailable(e.to_string()));
            }
        };
        if rows.is_empty() {
            info!("secondary feed is empty");
            return FeedOutcome::with_status(FeedStatus::Empty);
        }

        let mut tx = self.store.begin();
        let mut outcome = FeedOutcome::with_status(FeedStatus::Committed);
        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(error = %e, "secondary row skipped");
                    outcome.skipped += 1;
                    continue;
                }
            };
            let primary_sourced = tx
                .find_planet_like(&row.name)
                .is_some_and(|planet| planet.source == Provenance::Primary);
            if primary_sourced || seen.contains(&normalize_name(&row.name)) {
                debug!(planet = %row.name, "already supplied by the primary feed");
                outcome.shadowed += 1;
                continue;
            }
            match upsert_secondary(&mut tx, &row) {
                Ok(stored) => outcome.record(&row.host, &stored),
                Err(e) => {
                    warn!(planet = %row.name, error = %e, "secondary row skipped");
                    outcome.skipped += 1;
                }
            }
        }

        outcome.status = self.commit("secondary", tx, &outcome);
        outcome
    }

    fn commit(&self, feed: &str, tx: CatalogTransaction, outcome: &FeedOutcome) -> FeedStatus {
        match self.store.commit(tx) {
            Ok(()) => {
                info!(
                    feed,
                    processed = outcome.processed,
                    skipped = outcome.skipped,
                    shadowed = outcome.shadowed,
                    "batch committed"
                );
                FeedStatus::Committed
            }
            Err(e) => {
                error!(feed, error = %e, "batch rolled back, update incomplete");
                FeedStatus::RolledBack(e.to_string())
            }
        }
    }
}

/// Sky position of a primary record, (0, 0) when it cannot be resolved.
fn primary_coordinates(rec: &PrimaryRecord) -> (Degree, Degree) {
    let parsed = match (&rec.ra, &rec.dec) {
        (Some(ra), Some(dec)) => parse_radec(ra, dec),
        _ => Err(ExoError::MissingField(format!("{}: ra_j2000/dec_j2000", rec.name))),
    };
    parsed.unwrap_or_else(|e| {
        warn!(planet = %rec.name, error = %e, "coordinates unavailable, using (0, 0)");
        (0.0, 0.0)
    })
}

fn upsert_primary(tx: &mut CatalogTransaction, rec: &PrimaryRecord) -> Result<(), ExoError> {
    let (ra, dec) = primary_coordinates(rec);

    let star = match tx.find_star(&rec.host) {
        Some(mut star) => {
            star.ra = ra;
            star.dec = dec;
            star.magnitude = Some(rec.magnitude);
            star
        }
        None => Star::new(rec.host.clone(), ra, dec, Some(rec.magnitude)),
    };
    tx.upsert_star(star)?;

    if let Some(stale) = tx
        .find_planet_like(&rec.name)
        .filter(|planet| planet.name != rec.name)
    {
        debug!(
            planet = %rec.name,
            replaced = %stale.name,
            "replacing record stored under another spelling"
        );
        tx.remove_planet(&stale.name);
    }

    let priority = Priority::from_label(&rec.priority).unwrap_or_else(|| {
        warn!(planet = %rec.name, priority = %rec.priority, "unknown priority, using Normal");
        Priority::Normal
    });

    tx.upsert_planet(Planet {
        name: rec.name.clone(),
        host: rec.host.clone(),
        period: rec.period,
        epoch: rec.epoch,
        duration_hours: rec.duration_hours,
        depth_mmag: rec.depth_mmag,
        period_uncertainty: rec.period_uncertainty,
        epoch_uncertainty: rec.epoch_uncertainty,
        min_aperture_in: rec.min_aperture_in,
        priority,
        source: Provenance::Primary,
    })?;
    Ok(())
}

/// Returns the name the planet is stored under.
fn upsert_secondary(tx: &mut CatalogTransaction, row: &SecondaryRow) -> Result<String, ExoError> {
    let ra = row.ra.filter(|ra| (0.0..360.0).contains(ra));
    let dec = row.dec.filter(|dec| (-90.0..=90.0).contains(dec));

    let star = match tx.find_star(&row.host) {
        Some(mut star) => {
            if let Some(ra) = ra {
                star.ra = ra;
            }
            if let Some(dec) = dec {
                star.dec = dec;
            }
            if row.magnitude.is_some() {
                star.magnitude = row.magnitude;
            }
            star
        }
        None => Star::new(
            row.host.clone(),
            ra.unwrap_or(0.0),
            dec.unwrap_or(0.0),
            row.magnitude,
        ),
    };
    tx.upsert_star(star)?;

    let duration = row.duration_hours.filter(|d| *d >= 0.0);
    let depth = row.depth_percent.map(depth_percent_to_mmag);

    let mut planet = tx
        .find_planet_like(&row.name)
        .unwrap_or_else(|| Planet::new(row.name.clone(), row.host.clone()));
    planet.host = row.host.clone();
    if row.period.is_some() {
        planet.period = row.period;
    }
    if row.epoch.is_some() {
        planet.epoch = row.epoch;
    }
    if let Some(duration) = duration {
        planet.duration_hours = duration;
    }
    if let Some(depth) = depth {
        planet.depth_mmag = depth;
    }
    planet.priority = Priority::Normal;
    planet.source = Provenance::Secondary;
    let stored = planet.name.clone();
    tx.upsert_planet(planet)?;
    Ok(stored)
}
