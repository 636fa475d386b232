//! # Ephemeris catalog
//!
//! Canonical records produced by the reconciler and consumed by the transit search:
//!
//! - [`Star`]: a host star identified by its exact, case-sensitive name.
//! - [`Planet`]: a transiting planet, linked to exactly one host star.
//! - [`Priority`]: the observing campaign tier attached to a planet.
//!
//! A [`Catalog`] owns the records. Planets reference their host through an internal numeric
//! id that never leaves this module: every public accessor speaks in natural keys (names).
//! The catalog is serialized as a flat document of stars and planets keyed by name.
//!
//! Planets are also indexed by their [`normalize_name`] key, so `"HD 1 b"` and `"HD-1b"`
//! resolve to the same record through [`Catalog::planet_like`].
//!
//! ## Store
//!
//! [`store`] wraps a committed catalog behind snapshot/transaction semantics
//! ([`EphemerisStore`]) and exposes record-level lookups and upserts through
//! [`EphemerisRepository`].
//!
//! ## See also
//! * [`Catalog::candidates`] – the planet ⨝ star join used by searches.
//! * [`CandidateFilter`] – static magnitude/depth/priority selection.

pub mod bimap;
pub mod store;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coercion::title_case;
use crate::constants::{Degree, Hour, Inch, MilliMag, JD};
use crate::exo_errors::ExoError;

use self::bimap::BiMap;

pub use self::store::{
    CatalogTransaction, EphemerisRepository, EphemerisStore, JsonFileStore, MemoryStore,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Concurrent commit detected: transaction started at version {expected}, store is at version {found}")]
    Conflict { expected: u64, found: u64 },

    #[error("Planet '{planet}' references unknown host star '{host}'")]
    MissingHost { planet: String, host: String },

    #[error("A {0} record must have a non-empty name")]
    EmptyName(&'static str),

    #[error("Unable to persist the catalog: {0}")]
    Persistence(String),

    #[error("Invalid catalog document: {0}")]
    Serialization(String),
}

/// Deduplication key of an object name: lowercase, without spaces or hyphens.
///
/// `"HD 1 b"`, `"HD-1b"` and `"hd1b"` all map to `"hd1b"`. The key is only used for
/// lookups; records keep the display name of the feed that wrote them.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Feed that last wrote a planet record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Provenance {
    /// Curated feed; never overwritten by archive rows.
    Primary,
    /// Archive feed, or a record of unknown origin.
    #[default]
    Secondary,
}

/// Observing campaign tier of a planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    Normal,
    Alert,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::Normal,
        Priority::Alert,
    ];

    /// Resolve a free-form label, case-insensitively (`"hIGH"` → `High`).
    pub fn from_label(label: &str) -> Option<Priority> {
        match title_case(label).as_str() {
            "High" => Some(Priority::High),
            "Medium" => Some(Priority::Medium),
            "Low" => Some(Priority::Low),
            "Normal" => Some(Priority::Normal),
            "Alert" => Some(Priority::Alert),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::Alert => "Alert",
        };
        f.write_str(label)
    }
}

impl FromStr for Priority {
    type Err = ExoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::from_label(s).ok_or_else(|| {
            ExoError::Config(format!(
                "unknown priority '{s}' (expected one of {})",
                Priority::ALL.iter().join(", ")
            ))
        })
    }
}

/// Host star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub name: String,
    /// J2000 right ascension, degrees in [0, 360).
    pub ra: Degree,
    /// J2000 declination, degrees in [−90, 90].
    pub dec: Degree,
    pub magnitude: Option<f64>,
    /// Kept when present; never written by the reconciler.
    #[serde(default)]
    pub effective_temperature: Option<f64>,
}

impl Star {
    pub fn new(name: impl Into<String>, ra: Degree, dec: Degree, magnitude: Option<f64>) -> Self {
        Star {
            name: name.into(),
            ra,
            dec,
            magnitude,
            effective_temperature: None,
        }
    }
}

/// Transiting planet and its linear ephemeris.
///
/// `host` is the name of the host star; the link is resolved to an internal id when the
/// planet is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub name: String,
    pub host: String,
    /// Orbital period in days.
    pub period: Option<f64>,
    /// Reference mid-transit time, BJD_TDB.
    pub epoch: Option<JD>,
    pub duration_hours: Hour,
    pub depth_mmag: MilliMag,
    /// 1σ period uncertainty in days.
    pub period_uncertainty: Option<f64>,
    /// 1σ epoch uncertainty in days.
    pub epoch_uncertainty: Option<f64>,
    pub min_aperture_in: Option<Inch>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub source: Provenance,
}

impl Planet {
    /// A planet with no ephemeris and zeroed display attributes.
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Planet {
            name: name.into(),
            host: host.into(),
            period: None,
            epoch: None,
            duration_hours: 0.0,
            depth_mmag: 0.0,
            period_uncertainty: None,
            epoch_uncertainty: None,
            min_aperture_in: None,
            priority: Priority::Normal,
            source: Provenance::default(),
        }
    }

    /// `(epoch, period)` when the planet carries a usable linear ephemeris
    /// (epoch defined and period strictly positive).
    pub fn ephemeris(&self) -> Option<(JD, f64)> {
        match (self.epoch, self.period) {
            (Some(epoch), Some(period)) if period > 0.0 => Some((epoch, period)),
            _ => None,
        }
    }
}

/// A planet joined with its host star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    pub planet: &'a Planet,
    pub star: &'a Star,
}

/// Static pre-selection of candidates, applied before any transit is computed.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFilter {
    /// Faintest accepted host magnitude; hosts without magnitude are rejected.
    pub max_magnitude: f64,
    pub min_depth_mmag: MilliMag,
    /// Accepted priorities; an empty set accepts every priority.
    pub priorities: Vec<Priority>,
}

impl CandidateFilter {
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        let bright_enough = candidate
            .star
            .magnitude
            .is_some_and(|mag| mag <= self.max_magnitude);
        let deep_enough = candidate.planet.depth_mmag >= self.min_depth_mmag;
        let wanted = self.priorities.is_empty()
            || self.priorities.contains(&candidate.planet.priority);
        bright_enough && deep_enough && wanted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct StarId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct PlanetId(u32);

/// Owned set of stars and planets, addressed by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "CatalogDocument", into = "CatalogDocument")]
pub struct Catalog {
    stars: HashMap<StarId, Star>,
    planets: HashMap<PlanetId, Planet>,
    hosts: HashMap<PlanetId, StarId>,
    star_ids: BiMap<String, StarId>,
    planet_ids: BiMap<String, PlanetId>,
    /// Normalized planet name → id.
    planet_keys: BiMap<String, PlanetId>,
    next_id: u32,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn star(&self, name: &str) -> Option<&Star> {
        self.star_ids
            .get_by_key(name)
            .and_then(|id| self.stars.get(id))
    }

    pub fn planet(&self, name: &str) -> Option<&Planet> {
        self.planet_ids
            .get_by_key(name)
            .and_then(|id| self.planets.get(id))
    }

    /// Planet whose name normalizes like `name`, whatever its stored spelling.
    pub fn planet_like(&self, name: &str) -> Option<&Planet> {
        self.planet_keys
            .get_by_key(normalize_name(name).as_str())
            .and_then(|id| self.planets.get(id))
    }

    pub fn star_count(&self) -> usize {
        self.star_ids.len()
    }

    pub fn planet_count(&self) -> usize {
        self.planet_ids.len()
    }

    /// Stars sorted by name.
    pub fn stars(&self) -> Vec<&Star> {
        self.stars
            .values()
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect()
    }

    /// Planets sorted by name.
    pub fn planets(&self) -> Vec<&Planet> {
        self.planets
            .values()
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect()
    }

    /// Planets orbiting `host`, sorted by name.
    pub fn planets_of(&self, host: &str) -> Vec<&Planet> {
        let Some(star_id) = self.star_ids.get_by_key(host) else {
            return Vec::new();
        };
        self.hosts
            .iter()
            .filter(|(_, s)| *s == star_id)
            .filter_map(|(p, _)| self.planets.get(p))
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect()
    }

    /// Every planet joined with its host star, sorted by planet name.
    pub fn candidates(&self) -> Vec<Candidate<'_>> {
        self.planets
            .iter()
            .filter_map(|(planet_id, planet)| {
                let star = self.hosts.get(planet_id).and_then(|s| self.stars.get(s))?;
                Some(Candidate { planet, star })
            })
            .sorted_by(|a, b| a.planet.name.cmp(&b.planet.name))
            .collect()
    }

    /// Candidates accepted by `filter`, sorted by planet name.
    pub fn filter_candidates(&self, filter: &CandidateFilter) -> Vec<Candidate<'_>> {
        self.candidates()
            .into_iter()
            .filter(|c| filter.accepts(c))
            .collect()
    }

    /// Insert or replace the star with the same name.
    pub fn upsert_star(&mut self, star: Star) -> Result<(), StoreError> {
        if star.name.trim().is_empty() {
            return Err(StoreError::EmptyName("star"));
        }
        let next_id = &mut self.next_id;
        let id = self.star_ids.get_or_insert_with(star.name.clone(), || {
            *next_id += 1;
            StarId(*next_id)
        });
        self.stars.insert(id, star);
        Ok(())
    }

    /// Insert or replace the planet with the same name, linking it to its host.
    ///
    /// Errors
    /// ------
    /// * [`StoreError::EmptyName`] for a blank planet name.
    /// * [`StoreError::MissingHost`] when `planet.host` is not a stored star.
    pub fn upsert_planet(&mut self, planet: Planet) -> Result<(), StoreError> {
        if planet.name.trim().is_empty() {
            return Err(StoreError::EmptyName("planet"));
        }
        let host_id = *self
            .star_ids
            .get_by_key(planet.host.as_str())
            .ok_or_else(|| StoreError::MissingHost {
                planet: planet.name.clone(),
                host: planet.host.clone(),
            })?;
        let next_id = &mut self.next_id;
        let id = self.planet_ids.get_or_insert_with(planet.name.clone(), || {
            *next_id += 1;
            PlanetId(*next_id)
        });
        self.planet_keys.insert(normalize_name(&planet.name), id);
        self.hosts.insert(id, host_id);
        self.planets.insert(id, planet);
        Ok(())
    }

    /// Remove the planet named exactly `name`; its host star stays.
    pub fn remove_planet(&mut self, name: &str) -> Option<Planet> {
        let id = self.planet_ids.remove_by_key(name)?;
        self.planet_keys.remove_by_value(&id);
        self.hosts.remove(&id);
        self.planets.remove(&id)
    }
}

impl PartialEq for Catalog {
    fn eq(&self, other: &Self) -> bool {
        self.stars() == other.stars() && self.planets() == other.planets()
    }
}

/// On-disk shape of a catalog: natural keys only.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    stars: Vec<Star>,
    #[serde(default)]
    planets: Vec<Planet>,
}

impl From<Catalog> for CatalogDocument {
    fn from(catalog: Catalog) -> Self {
        CatalogDocument {
            stars: catalog.stars().into_iter().cloned().collect(),
            planets: catalog.planets().into_iter().cloned().collect(),
        }
    }
}

impl TryFrom<CatalogDocument> for Catalog {
    type Error = StoreError;

    fn try_from(doc: CatalogDocument) -> Result<Self, Self::Error> {
        let mut catalog = Catalog::new();
        for star in doc.stars {
            catalog.upsert_star(star)?;
        }
        for planet in doc.planets {
            catalog.upsert_planet(planet)?;
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod catalog_test {
    use super::*;

    fn sample() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .upsert_star(Star::new("WASP-12", 97.6366, 29.6723, Some(11.6)))
            .unwrap();
        catalog
            .upsert_star(Star::new("TOI-1000", 10.0, -5.0, None))
            .unwrap();
        let mut b = Planet::new("WASP-12b", "WASP-12");
        b.period = Some(1.0914);
        b.epoch = Some(2457010.512);
        b.depth_mmag = 15.0;
        b.priority = Priority::High;
        catalog.upsert_planet(b).unwrap();
        let mut c = Planet::new("TOI-1000b", "TOI-1000");
        c.depth_mmag = 20.0;
        catalog.upsert_planet(c).unwrap();
        catalog
    }

    #[test]
    fn test_priority_labels() {
        assert_eq!(Priority::from_label("hIGH"), Some(Priority::High));
        assert_eq!(" alert ".parse::<Priority>().unwrap(), Priority::Alert);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::default(), Priority::Normal);
        assert_eq!(Priority::Medium.to_string(), "Medium");
    }

    #[test]
    fn test_upsert_overwrites_by_name() {
        let mut catalog = sample();
        catalog
            .upsert_star(Star::new("WASP-12", 1.0, 2.0, Some(12.0)))
            .unwrap();
        assert_eq!(catalog.star_count(), 2);
        assert_eq!(catalog.star("WASP-12").unwrap().ra, 1.0);
        assert!(catalog.star("wasp-12").is_none());
    }

    #[test]
    fn test_upsert_planet_requires_host() {
        let mut catalog = sample();
        assert_eq!(
            catalog.upsert_planet(Planet::new("KELT-9b", "KELT-9")),
            Err(StoreError::MissingHost {
                planet: "KELT-9b".into(),
                host: "KELT-9".into()
            })
        );
        assert_eq!(
            catalog.upsert_star(Star::new("  ", 0.0, 0.0, None)),
            Err(StoreError::EmptyName("star"))
        );
    }

    #[test]
    fn test_candidates_join_and_filter() {
        let catalog = sample();
        let names: Vec<_> = catalog
            .candidates()
            .iter()
            .map(|c| (c.planet.name.clone(), c.star.name.clone()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("TOI-1000b".to_string(), "TOI-1000".to_string()),
                ("WASP-12b".to_string(), "WASP-12".to_string())
            ]
        );

        let filter = CandidateFilter {
            max_magnitude: 14.0,
            min_depth_mmag: 5.0,
            priorities: vec![],
        };
        // TOI-1000 has no magnitude
        let kept = catalog.filter_candidates(&filter);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].planet.name, "WASP-12b");

        let filter = CandidateFilter {
            priorities: vec![Priority::Alert],
            ..filter
        };
        assert!(catalog.filter_candidates(&filter).is_empty());
        assert_eq!(catalog.planets_of("WASP-12").len(), 1);
    }

    #[test]
    fn test_normalized_lookup_and_removal() {
        let mut catalog = sample();
        assert_eq!(normalize_name("WASP-12 b"), "wasp12b");
        assert_eq!(catalog.planet_like("wasp 12b").unwrap().name, "WASP-12b");
        assert!(catalog.planet("wasp 12b").is_none());

        let removed = catalog.remove_planet("WASP-12b").unwrap();
        assert_eq!(removed.priority, Priority::High);
        assert!(catalog.planet_like("WASP-12 b").is_none());
        assert_eq!(catalog.planet_count(), 1);
        assert_eq!(catalog.star_count(), 2);
        assert!(catalog.planets_of("WASP-12").is_empty());
        assert_eq!(catalog.remove_planet("WASP-12b"), None);

        // the index is rebuilt from the flat document
        let json = serde_json::to_string(&sample()).unwrap();
        let back: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back.planet_like("toi 1000 b").unwrap().name, "TOI-1000b");
        assert_eq!(back.planet("TOI-1000b").unwrap().source, Provenance::Secondary);
    }

    #[test]
    fn test_ephemeris_requires_positive_period() {
        let mut planet = Planet::new("x", "y");
        assert_eq!(planet.ephemeris(), None);
        planet.epoch = Some(2459000.0);
        planet.period = Some(0.0);
        assert_eq!(planet.ephemeris(), None);
        planet.period = Some(3.0);
        assert_eq!(planet.ephemeris(), Some((2459000.0, 3.0)));
    }

    #[test]
    fn test_json_document_uses_names_only() {
        let catalog = sample();
        let json = serde_json::to_string(&catalog).unwrap();
        assert!(json.contains("\"host\":\"WASP-12\""));
        assert!(!json.contains("next_id"));

        let back: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);

        let orphan = r#"{"stars": [], "planets": [{"name": "b", "host": "nowhere",
            "period": null, "epoch": null, "duration_hours": 0, "depth_mmag": 0,
            "period_uncertainty": null, "epoch_uncertainty": null, "min_aperture_in": null}]}"#;
        assert!(serde_json::from_str::<Catalog>(orphan).is_err());
    }
}
