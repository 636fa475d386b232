pub mod bodies;
pub mod catalog;
pub mod coercion;
pub mod config;
pub mod constants;
pub mod conversion;
pub mod earth_orientation;
pub mod exo_errors;
pub mod feeds;
pub mod light_curve;
pub mod observers;
pub mod reconcile;
pub mod ref_system;
pub mod sky;
pub mod time;
pub mod transit;
