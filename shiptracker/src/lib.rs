//! Shiptracker - live vessel position maps for e-ink displays
//!
//! This library fetches a ship's latest AIS position, turns it into a
//! dithered black-and-white map from public slippy-map tile servers and lays
//! it out with the ship's details on an e-ink frame.
//!
//! # Pipeline
//!
//! - [`coord`]: Web Mercator projection
//! - [`cache`]: in-memory tile cache with lazy expiry
//! - [`provider`]: tile servers, HTTP fetching and ordered fallback
//! - [`map`]: compositing, dithering, marker and placeholder rendering
//! - [`vessel`]: VesselFinder API client
//! - [`display`]: full-screen layout
//!
//! Supporting modules: [`config`] (INI settings) and [`logging`].

pub mod cache;
pub mod config;
pub mod coord;
pub mod display;
pub mod logging;
pub mod map;
pub mod provider;
pub mod tile;
pub mod vessel;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
