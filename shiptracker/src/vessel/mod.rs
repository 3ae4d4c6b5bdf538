//! Vessel position source.
//!
//! Fetches the tracked ship's latest AIS report from the VesselFinder API
//! and keeps the last good report for a short while so repeated renders do
//! not spend API credits.

mod client;
mod types;

pub use client::{VesselClient, DEFAULT_CACHE_TIMEOUT, DEFAULT_ENDPOINT, VESSEL_API_TIMEOUT};
pub use types::{VesselData, VesselError};
