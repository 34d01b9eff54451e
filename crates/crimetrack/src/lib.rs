//! Core library for the CrimeTrack citizen crime-reporting service.
//!
//! The interesting parts live under [`reports`]: per-submitter admission
//! control (daily cap plus cooldown window) and the report lifecycle state
//! machine with its one-notification-per-transition contract. Geocoding, OTP
//! issuance, and map rendering are upstream/downstream collaborators and are
//! not modeled here.

pub mod config;
pub mod error;
pub mod reports;
pub mod telemetry;
