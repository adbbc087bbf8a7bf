//! Bike-sharing route builder server.
//!
//! Merges the station feeds of two bike-sharing providers into one
//! catalog, and lets a user build an ordered route of stations where
//! every hop can be cycled within a fixed time budget.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod feeds;
pub mod mapbox;
pub mod merge;
pub mod reach;
pub mod route;
pub mod web;
