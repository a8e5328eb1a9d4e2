//! Tripsearch - Multi-provider travel search and comparison engine
//!
//! Queries flight, hotel, car and experience inventory through a provider
//! manager, merges equivalent offers across providers, ranks them with a
//! multi-factor model, and keeps every search as a token-addressable session
//! that can be filtered, sorted and paged afterwards.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod providers;
pub mod query;
pub mod results;
pub mod session;
pub mod storage;

pub use engine::SearchEngine;
pub use error::{Result, TripError};
