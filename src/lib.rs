//! Client core for production shift tracking.
//!
//! - [`duration`]: activity time from start/end clock times, midnight aware
//! - [`auth`]: decode-only JWT inspection, session storage, auth endpoints
//! - [`session`]: token lifecycle with serialized renewal and an expiry monitor

pub mod auth;
pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod expiry;
pub mod models;
pub mod session;
