//! # ts3bridge-stress
//!
//! Concurrency property harness for the TeamSpeak 3 synchronous bridge.
//!
//! This crate drives the bridge against the simulated client library under
//! repeated, randomized load:
//! - Token allocation and correlation under many concurrent callers
//! - Delivery and wakeup of blocked callers, including lost events
//! - Connect/disconnect exclusivity and status-mismatch correction
//! - Host init/teardown cycles with callers still blocked

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assertions;
pub mod harness;

pub mod scenarios;
