//! Core types and trait definitions for the ridewatch intelligence backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Every other crate depends on it: the domain records, the [`IntelStore`]
//! abstraction, the loose-value field parsers and the task-name routing rules
//! all live here.
//!
//! [`IntelStore`]: store::IntelStore

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod model;
pub mod parse;
pub mod store;
pub mod task;

pub use error::{Error, Result};
