//! Core types and trait definitions for the Satchel pupil-needs register.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod category;
pub mod device;
pub mod error;
pub mod form;
pub mod need;
pub mod overrides;
pub mod profile;
pub mod pupil;
pub mod resolve;
pub mod store;

pub use error::{Error, Result};
