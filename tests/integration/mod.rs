//! Integration tests for careminate
//!
//! Each test boots its own server on an ephemeral port inside the test
//! runtime and talks to it over real HTTP with reqwest.
//!
//! Run with: cargo test --test integration

mod helpers;

mod routing;
mod requests;
mod errors;
mod logging;
mod shutdown;
