//! End-to-end tests: the engine driving the HTTP client against a mock
//! puzzle server.
//!
//! Test modules are declared in `suite/mod.rs`.

mod common;
mod suite;
