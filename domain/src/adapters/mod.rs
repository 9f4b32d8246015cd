//! Test-only adapters that live inside the domain crate for convenience.
//!
//! These are intended for unit testing, local demos and the CLI. Hosts with
//! real storage implement [`crate::Record`] on their own entities.

pub mod memory_record;
