#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

// Shared navigation and mission logic for the arena robot.
//
// This crate stays portable across MCU firmware and host tooling by avoiding
// the Rust standard library; hosts implement the actuation contract in
// `mission` and reuse everything else as-is.

pub mod arena;
pub mod geometry;
pub mod mission;
pub mod phases;
pub mod repl;
pub mod telemetry;
