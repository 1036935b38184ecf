//! Medidor Core - shared primitives for the measurement engine
//!
//! This crate provides the two things every other medidor crate agrees on:
//!
//! - [`Effect`] - the seam between the measurement engine and the audio
//!   processing unit under test
//! - Level conversion math ([`db_to_linear`], [`linear_to_db`],
//!   [`linear_to_db_floor`]) with the floor/coercion semantics the
//!   analysis path relies on
//!
//! # Design Principles
//!
//! - **Real-time safe**: no allocations, no locks, no I/O in anything
//!   callable from an audio callback
//! - **No dependencies on std**: pure `no_std` with `libm` for math
//!   (enable the default `std` feature for std builds)
//! - **Object-safe trait**: the unit under test is held as
//!   `Box<dyn Effect + Send>` by the engine

#![cfg_attr(not(feature = "std"), no_std)]

pub mod effect;
pub mod math;

pub use effect::Effect;
pub use math::{db_to_linear, linear_to_db, linear_to_db_floor};
