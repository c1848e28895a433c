//! Common module - shared traits and interfaces
//!
//! This module contains the traits the sync engine, token manager and
//! registry client meet at.

pub mod traits;

pub use traits::*;
