//! Registry module for Docker registry interactions
//!
//! This module provides token issuance, token lifetime management and the
//! read-only Docker Registry HTTP API v2 client used by the sync engine.

pub mod auth;
pub mod client;
pub mod token_manager;

pub use auth::{Auth, Token};
pub use client::{RegistryClient, RegistryClientBuilder};
pub use token_manager::TokenManager;
