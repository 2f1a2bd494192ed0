//! Bramble Core - Shared types library.
//!
//! This crate provides common types used across all Bramble components:
//! - `checkout` - Server-rendered checkout flow over the commerce API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and
//!   entity metadata

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
