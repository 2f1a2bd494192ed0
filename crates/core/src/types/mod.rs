//! Core types for Bramble.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod metadata;
pub mod money;

pub use email::{Email, EmailError};
pub use id::*;
pub use metadata::{Metadata, MetadataItem};
pub use money::{Money, TaxedMoney};
