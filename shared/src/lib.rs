//! Shared types for the Storefront Platform
//!
//! Domain enums, request/response DTOs and platform constants used by the
//! backend crate. Everything here is serialization-friendly and free of
//! server-side dependencies beyond the database type derives.

pub mod constants;
pub mod dto;
pub mod types;

pub use constants::*;
pub use dto::*;
pub use types::*;
