//! # Route Modules
//!
//! Each module defines an Axum Router for one API surface area.

pub mod entitlements;
