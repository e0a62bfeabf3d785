//! Souq Core - Marketplace domain types and rules.
//!
//! This crate provides the types shared by every Souq component:
//! - `api` - The marketplace REST service
//! - `cli` - Command-line tools for migrations, seeding and cleanup
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Checkout arithmetic and coupon rules live here so
//! they can be unit tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, prices, ratings and statuses
//! - [`pricing`] - Coupon evaluation and order totals
//! - [`catalog`] - Product listing sort orders
//! - [`password_reset`] - Reset code verification rules
//! - [`payment`] - Fixed-price payment packages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod password_reset;
pub mod payment;
pub mod pricing;
pub mod types;

pub use types::*;
