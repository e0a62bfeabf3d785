//! Souq marketplace API library.
//!
//! This crate provides the REST service as a library, allowing it to be
//! driven in-process by the integration tests and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
