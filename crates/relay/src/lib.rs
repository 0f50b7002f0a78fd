//! Kiwi Relay library.
//!
//! This crate provides the relay functionality as a library, allowing
//! routes and reconciliation to be tested without a running server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod reconcile;
pub mod routes;
pub mod state;
