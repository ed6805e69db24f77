//! Common library for the auctions, encyclopedia and network services
//!
//! This crate provides shared functionality used across the services:
//! database connectivity, error handling, settings, tracing setup, JWT
//! authentication, user accounts, pagination and input validation.

pub mod accounts;
pub mod auth;
pub mod database;
pub mod error;
pub mod http;
pub mod pagination;
pub mod settings;
pub mod telemetry;
pub mod validation;
