//! User registry library
//!
//! This library exposes the core functionality of the user registry server
//! for the binary and for integration testing.

pub mod api;
pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
pub mod validation;
