//! # Farm Monitoring Backend
//!
//! Rust backend for a crop yield and soil monitoring system.
//!
//! This crate provides CRUD operations over the farm-monitoring relational
//! schema (crops, yields, soil readings, input usage, input costs, weather
//! data), aggregate reports on top of those tables, a rule-based farm-health
//! advisory engine, external weather ingestion, and a full-table CSV export.
//! The backend exposes a REST API via Axum.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Domain entities and typed report results
//! - [`db`]: Database operations, repository pattern, and persistence layer
//! - [`services`]: Advisory engine, CSV export, and weather ingestion
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
