//! services/api/src/lib.rs
//!
//! Library root of the `api` service: configuration, adapters, the document
//! extraction pipeline, the unified generation service and the REST layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod extraction;
pub mod generation;
pub mod study_plan;
pub mod web;
