//! Integration test suite for pert.
//!
//! These tests drive the dependency store and the diagram pipeline
//! together against an in-memory project API, and the HTTP client against
//! a local mock server.
//!
//! # Test Categories
//!
//! - `dependency_store`: edge editing, cycle rejection, candidate lists
//! - `diagram_pipeline`: leveling, layout, critical styling, viewport
//! - `http_client`: REST endpoints, bearer auth, error mapping
//!
//! # CI Compatibility
//!
//! No test reaches a real server.

mod fixtures;

mod dependency_store;
mod diagram_pipeline;
mod http_client;
