//! Integration tests for Card-Localizer
//!
//! These tests use wiremock to create mock HTTP servers and exercise complete
//! localization runs against real PNG containers.

mod common;
mod container_tests;
mod localize_tests;
