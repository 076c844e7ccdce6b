//! Unit tests for payload assembly, routing, and correlation.
//!
//! Tests are split into focused submodules to keep each file short and easy
//! to navigate.

mod control_tests;
