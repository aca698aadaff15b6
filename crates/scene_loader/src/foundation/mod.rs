//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the loader:
//! - Math types and operations
//! - Keyed caches and in-flight load tracking
//! - Logging utilities

pub mod collections;
pub mod logging;
pub mod math;
