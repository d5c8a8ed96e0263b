//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and operations
//! - Logging setup
//! - Phase timing

pub mod math;
pub mod logging;
pub mod time;
