//! # xwire Support
//!
//! Shared utilities for the xwire crates.
//!
//! This crate provides:
//! - Text rendering for error messages and resolution plans
//! - "Did you mean?" suggestions for unknown logical names

pub mod rendering;
