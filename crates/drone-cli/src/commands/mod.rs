//! CLI command implementations.

pub mod algorithms;
pub mod common;
pub mod config;
pub mod inspect;
pub mod run;
