#![warn(unused_crate_dependencies)]

pub mod background_worker;
pub mod cli;
pub mod commands;
pub mod tracing;
