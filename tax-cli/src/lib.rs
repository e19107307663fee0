//! Command-line front end for the tax engine: argument parsing, TOML
//! configuration, logging setup and rendering.

pub mod amount;
pub mod app;
pub mod batch;
pub mod cli;
pub mod config;
pub mod logging;
pub mod render;
