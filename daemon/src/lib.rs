// Zena Daemon Library
// Node side of the admission pipeline: stores, keepers and the ante handler

#![allow(clippy::type_complexity)]
#![allow(clippy::uninlined_format_args)]

extern crate log;

pub mod config;
pub mod core;
