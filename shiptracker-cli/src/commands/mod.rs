//! CLI subcommands.

pub mod common;
pub mod config;
pub mod init;
pub mod map;
pub mod providers;
pub mod render;
pub mod serve;
