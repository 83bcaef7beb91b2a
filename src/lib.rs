//! Data gathering and package validation for the `reflect` skill.
//!
//! The skill itself is markdown an agent follows; this crate provides the
//! commands it calls to see what happened in a session (git, issue tracker),
//! what earlier reflections found, and which permissions are already granted.

pub mod app;
pub mod check;
pub mod cli;
pub mod config;
pub mod gather;
pub mod history;
pub mod manifest;
pub mod permissions;
pub mod report;
pub mod runner;
pub mod session;
pub mod skillpacks;
