//! Assembla export tooling: reconcile user references across the exported
//! CSV tables and rank users by activity ahead of a Jira import.

pub mod build_info;
pub mod commands;
pub mod config;
pub mod error;
pub mod indexer;
pub mod lock;
pub mod model;
pub mod output;
pub mod registry;
pub mod report;
pub mod tabular;
