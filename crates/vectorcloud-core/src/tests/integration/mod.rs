#![cfg(test)]

pub mod common;
pub mod config_tests;
pub mod lifecycle_tests;
pub mod repository_tests;
pub mod runner_tests;
