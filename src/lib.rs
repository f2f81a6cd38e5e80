// src/lib.rs

#[macro_use]
pub mod macros;

pub mod audit;
pub mod cli;
pub mod config;
pub mod core;
pub mod csv;
pub mod driver;
pub mod file;
pub mod progress;
pub mod resolver;
pub mod runner;
pub mod specs;
pub mod table;
