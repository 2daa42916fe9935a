pub mod config;
pub mod median;
