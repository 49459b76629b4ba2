pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod output;
pub mod subscriber;
pub mod utils;

#[cfg(test)]
mod tests;
