pub mod alarms;
pub mod api;
pub mod app;
pub mod batch;
pub mod cli;
pub mod config;
pub mod output;
pub mod pagination;
pub mod render;
pub mod runner;

#[cfg(test)]
mod tests;
