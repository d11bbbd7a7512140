pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod engine;
pub mod feeds;
pub mod journal;
pub mod metrics;
pub mod orchestrator;
pub mod settlement;
pub mod state;

pub mod error;
pub mod logger;
pub mod time;
