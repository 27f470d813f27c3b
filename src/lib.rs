pub mod classification;
pub mod config;
pub mod entities;
pub mod fetcher;
pub mod jobs;
pub mod repositories;
pub mod telemetry;
