// Common library for the birthday reminder bot: store, gate, commands and reminders

pub mod commands;
pub mod config;
pub mod db;
pub mod delivery;
pub mod errors;
pub mod gate;
pub mod models;
pub mod reminder;
pub mod schedule;
pub mod scheduler;
pub mod store;
pub mod telemetry;
