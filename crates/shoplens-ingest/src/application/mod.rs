//! Application layer for ingestion.

pub mod command_handlers;
