//! huddle presence-and-messaging hub library.
//! This crate exposes internal modules for integration testing.
//! The binary entry point is in main.rs.

pub mod chat;
pub mod config;
pub mod error;
pub mod events;
pub mod presence;
pub mod routes;
pub mod state;
pub mod ws;
