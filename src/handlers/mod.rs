// src/handlers/mod.rs
pub mod admin;
pub mod auth;
pub mod error;
pub mod generation;
pub mod history;
pub mod status;
