// src/models/mod.rs
pub mod admin;
pub mod auth;
pub mod generation;
pub mod history;
pub mod profile;
