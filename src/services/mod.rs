// src/services/mod.rs
pub mod accounts;
pub mod credits;
