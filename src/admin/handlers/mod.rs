// src/admin/handlers/mod.rs

pub mod auth;
pub mod sellers;
