// src/admin/mod.rs

pub mod directory;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::admin_routes;
