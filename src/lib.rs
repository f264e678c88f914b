// Library entry point for wantlist
// Exposes modules for testing

pub mod api;
pub mod auth;
pub mod config;
pub mod images;
pub mod models;
pub mod store;
