//! Shared components used across features

pub mod models;
