//! HTTP handlers

pub mod health;
pub mod retrieve;
pub mod view;
