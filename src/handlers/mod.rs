// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod result;
pub mod streak;
pub mod topic;
