// src/models/mod.rs

pub mod category;
pub mod question;
pub mod streak;
pub mod test_result;
pub mod topic;
pub mod user;
