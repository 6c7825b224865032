// src/models/mod.rs

pub mod application;
pub mod level;
pub mod quiz;
pub mod quiz_result;
pub mod user;
