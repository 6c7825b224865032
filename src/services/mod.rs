// src/services/mod.rs

pub mod ai;
pub mod cleanup;
pub mod prompts;
pub mod quiz_cache;
