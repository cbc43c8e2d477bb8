// src/lib.rs

//! Exam Crawler Library

pub mod cancel;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod testing;
