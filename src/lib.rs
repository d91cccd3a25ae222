// src/lib.rs

//! pagewatch library
//!
//! Periodically fetches web pages, reduces a selected part of each page to a
//! comparable snapshot and flags pages whose snapshot changed.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
