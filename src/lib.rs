//! FoodScan Library
//!
//! Rule-based normalization and scoring of packaged-food records: serving
//! sizes, ingredient text, allergens, additives, sugar and processing grades.

pub mod analysis;
pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod reference;
pub mod tools;
