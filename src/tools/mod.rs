//! FoodScan Tools module
//!
//! MCP tool implementations for the FoodScan service.

pub mod analysis;
pub mod status;
