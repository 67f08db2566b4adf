//! Request and Response models for the cache service API
//!
//! This module defines the DTOs used for serializing/deserializing HTTP
//! request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ClearRequest, SetRequest};
pub use responses::{
    ApiResponse, ClearData, DeleteData, GetData, ResponseMeta, SetData, StatsData,
};
