//! API Module
//!
//! HTTP handlers and routing for the cache service.
//!
//! # Endpoints
//! - `PUT /set` - Store a value in a group
//! - `GET /get/:group/:key` - Retrieve a value
//! - `DELETE /del/:group/:key` - Delete a value
//! - `POST /clear` - Clear a group or the whole cache
//! - `GET /stats` - Cache metrics
//! - `GET /health` - Self-check report

pub mod extract;
pub mod handlers;
pub mod routes;

pub use extract::ApiJson;
pub use handlers::*;
pub use routes::create_router;
