//! API Module
//!
//! HTTP handlers and routing for the cache server REST API. This layer only
//! translates requests into cache engine calls and serializes the results.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `GET /exists/:key` - Check whether a key is live
//! - `GET /meta/:key` - Entry metadata
//! - `POST /clear` - Drop every entry
//! - `POST /cleanup` - Remove expired entries now
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
