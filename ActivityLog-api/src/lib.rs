// ActivityLog-api lib.rs
//
// Main library file for the ActivityLog API.
// Exposes the router, the public entities and the OpenAPI document.

// Public modules
pub mod api;
pub mod entities;
pub mod openapi;
