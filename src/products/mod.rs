// src/products/mod.rs

// Catalog data structures and form validation
pub mod products_structs;
// Product and variant route handlers
pub mod products_router;
