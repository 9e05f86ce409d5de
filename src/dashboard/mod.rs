// src/dashboard/mod.rs

// Aggregations behind the admin dashboard
pub mod dashboard_structs;
// Dashboard route handlers
pub mod dashboard_router;
