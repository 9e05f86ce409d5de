// src/users/mod.rs

// Data structures for users, roles and JWT claims
pub mod users_structs;
// Route handlers for registration, login and profile
pub mod users_router;
// JWT extractor for protected routes
pub mod auth_middleware;
