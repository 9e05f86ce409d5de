// src/shared/mod.rs

// Response envelope shared by every router
pub mod shared_structs;
