// src/sales/mod.rs

// Sale, sale item and cart structures
pub mod sales_structs;
// Sale recording and stock adjustment
pub mod sale_recorder;
// Sale route handlers
pub mod sales_router;
