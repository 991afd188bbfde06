pub mod api;
pub mod cursor;
pub mod memory;
