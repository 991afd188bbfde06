pub mod markers;
pub mod params;
pub mod transition;
