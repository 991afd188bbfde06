pub mod direction;
pub mod locator;
pub mod segmenter;
