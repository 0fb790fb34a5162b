//! Storage module
//!
//! Content-addressed storage for card photos.

pub mod image_store;

pub use image_store::{CardImage, ImageStore};
