//! Photo editing through Gemini's image-generation models
//!
//! Sends a photo and a text prompt to the `generateContent` endpoint and
//! returns the edited image, optionally with the model's commentary.

pub mod ai;
pub mod app;
pub mod error;
pub mod image;
pub mod models;
pub mod secrets;
pub mod session;

pub use error::{Error, Result};
