//! Relay for a Skribbl.io drawing assistant
//!
//! Accepts a base64-encoded drawing over HTTP, asks Gemini for the ten most
//! likely words and returns them as JSON, keeping the API key server-side.

pub mod ai;
pub mod error;
pub mod models;
pub mod predictor;
pub mod prompts;
pub mod server;

pub use error::{Error, Result};
