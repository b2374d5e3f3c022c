pub mod client;
pub mod predict;
pub mod types;

pub use client::GeminiHttpClient;
pub use predict::GeminiPredictionClient;
