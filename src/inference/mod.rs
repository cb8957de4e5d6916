mod client;
mod error;
mod wire;

pub use client::{ImageData, InferenceClient};
pub use error::InferenceError;
pub use wire::{ChatRequest, ChatResponse, ContentPart, ImageUrl, Message, MessageContent};
