//! recipeforge: a single-page recipe generator backed by a hosted
//! chat-completion API.
//!
//! Four generation actions (dish photo, ingredients photo, ingredient list,
//! dish name) are each one prompt-template interpolation followed by one HTTP
//! POST against the configured inference endpoint. The most recent result is
//! held in a single session slot and can be exported as a line-per-row PDF.

pub mod config;
pub mod export;
pub mod inference;
pub mod prompts;
pub mod server;
pub mod session;
