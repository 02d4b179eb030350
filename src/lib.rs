pub mod config;
pub mod error;
pub mod gemini;
pub mod prompts;
pub mod routes;
pub mod session;
pub mod upload;
