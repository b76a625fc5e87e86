//! Wire contracts for the serving endpoints.

pub mod types;

pub use types::{
    ChatMessage, ChatRequest, ChatResponse, ErrorBody, InferenceRequest, InferenceResponse,
};
