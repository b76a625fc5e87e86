//! Request and response bodies, camelCase on the wire.

use serde::{Deserialize, Serialize};

/// Body of `POST /inference`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceRequest {
    /// Caller-supplied, opaque; echoed back and bound into the digest.
    pub inference_id: i64,
    pub model_id: i64,
    pub ipfs_hash: String,
    pub input_data: String,
}

/// Successful `POST /inference` reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceResponse {
    pub success: bool,
    pub inference_id: i64,
    pub output: String,
    pub verification_hash: String,
    pub timestamp: String,
}

/// One prior turn in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `"user"` renders as the user line; anything else as the AI line.
    pub sender: String,
    pub content: String,
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub ipfs_hash: String,
    pub message: String,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

/// Successful `POST /chat` reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub timestamp: String,
}

/// Error body for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
