// Wire types shared by the relay routes and the chat client

use serde::{Deserialize, Serialize};

/// Lowest budget the relay will ever forward downstream.
pub const MAX_NEW_TOKENS_FLOOR: u32 = 16;

/// Substituted when the caller sends no budget, or a non-finite one.
pub const MAX_NEW_TOKENS_DEFAULT: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Body of `POST /api/chat`. The provider selector travels in the `x-llm`
/// header, not here.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Accepted as any JSON number; clamped server-side before use.
    #[serde(default)]
    pub max_new_tokens: Option<f64>,
}

/// What `POST /api/chat` answers: exactly one of the two variants.
/// Callers must match on the variant before touching `text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayReply {
    Success { provider: String, text: String },
    Failure { error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Finetuned,
    Openai,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Finetuned => "finetuned",
            ProviderKind::Openai => "openai",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "finetuned" => Some(ProviderKind::Finetuned),
            "openai" => Some(ProviderKind::Openai),
            _ => None,
        }
    }

    /// Resolve the `x-llm` header against the configured default. A missing
    /// or unrecognized header falls back to the default.
    pub fn resolve(header: Option<&str>, default: ProviderKind) -> Self {
        header.and_then(Self::parse).unwrap_or(default)
    }
}

/// Clamp a caller-requested output budget into the server-enforced range.
///
/// Absent or non-finite values substitute the fixed default, then the value
/// is floored and forced into `[MAX_NEW_TOKENS_FLOOR, ceiling]`. This is the
/// only budget ever forwarded to a provider.
pub fn clamp_max_new_tokens(requested: Option<f64>, ceiling: u32) -> u32 {
    let raw = match requested {
        Some(v) if v.is_finite() => v.floor(),
        _ => f64::from(MAX_NEW_TOKENS_DEFAULT),
    };
    let floored = raw.max(f64::from(MAX_NEW_TOKENS_FLOOR));
    floored.min(f64::from(ceiling)) as u32
}
