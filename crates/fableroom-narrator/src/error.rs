//! Error types for narration generators.

/// Why a narration request produced no usable text.
#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    /// The generator is misconfigured (missing key, bad base URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never got a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body was not the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// The service answered but the narration was blank.
    #[error("empty narration")]
    EmptyResponse,

    /// The room gave up waiting.
    #[error("narration timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The generator task died before answering.
    #[error("narration task aborted: {0}")]
    Aborted(String),
}
