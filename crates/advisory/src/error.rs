/// Failures of the external text service.
///
/// None of these reach clinical data flows: [`Advisor`](crate::Advisor) maps every one of
/// them to a fixed fallback sentence.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("cannot reach language model service at {0}")]
    Connection(String),
    #[error("language model request timed out after {0}s")]
    Timeout(u64),
    #[error("language model service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected language model response: {0}")]
    ResponseParsing(String),
    #[error("language model returned an empty response")]
    EmptyResponse,
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("invalid advisory configuration: {0}")]
    InvalidConfig(String),
}
