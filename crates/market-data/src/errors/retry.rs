/// Classification for retry policy.
///
/// Used by the retry loop and the endpoint chain to decide what to do after
/// a failed request.
///
/// # Behavior Summary
///
/// | Class | Retry same endpoint? | Try next endpoint? |
/// |-------|---------------------|--------------------|
/// | `WithBackoff` | Yes, after `2^attempt * base_delay` | No, once attempts are exhausted |
/// | `NextEndpoint` | No | Yes |
/// | `Never` | No | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Terminal failure. The request is invalid and retrying won't help.
    Never,

    /// Transient failure (HTTP 429, timeout). Wait and retry the same request.
    ///
    /// When the attempt budget is exhausted the error propagates; other
    /// endpoint variants of the same provider are not tried because they
    /// share the same rate limit.
    WithBackoff,

    /// This endpoint variant could not serve the request (non-2xx, error
    /// envelope, empty or malformed payload). Try the next variant.
    NextEndpoint,
}

/// Coarse failure category, used to label stale fallbacks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// Connection failure or timeout.
    Network,
    /// The provider answered, but with an error status or error envelope.
    Api,
    /// The provider answered with something we could not use.
    InvalidData,
}
