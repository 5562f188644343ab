//! Error envelope for provider operations.
//!
//! Failures are classified in two layers. Inside an adapter, transport
//! failures are [`ApiError`] and translation failures are [`MapError`];
//! both converge into [`CallError`]. At the operation boundary,
//! [`enveloped`] wraps whatever failed into a single [`ProviderError`]
//! carrying the operation name, an optional context map, and the
//! underlying cause. `ProviderError` is constructed nowhere else and is
//! the only error type that crosses the crate boundary.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use thiserror::Error;
use tracing::warn;

/// A failure from the underlying HTTP client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connection, DNS, TLS, ...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The provider answered with a non-success status.
    #[error("provider returned status {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, for diagnostics.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A failure translating between a native shape and the canonical model.
#[derive(Debug, Error)]
pub enum MapError {
    /// A datetime string could not be parsed or resolved to an instant.
    #[error("invalid datetime `{value}`: {reason}")]
    InvalidDateTime {
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A zone identifier is not in the IANA database.
    #[error("unknown time zone `{0}`")]
    UnknownTimeZone(String),

    /// The native event's interval ends before it starts.
    #[error("event interval ends before it starts")]
    EndBeforeStart,

    /// The response lacked a field the mapping requires.
    #[error("response is missing required field `{0}`")]
    MissingField(&'static str),

    /// The response did not match the expected shape.
    #[error("unexpected response shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// A failure inside an adapter operation, before enveloping.
#[derive(Debug, Error)]
pub enum CallError {
    /// The HTTP client failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The mapper rejected the payload.
    #[error(transparent)]
    Map(#[from] MapError),
}

/// An error from a provider adapter operation.
///
/// Carries the name of the operation that failed, an optional context
/// map (calendar id, event id, ...), and the underlying cause. Created
/// exactly once per failure, at the adapter-operation boundary.
#[derive(Debug, Error)]
pub struct ProviderError {
    operation: &'static str,
    context: BTreeMap<String, String>,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl ProviderError {
    /// Wraps an underlying failure with the operation it occurred in.
    pub(crate) fn wrap<E>(operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            operation,
            context: BTreeMap::new(),
            source: Box::new(source),
        }
    }

    /// Adds a context entry.
    pub(crate) fn with_context(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Returns the name of the operation that failed.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Returns the context map.
    pub fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider operation `{}` failed", self.operation)?;
        if !self.context.is_empty() {
            write!(f, " (")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Runs an adapter operation under the uniform error envelope.
///
/// On success the inner result is returned unchanged. On failure the
/// operation name and raw error are logged, and the error is wrapped in
/// a [`ProviderError`] with the given context entries and re-raised.
/// Never retries, never suppresses.
pub(crate) async fn enveloped<T, E, F>(
    operation: &'static str,
    context: &[(&str, &str)],
    fut: F,
) -> ProviderResult<T>
where
    E: std::error::Error + Send + Sync + 'static,
    F: Future<Output = Result<T, E>>,
{
    match fut.await {
        Ok(value) => Ok(value),
        Err(source) => {
            warn!(operation, error = %source, "provider call failed");
            let mut wrapped = ProviderError::wrap(operation, source);
            for (key, value) in context {
                wrapped = wrapped.with_context(*key, *value);
            }
            Err(wrapped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn wrap_preserves_operation_and_source() {
        let err = ProviderError::wrap(
            "microsoft.calendars",
            ApiError::Status {
                status: 503,
                body: "unavailable".into(),
            },
        );

        assert_eq!(err.operation(), "microsoft.calendars");
        let source = err.source().expect("source preserved");
        assert!(source.to_string().contains("503"));
    }

    #[test]
    fn display_includes_context() {
        let err = ProviderError::wrap("google.delete_event", ApiError::Timeout)
            .with_context("calendar_id", "primary")
            .with_context("event_id", "evt-1");

        let rendered = err.to_string();
        assert!(rendered.contains("google.delete_event"));
        assert!(rendered.contains("calendar_id=primary"));
        assert!(rendered.contains("event_id=evt-1"));
    }

    #[tokio::test]
    async fn enveloped_passes_success_through() {
        let result: ProviderResult<u32> =
            enveloped("op", &[], async { Ok::<_, ApiError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn enveloped_wraps_failure_once() {
        let result: ProviderResult<u32> = enveloped(
            "microsoft.events",
            &[("calendar_id", "cal-9")],
            async { Err::<u32, _>(ApiError::Timeout) },
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.operation(), "microsoft.events");
        assert_eq!(err.context().get("calendar_id").unwrap(), "cal-9");
        assert!(err.source().unwrap().to_string().contains("timed out"));
    }

    #[test]
    fn call_error_converts_from_both_layers() {
        let from_api: CallError = ApiError::Timeout.into();
        assert!(matches!(from_api, CallError::Api(_)));

        let from_map: CallError = MapError::MissingField("start").into();
        assert!(matches!(from_map, CallError::Map(_)));
    }
}
