//! Typed error kinds for the orchestration engine and the model gateway (spec §7).

use thiserror::Error;

/// Errors raised by the task orchestration engine (components D–I).
#[derive(Debug, Error)]
pub enum TaskflowError {
    #[error("validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("dependency graph contains a cycle involving task '{task_id}'")]
    Cycle { task_id: String },

    #[error("CPM produced a negative total float for task '{task_id}' ({total_float}h); schedule is infeasible")]
    Scheduling {
        task_id: String,
        total_float: f64,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl TaskflowError {
    /// Short machine-readable code, stable across versions.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Cycle { .. } => "cycle_error",
            Self::Scheduling { .. } => "scheduling_error",
            Self::Gateway(inner) => inner.code(),
        }
    }

    /// The id (task id, model id, request id) this error correlates to, if any.
    pub fn correlating_id(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::Cycle { task_id } => Some(task_id),
            Self::Scheduling { task_id, .. } => Some(task_id),
            Self::Gateway(inner) => inner.correlating_id(),
        }
    }
}

/// Errors raised by the model gateway and its provider adapters (components A–C).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("model '{model_id}' not found or not enabled")]
    UnknownModel { model_id: String },

    #[error("authentication failed for provider '{provider}' (model '{model_id}'): {message}")]
    Auth {
        provider: String,
        model_id: String,
        message: String,
    },

    #[error("rate limited by provider '{provider}' (model '{model_id}')")]
    RateLimit { provider: String, model_id: String },

    #[error("network error calling provider '{provider}' (model '{model_id}'): {message}")]
    Network {
        provider: String,
        model_id: String,
        message: String,
    },

    #[error("provider '{provider}' (model '{model_id}') returned an error: {message}")]
    Provider {
        provider: String,
        model_id: String,
        message: String,
    },

    #[error("request to model '{model_id}' timed out after {elapsed_ms}ms")]
    Timeout { model_id: String, elapsed_ms: u64 },

    #[error("all {attempted} candidate model(s) failed for request '{request_id}'; last error: {last_error}")]
    Exhausted {
        request_id: String,
        attempted: usize,
        last_error: String,
    },

    #[error("failed to (de)serialize payload for model '{model_id}': {message}")]
    Codec { model_id: String, message: String },
}

impl GatewayError {
    /// Whether the gateway should retry this error within the same provider
    /// before cascading to the next candidate (spec §4.C, §7).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit { .. } | Self::Network { .. } | Self::Provider { .. } | Self::Timeout { .. }
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownModel { .. } => "unknown_model",
            Self::Auth { .. } => "auth_error",
            Self::RateLimit { .. } => "rate_limit_error",
            Self::Network { .. } => "network_error",
            Self::Provider { .. } => "provider_error",
            Self::Timeout { .. } => "timeout_error",
            Self::Exhausted { .. } => "exhausted_error",
            Self::Codec { .. } => "codec_error",
        }
    }

    pub fn correlating_id(&self) -> Option<&str> {
        match self {
            Self::UnknownModel { model_id } => Some(model_id),
            Self::Auth { model_id, .. } => Some(model_id),
            Self::RateLimit { model_id, .. } => Some(model_id),
            Self::Network { model_id, .. } => Some(model_id),
            Self::Provider { model_id, .. } => Some(model_id),
            Self::Timeout { model_id, .. } => Some(model_id),
            Self::Exhausted { request_id, .. } => Some(request_id),
            Self::Codec { model_id, .. } => Some(model_id),
        }
    }

    /// Classify a raw HTTP status code the way every adapter must (spec §4.A).
    pub fn from_status(provider: &str, model_id: &str, status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Auth {
                provider: provider.to_string(),
                model_id: model_id.to_string(),
                message: body,
            },
            429 => Self::RateLimit {
                provider: provider.to_string(),
                model_id: model_id.to_string(),
            },
            500..=599 => Self::Provider {
                provider: provider.to_string(),
                model_id: model_id.to_string(),
                message: body,
            },
            _ => Self::Provider {
                provider: provider.to_string(),
                model_id: model_id.to_string(),
                message: format!("unexpected status {status}: {body}"),
            },
        }
    }
}

pub type TaskflowResult<T> = Result<T, TaskflowError>;
pub type GatewayResult<T> = Result<T, GatewayError>;
