//! Return types crossing the Checker/Executor <-> Scheduler boundary.

use serde_json::Value as Json;

/// What a Checker returns after inspecting a workflow's Action.
///
/// `fired=false` means "nothing to do this tick" — the Scheduler appends no
/// log row. `fired=true` with `error` set represents a Checker that could not
/// complete its probe (e.g. provider outage); the Scheduler still logs this
/// as `status=failed` carrying `error` as the message, per §4.2's error
/// handling ("HTTP-layer errors ... never raised upward").
#[derive(Debug, Clone, Default)]
pub struct TriggerOutcome {
    pub fired: bool,
    /// The fingerprint string to record as `WorkflowLog.message` on success.
    pub metadata: Option<String>,
    /// Provider-specific payload the Executor or caller may want (unused by
    /// the Scheduler itself, but returned for completeness of the contract).
    pub data: Option<Json>,
    pub error: Option<String>,
}

impl TriggerOutcome {
    pub fn not_fired() -> Self {
        Self::default()
    }

    pub fn fired(metadata: impl Into<String>) -> Self {
        Self {
            fired: true,
            metadata: Some(metadata.into()),
            data: None,
            error: None,
        }
    }

    /// A fired outcome with no fingerprint, for Action kinds that have no
    /// dedup message of their own (e.g. `time_matches`, whose dedup is the
    /// 60s `last_triggered` self-lockout, not a logged fingerprint). The
    /// Scheduler falls through to the Executor's own message in this case.
    pub fn fired_no_metadata() -> Self {
        Self {
            fired: true,
            metadata: None,
            data: None,
            error: None,
        }
    }

    pub fn fired_with_data(metadata: impl Into<String>, data: Json) -> Self {
        Self {
            fired: true,
            metadata: Some(metadata.into()),
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            fired: true,
            metadata: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// What an Executor returns after performing a Reaction's effect.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }

    /// The string the Scheduler records as `WorkflowLog.message` when no
    /// trigger-side fingerprint is available (internal reactions, or a
    /// failure with no metadata), mirroring the original's
    /// `result.get('message') or result.get('error', 'Unknown result')`.
    pub fn log_message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "Unknown result".to_string())
    }
}
