//! Reading required/optional fields out of a workflow's `actionConfig`/
//! `reactionConfig` blob. There is no general JSON-Schema validator (§3):
//! each Checker/Executor reads the specific fields it declares, exactly as
//! the original does (`area.action_config.get('time')`), surfacing a
//! missing field as `AreaError::Config`.

use area_core::{AreaError, Result};
use serde_json::Value as Json;

pub fn require_str<'a>(config: &'a Json, field: &str) -> Result<&'a str> {
    config
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AreaError::config(format!("missing required field '{field}'")))
}

pub fn optional_str<'a>(config: &'a Json, field: &str) -> Option<&'a str> {
    config.get(field).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

pub fn require_u32(config: &Json, field: &str) -> Result<u32> {
    config
        .get(field)
        .and_then(|v| v.as_u64())
        .map(|n| n as u32)
        .ok_or_else(|| AreaError::config(format!("missing required field '{field}'")))
}

pub fn optional_bool(config: &Json, field: &str, default: bool) -> bool {
    config.get(field).and_then(|v| v.as_bool()).unwrap_or(default)
}
