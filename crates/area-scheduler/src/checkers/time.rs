//! `time_matches` / `interval_elapsed` — the two Action kinds that need no
//! provider round-trip at all, grounded in `scheduler/actions.py`'s
//! `check_time_matches`/`check_interval_elapsed`.

use area_core::entities::ResolvedWorkflow;
use area_core::TriggerOutcome;
use async_trait::async_trait;
use chrono::Timelike;

use crate::config_ext::{optional_str, require_str, require_u32};
use crate::context::EvalContext;
use crate::dispatcher::Checker;

pub struct TimeMatchesChecker;

#[async_trait]
impl Checker for TimeMatchesChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let config = workflow.action_config();
        let time = match require_str(config, "time") {
            Ok(t) => t,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };
        let tz_name = optional_str(config, "timezone").unwrap_or(&ctx.config.scheduler_timezone);
        let tz: chrono_tz::Tz = match tz_name.parse() {
            Ok(tz) => tz,
            Err(_) => return TriggerOutcome::failed(format!("unknown timezone '{tz_name}'")),
        };

        let (hour, minute) = match parse_hh_mm(time) {
            Some(pair) => pair,
            None => return TriggerOutcome::failed(format!("invalid time '{time}', expected HH:MM")),
        };

        let now = ctx.clock.now(tz);
        if now.hour() != hour || now.minute() != minute {
            return TriggerOutcome::not_fired();
        }

        // 60-second self-lockout: do not re-fire within the same minute this
        // workflow already triggered in.
        if let Some(last_triggered) = workflow.workflow.last_triggered {
            if ctx.clock.now_utc() - last_triggered < chrono::Duration::seconds(60) {
                return TriggerOutcome::not_fired();
            }
        }

        // No fingerprint: dedup for this kind is the 60s lockout above, not a
        // logged message, so the Scheduler records the reaction's own
        // message (e.g. "Email sent successfully to a@b.c") instead.
        TriggerOutcome::fired_no_metadata()
    }
}

fn parse_hh_mm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    if hour < 24 && minute < 60 {
        Some((hour, minute))
    } else {
        None
    }
}

pub struct IntervalElapsedChecker;

#[async_trait]
impl Checker for IntervalElapsedChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let config = workflow.action_config();
        let interval_minutes = match require_u32(config, "interval_minutes") {
            Ok(n) if n >= 1 => n,
            Ok(_) => return TriggerOutcome::failed("interval_minutes must be at least 1"),
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };

        let Some(last_triggered) = workflow.workflow.last_triggered else {
            return TriggerOutcome::fired(format!("Interval elapsed: {interval_minutes}m (first run)"));
        };

        let elapsed = ctx.clock.now_utc() - last_triggered;
        if elapsed >= chrono::Duration::minutes(interval_minutes as i64) {
            TriggerOutcome::fired(format!("Interval elapsed: {interval_minutes}m"))
        } else {
            TriggerOutcome::not_fired()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing as fixtures;

    #[tokio::test]
    async fn interval_elapsed_fires_on_first_run() {
        let ctx = fixtures::eval_context();
        let workflow = fixtures::resolved_workflow(serde_json::json!({"interval_minutes": 5}), serde_json::json!({}));
        let outcome = IntervalElapsedChecker.check(&workflow, &ctx).await;
        assert!(outcome.fired);
    }

    #[tokio::test]
    async fn interval_elapsed_waits_for_interval() {
        let ctx = fixtures::eval_context();
        let mut workflow = fixtures::resolved_workflow(serde_json::json!({"interval_minutes": 5}), serde_json::json!({}));
        workflow.workflow.last_triggered = Some(ctx.clock.now_utc());
        let outcome = IntervalElapsedChecker.check(&workflow, &ctx).await;
        assert!(!outcome.fired);
    }

    #[tokio::test]
    async fn time_matches_requires_exact_minute() {
        let ctx = fixtures::eval_context_at("2025-01-01T14:30:15Z");
        let workflow = fixtures::resolved_workflow(serde_json::json!({"time": "14:30", "timezone": "UTC"}), serde_json::json!({}));
        let outcome = TimeMatchesChecker.check(&workflow, &ctx).await;
        assert!(outcome.fired);
    }

    /// `time_matches` has no fingerprint of its own; the dedup mechanism is
    /// the 60s lockout, not a logged message — `metadata` must come back
    /// empty so the scheduler falls through to the reaction's own message.
    #[tokio::test]
    async fn time_matches_fires_with_no_metadata() {
        let ctx = fixtures::eval_context_at("2025-01-01T14:30:15Z");
        let workflow = fixtures::resolved_workflow(serde_json::json!({"time": "14:30", "timezone": "UTC"}), serde_json::json!({}));
        let outcome = TimeMatchesChecker.check(&workflow, &ctx).await;
        assert!(outcome.fired);
        assert!(outcome.metadata.is_none());
    }

    #[tokio::test]
    async fn time_matches_self_lockout() {
        let ctx = fixtures::eval_context_at("2025-01-01T14:30:45Z");
        let mut workflow = fixtures::resolved_workflow(serde_json::json!({"time": "14:30", "timezone": "UTC"}), serde_json::json!({}));
        workflow.workflow.last_triggered = Some("2025-01-01T14:30:15Z".parse().unwrap());
        let outcome = TimeMatchesChecker.check(&workflow, &ctx).await;
        assert!(!outcome.fired);
    }
}
