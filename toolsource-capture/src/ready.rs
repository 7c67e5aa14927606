use crate::plan::CapturePlan;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use toolsource_common::{Result, ToolsourceError};
use toolsource_config::ReadyCondition;
use toolsource_drivers::browser::session::BrowserSession;
use tracing::debug;

const DOCUMENT_COMPLETE_SCRIPT: &str = "return document.readyState === 'complete';";

/// Suspend until `condition` holds on the session's page.
///
/// `element` waits are bounded by the plan's ready timeout and fail with
/// `ElementTimeout`; `document_complete` and `script` poll every
/// `poll_interval` and fail with `Readiness`.
pub async fn wait_until<S>(
    session: &mut S,
    condition: &ReadyCondition,
    plan: &CapturePlan,
) -> Result<()>
where
    S: BrowserSession + ?Sized,
{
    debug!(target: "capture.ready", %condition, "waiting");
    match condition {
        ReadyCondition::Delay { millis } => {
            sleep(Duration::from_millis(*millis)).await;
            Ok(())
        }
        ReadyCondition::Element { selector } => {
            session
                .wait_for_element(selector, plan.ready_timeout, plan.poll_interval)
                .await
        }
        ReadyCondition::DocumentComplete => {
            poll_script(session, DOCUMENT_COMPLETE_SCRIPT, condition, plan).await
        }
        ReadyCondition::Script { expression } => {
            let script = format!("return !!({expression});");
            poll_script(session, &script, condition, plan).await
        }
    }
}

async fn poll_script<S>(
    session: &mut S,
    script: &str,
    condition: &ReadyCondition,
    plan: &CapturePlan,
) -> Result<()>
where
    S: BrowserSession + ?Sized,
{
    let deadline = Instant::now() + plan.ready_timeout;
    loop {
        if truthy(&session.evaluate(script).await?) {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(ToolsourceError::Readiness {
                condition: condition.to_string(),
                timeout: plan.ready_timeout,
            });
        }
        sleep(plan.poll_interval.min(deadline - now)).await;
    }
}

/// JavaScript truthiness of a WebDriver script result.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
