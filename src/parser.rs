use serde_json::Value;

use crate::{GerritEvent, Provider, Result};

/// Turns raw stream payloads into events.
///
/// Workers call the parser for every raw work item they dequeue. `Ok(None)`
/// marks a payload that is not an event worth dispatching (blank line,
/// unknown event type...); errors are logged by the worker and the item
/// is dropped. Either way the worker carries on with the next item.
pub trait EventParser: Send + Sync + 'static {
    fn parse_text(&self, text: &str, provider: Option<&Provider>) -> Result<Option<GerritEvent>>;

    fn parse_json(&self, value: Value, provider: Option<&Provider>) -> Result<Option<GerritEvent>>;
}

/// Parser for the JSON lines Gerrit writes on `stream-events`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEventParser;

impl EventParser for JsonEventParser {
    fn parse_text(&self, text: &str, provider: Option<&Provider>) -> Result<Option<GerritEvent>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value @ Value::Object(_)) => self.parse_json(value, provider),
            Ok(_) => {
                tracing::debug!(line = text, "Not a JSON object, ignoring");
                Ok(None)
            }
            Err(e) => {
                tracing::debug!(line = text, error = %e, "Not JSON, ignoring");
                Ok(None)
            }
        }
    }

    fn parse_json(&self, value: Value, provider: Option<&Provider>) -> Result<Option<GerritEvent>> {
        let kind = value.get("type").and_then(Value::as_str);
        match kind {
            Some(kind) if GerritEvent::is_known_kind(kind) => {}
            other => {
                tracing::trace!(kind = ?other, "Uninteresting event type");
                return Ok(None);
            }
        }
        let mut event: GerritEvent = serde_json::from_value(value)?;
        event.set_provider(provider.cloned());
        Ok(Some(event))
    }
}
