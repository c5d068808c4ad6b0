use std::fmt;

use crate::{EventParser, GerritEvent, Provider, Result};

/// A unit of work placed on the shared queue.
///
/// Raw payloads are parsed by the worker that dequeues them; already
/// parsed events go straight to dispatch. The provider of a raw payload is
/// attached to the event it parses into.
#[derive(Debug, Clone)]
pub enum WorkItem {
    /// One line of `stream-events` output.
    Text {
        payload: String,
        provider: Option<Provider>,
    },
    /// A JSON object already split out of the stream.
    Json {
        payload: serde_json::Value,
        provider: Option<Provider>,
    },
    /// An event built programmatically.
    Event(GerritEvent),
}

impl WorkItem {
    pub fn provider(&self) -> Option<&Provider> {
        match self {
            WorkItem::Text { provider, .. } | WorkItem::Json { provider, .. } => provider.as_ref(),
            WorkItem::Event(event) => event.provider(),
        }
    }

    /// Turn the item into an event, parsing raw payloads with `parser`.
    ///
    /// `Ok(None)` means the payload is not an event worth dispatching.
    pub fn into_event(self, parser: &dyn EventParser) -> Result<Option<GerritEvent>> {
        match self {
            WorkItem::Text { payload, provider } => parser.parse_text(&payload, provider.as_ref()),
            WorkItem::Json { payload, provider } => parser.parse_json(payload, provider.as_ref()),
            WorkItem::Event(event) => Ok(Some(event)),
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItem::Text { .. } => f.write_str("text")?,
            WorkItem::Json { .. } => f.write_str("json")?,
            WorkItem::Event(event) => write!(f, "event {}", event.kind())?,
        }
        if let Some(provider) = self.provider() {
            write!(f, " from {provider}")?;
        }
        Ok(())
    }
}
