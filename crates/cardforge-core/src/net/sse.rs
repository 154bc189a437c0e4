//! Minimal server-sent-events line parser.
//!
//! Transport hands in text fragments at whatever boundaries the network
//! produced; the parser buffers until full lines are available and emits
//! `data:` payloads. Kept separate from the HTTP client so framing can be
//! tested without a socket.

/// Parsed SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload line.
    Data(String),
    /// The `data: [DONE]` terminator.
    Done,
}

/// Incremental line buffer over SSE text.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a fragment, get every event completed by it. Non-`data:` lines
    /// and blank keep-alives are dropped.
    pub fn push(&mut self, fragment: &str) -> Vec<SseEvent> {
        self.buffer.push_str(fragment);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(data) = line.strip_prefix("data: ") {
                if data == "[DONE]" {
                    events.push(SseEvent::Done);
                } else {
                    events.push(SseEvent::Data(data.to_string()));
                }
            }
        }
        events
    }
}
