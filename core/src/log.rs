//! Categorised log lines produced by the engine.
//!
//! The engine never formats for a display; it hands `(category, text)` pairs to a
//! [`LogSink`]. Front ends either poll the in-memory buffer or plug in their own sink.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    Info,
    Positive,
    Negative,
    Event,
    Header,
    SectionBreak,
}

impl LogCategory {
    pub fn label(self) -> &'static str {
        match self {
            LogCategory::Info => "info",
            LogCategory::Positive => "positive",
            LogCategory::Negative => "negative",
            LogCategory::Event => "event",
            LogCategory::Header => "header",
            LogCategory::SectionBreak => "section-break",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub category: LogCategory,
    pub text: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category.label(), self.text)
    }
}

pub trait LogSink {
    fn emit(&mut self, category: LogCategory, text: &str);
}

/// Bounded in-memory buffer. Oldest lines are dropped once the capacity is reached.
#[derive(Debug, Clone)]
pub struct MemorySink {
    lines: VecDeque<LogLine>,
    capacity: usize,
}

impl MemorySink {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    pub fn drain(&mut self) -> Vec<LogLine> {
        self.lines.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(2_000)
    }
}

impl LogSink for MemorySink {
    fn emit(&mut self, category: LogCategory, text: &str) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(LogLine {
            category,
            text: text.to_string(),
        });
    }
}

/// Forwards lines to `tracing` so they show up under `RUST_LOG`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&mut self, category: LogCategory, text: &str) {
        match category {
            LogCategory::Negative => tracing::warn!(target: "pubsim::log", "{text}"),
            LogCategory::Header | LogCategory::Event => {
                tracing::info!(target: "pubsim::log", "{text}")
            }
            LogCategory::Positive | LogCategory::Info => {
                tracing::debug!(target: "pubsim::log", "{text}")
            }
            LogCategory::SectionBreak => {}
        }
    }
}

/// Sends every line to each of its sinks in registration order.
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Box<dyn LogSink>>,
}

impl FanOutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Box<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn push(&mut self, sink: Box<dyn LogSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl LogSink for FanOutSink {
    fn emit(&mut self, category: LogCategory, text: &str) {
        for sink in self.sinks.iter_mut() {
            sink.emit(category, text);
        }
    }
}

/// The engine's own log: an always-present buffer plus any caller-supplied sinks.
pub struct LogHub {
    buffer: MemorySink,
    external: FanOutSink,
}

impl LogHub {
    pub fn new(external: FanOutSink) -> Self {
        Self {
            buffer: MemorySink::default(),
            external,
        }
    }

    pub fn info<S: AsRef<str>>(&mut self, text: S) {
        self.emit(LogCategory::Info, text.as_ref());
    }

    pub fn pos<S: AsRef<str>>(&mut self, text: S) {
        self.emit(LogCategory::Positive, text.as_ref());
    }

    pub fn neg<S: AsRef<str>>(&mut self, text: S) {
        self.emit(LogCategory::Negative, text.as_ref());
    }

    pub fn event<S: AsRef<str>>(&mut self, text: S) {
        self.emit(LogCategory::Event, text.as_ref());
    }

    pub fn header<S: AsRef<str>>(&mut self, text: S) {
        self.emit(LogCategory::Header, text.as_ref());
    }

    pub fn section_break(&mut self) {
        self.emit(LogCategory::SectionBreak, "");
    }

    pub fn recent(&self) -> impl Iterator<Item = &LogLine> {
        self.buffer.lines()
    }

    pub fn drain(&mut self) -> Vec<LogLine> {
        self.buffer.drain()
    }

    pub fn attach(&mut self, sink: Box<dyn LogSink>) {
        self.external.push(sink);
    }
}

impl Default for LogHub {
    fn default() -> Self {
        Self::new(FanOutSink::new())
    }
}

impl LogSink for LogHub {
    fn emit(&mut self, category: LogCategory, text: &str) {
        self.buffer.emit(category, text);
        self.external.emit(category, text);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    struct Recorder(Rc<RefCell<Vec<LogCategory>>>);

    impl LogSink for Recorder {
        fn emit(&mut self, category: LogCategory, _text: &str) {
            self.0.borrow_mut().push(category);
        }
    }

    #[test]
    fn memory_sink_drops_oldest_lines() {
        let mut sink = MemorySink::new(2);
        sink.emit(LogCategory::Info, "one");
        sink.emit(LogCategory::Info, "two");
        sink.emit(LogCategory::Negative, "three");
        let texts: Vec<_> = sink.lines().map(|line| line.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let mut fan = FanOutSink::new()
            .with(Box::new(Recorder(first.clone())))
            .with(Box::new(Recorder(second.clone())));
        fan.emit(LogCategory::Header, "Night 1");
        fan.emit(LogCategory::Event, "Fight");
        assert_eq!(first.borrow().len(), 2);
        assert_eq!(*second.borrow(), vec![LogCategory::Header, LogCategory::Event]);
    }

    #[test]
    fn hub_buffers_and_forwards() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut hub = LogHub::new(FanOutSink::new().with(Box::new(Recorder(seen.clone()))));
        hub.pos("Cheers");
        hub.section_break();
        let drained = hub.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].category, LogCategory::Positive);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(hub.recent().count(), 0);
    }
}
