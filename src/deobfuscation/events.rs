//! Structured event logging for the deobfuscation passes.
//!
//! Every decision the passes take is recorded here instead of being printed: a decryptor
//! that was identified, a resource that could not be recovered, a method group that was
//! left alone because it touches an external type. Callers can inspect the log, merge
//! logs of several modules, or ignore it.
//!
//! # Architecture
//!
//! - [`Event`] - A single recorded event
//! - [`EventLog`] - Collection of events with query and summary capabilities
//! - [`EventBuilder`] - Fluent API for creating events
//!
//! # Example
//!
//! ```rust
//! use reactorscope::deobfuscation::events::{EventKind, EventLog};
//! use reactorscope::metadata::token::Token;
//!
//! let log = EventLog::new();
//!
//! log.record(EventKind::MethodRenamed)
//!     .token(Token::new(0x0600_0001))
//!     .message("\u{200b}a -> method_0");
//! log.info("renaming finished");
//!
//! assert_eq!(log.count_kind(EventKind::MethodRenamed), 1);
//! println!("{}", log.summary());
//! ```

use std::{collections::HashMap, fmt};

use crate::metadata::token::Token;

/// Categories of events that can be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A method was identified as the resource decryptor.
    DecryptorIdentified,
    /// An encrypted resource was decrypted and decompressed.
    ResourceDecrypted,
    /// A protector artifact was handed to cleanup.
    ArtifactMarked,

    /// A type was renamed.
    TypeRenamed,
    /// A method was renamed.
    MethodRenamed,
    /// A field was renamed.
    FieldRenamed,
    /// A property was renamed.
    PropertyRenamed,
    /// An event was renamed.
    EventRenamed,
    /// A stripped property was recreated.
    PropertyRestored,
    /// A stripped event was recreated.
    EventRestored,
    /// A virtual method group was left untouched.
    GroupSkipped,
    /// A fully resolved type still has interface methods without implementation.
    InterfaceUnresolved,

    /// Informational message.
    Info,
    /// Warning (something unexpected but recoverable).
    Warning,
    /// Error (something failed).
    Error,
}

impl EventKind {
    /// Returns a human-readable description of this event kind.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            // Resources
            Self::DecryptorIdentified => "decryptor identified",
            Self::ResourceDecrypted => "resource decrypted",
            Self::ArtifactMarked => "artifact marked",
            // Renaming
            Self::TypeRenamed => "type renamed",
            Self::MethodRenamed => "method renamed",
            Self::FieldRenamed => "field renamed",
            Self::PropertyRenamed => "property renamed",
            Self::EventRenamed => "event renamed",
            Self::PropertyRestored => "property restored",
            Self::EventRestored => "event restored",
            Self::GroupSkipped => "group skipped",
            Self::InterfaceUnresolved => "interface unresolved",
            // Diagnostic
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Returns true if this event represents a change to the module.
    #[must_use]
    pub fn is_transformation(&self) -> bool {
        matches!(
            self,
            Self::ResourceDecrypted
                | Self::ArtifactMarked
                | Self::TypeRenamed
                | Self::MethodRenamed
                | Self::FieldRenamed
                | Self::PropertyRenamed
                | Self::EventRenamed
                | Self::PropertyRestored
                | Self::EventRestored
        )
    }

    /// Returns true if this is a diagnostic event.
    #[must_use]
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            Self::Info | Self::Warning | Self::Error | Self::InterfaceUnresolved
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A single logged event.
#[derive(Debug, Clone)]
pub struct Event {
    /// The type of event.
    pub kind: EventKind,
    /// The declaration the event is about (if applicable).
    pub token: Option<Token>,
    /// Human-readable description.
    pub message: String,
}

impl Event {
    fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            token: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token {
            Some(token) => write!(f, "[{}] {}: {}", self.kind, token, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Builder for creating events with a fluent API.
///
/// Created by [`EventLog::record`]. The event is added to the log when the builder
/// is dropped.
pub struct EventBuilder<'a> {
    log: &'a EventLog,
    kind: EventKind,
    token: Option<Token>,
    message: Option<String>,
}

impl<'a> EventBuilder<'a> {
    fn new(log: &'a EventLog, kind: EventKind) -> Self {
        Self {
            log,
            kind,
            token: None,
            message: None,
        }
    }

    /// Sets the declaration the event is about.
    pub fn token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Sets a custom message describing the event.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }
}

impl Drop for EventBuilder<'_> {
    fn drop(&mut self) {
        let message = self
            .message
            .take()
            .unwrap_or_else(|| self.kind.description().to_string());

        self.log.events.push(Event {
            kind: self.kind,
            token: self.token.take(),
            message,
        });
    }
}

/// Collection of events from deobfuscation.
///
/// Events are appended through shared references, so passes holding `&EventLog`
/// can record without exclusive access.
#[derive(Debug, Default)]
pub struct EventLog {
    events: boxcar::Vec<Event>,
}

impl Clone for EventLog {
    fn clone(&self) -> Self {
        let new_log = Self::new();
        new_log.merge(self);
        new_log
    }
}

impl EventLog {
    /// Creates an empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: boxcar::Vec::new(),
        }
    }

    /// Returns true if no events have been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.count() == 0
    }

    /// Returns the total number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.count()
    }

    /// Starts building a new event of the given kind.
    pub fn record(&self, kind: EventKind) -> EventBuilder<'_> {
        EventBuilder::new(self, kind)
    }

    /// Records an informational message.
    pub fn info(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Info, message));
    }

    /// Records a warning message.
    pub fn warn(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Warning, message));
    }

    /// Records an error message.
    pub fn error(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Error, message));
    }

    /// Appends copies of all events of `other`.
    pub fn merge(&self, other: &EventLog) {
        for (_, event) in &other.events {
            self.events.push(event.clone());
        }
    }

    /// Returns true if any event of the given kind exists.
    #[must_use]
    pub fn has(&self, kind: EventKind) -> bool {
        self.events.iter().any(|(_, e)| e.kind == kind)
    }

    /// Returns true if an error was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has(EventKind::Error)
    }

    /// Counts events of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|(_, e)| e.kind == kind).count()
    }

    /// Returns an iterator over all events.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().map(|(_, e)| e)
    }

    /// Returns an iterator over events of a specific kind.
    pub fn filter_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.iter().filter(move |e| e.kind == kind)
    }

    /// Returns an iterator over events about a specific declaration.
    pub fn filter_token(&self, token: Token) -> impl Iterator<Item = &Event> + '_ {
        self.iter().filter(move |e| e.token == Some(token))
    }

    /// Counts events grouped by kind.
    #[must_use]
    pub fn count_by_kind(&self) -> HashMap<EventKind, usize> {
        let mut counts = HashMap::new();
        for (_, event) in &self.events {
            *counts.entry(event.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Generates a one-line summary of the transformations and problems recorded.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "no events".to_string();
        }

        let counts = self.count_by_kind();

        let mut parts: Vec<String> = counts
            .iter()
            .filter(|(k, _)| k.is_transformation())
            .map(|(kind, count)| format!("{} {}", count, kind.description()))
            .collect();
        parts.sort();

        for kind in [EventKind::Warning, EventKind::Error] {
            if let Some(count) = counts.get(&kind) {
                parts.push(format!("{} {}", count, kind.description()));
            }
        }

        if parts.is_empty() {
            return format!("{} events", self.len());
        }
        parts.join(", ")
    }
}

impl FromIterator<Event> for EventLog {
    fn from_iter<T: IntoIterator<Item = Event>>(iter: T) -> Self {
        let log = Self::new();
        for event in iter {
            log.events.push(event);
        }
        log
    }
}
