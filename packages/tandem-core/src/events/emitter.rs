//! Event emitter abstraction for decoupling services from transport.
//!
//! Services depend on the [`EventEmitter`] trait rather than a concrete
//! channel, enabling testing and alternative delivery mechanisms.

use super::GroupEvent;

/// Trait for emitting domain events without knowledge of transport.
///
/// # Example
///
/// ```ignore
/// struct MyService {
///     emitter: Arc<dyn EventEmitter>,
/// }
///
/// impl MyService {
///     fn do_something(&self) {
///         self.emitter.emit_group(GroupEvent::Dissolved { ... });
///     }
/// }
/// ```
pub trait EventEmitter: Send + Sync {
    /// Emits a group lifecycle event.
    fn emit_group(&self, event: GroupEvent);
}

/// No-op emitter for embedding or testing.
///
/// Events are silently discarded.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_group(&self, _event: GroupEvent) {}
}

/// Logging emitter.
///
/// Logs all events at debug level. Used by the CLI, where nothing else
/// consumes events. With no tracing subscriber installed, records go to the
/// `log` backend (env_logger in the CLI).
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_group(&self, event: GroupEvent) {
        tracing::debug!(?event, "group_event");
    }
}
