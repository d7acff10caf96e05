//! Lifecycle events reported to the log sink.

use tracing::Level;

/// Something that happened to a service or to the run as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A worker is about to start the service's serve call.
    ServiceStarting { service: String },
    /// `serve` returned an error; the run will be cancelled.
    ServeFailed { service: String, cause: String },
    /// `shutdown` returned an error or missed its deadline.
    ShutdownFailed { service: String, cause: String },
    /// `shutdown` returned cleanly.
    ShutdownSucceeded { service: String },
    /// Every service stopped without error.
    AllServicesStopped,
}

impl LifecycleEvent {
    pub fn level(&self) -> Level {
        match self {
            LifecycleEvent::ServeFailed { .. } | LifecycleEvent::ShutdownFailed { .. } => {
                Level::ERROR
            }
            _ => Level::INFO,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LifecycleEvent::ServiceStarting { .. } => "service starting",
            LifecycleEvent::ServeFailed { .. } => "service serve failed",
            LifecycleEvent::ShutdownFailed { .. } => "service shutdown failed",
            LifecycleEvent::ShutdownSucceeded { .. } => "service shut down",
            LifecycleEvent::AllServicesStopped => "all services stopped",
        }
    }

    /// The service this event belongs to, if any.
    pub fn service(&self) -> Option<&str> {
        match self {
            LifecycleEvent::ServiceStarting { service }
            | LifecycleEvent::ServeFailed { service, .. }
            | LifecycleEvent::ShutdownFailed { service, .. }
            | LifecycleEvent::ShutdownSucceeded { service } => Some(service),
            LifecycleEvent::AllServicesStopped => None,
        }
    }

    /// Structured key/value attributes, `service` first.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(2);
        if let Some(service) = self.service() {
            fields.push(("service", service.to_string()));
        }
        if let LifecycleEvent::ServeFailed { cause, .. }
        | LifecycleEvent::ShutdownFailed { cause, .. } = self
        {
            fields.push(("cause", cause.clone()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_fields() {
        let event = LifecycleEvent::ServeFailed {
            service: "api".into(),
            cause: "address already in use".into(),
        };
        assert_eq!(event.level(), Level::ERROR);
        assert_eq!(
            event.fields(),
            vec![
                ("service", "api".to_string()),
                ("cause", "address already in use".to_string())
            ]
        );
    }

    #[test]
    fn test_run_event_has_no_service() {
        let event = LifecycleEvent::AllServicesStopped;
        assert_eq!(event.level(), Level::INFO);
        assert!(event.service().is_none());
        assert!(event.fields().is_empty());
    }
}
