use std::fmt;
use std::sync::Arc;

/// Describes a change to a property or container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Name of the property, or title of the container, that changed
    pub source: String,
    /// Revision of the source after the change
    pub revision: u64,
}

/// Callback that is invoked whenever an observed property or container changes
pub type Observer = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Revision counter plus the list of observers of one property or container.
///
/// Cloning a notifier keeps the revision but drops all observers: a clone belongs to a new owner, and mutations of
/// the clone are of no interest to the observers of the original
#[derive(Default)]
pub struct ChangeNotifier {
    revision: u64,
    observers: Vec<Observer>,
}

impl ChangeNotifier {
    /// Number of changes that were notified so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn add_observer(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn observers(&self) -> &[Observer] {
        &self.observers
    }

    /// Increments the revision and calls all observers
    pub fn notify(&mut self, source: &str) {
        self.revision += 1;
        if self.observers.is_empty() {
            return;
        }
        let event = ChangeEvent {
            source: source.to_owned(),
            revision: self.revision,
        };
        for observer in &self.observers {
            observer(&event);
        }
    }
}

impl Clone for ChangeNotifier {
    fn clone(&self) -> Self {
        Self {
            revision: self.revision,
            observers: vec![],
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("revision", &self.revision)
            .field("observers", &self.observers.len())
            .finish()
    }
}
