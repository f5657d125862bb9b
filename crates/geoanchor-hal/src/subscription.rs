//! RAII handle for a running sensor stream.

use tracing::debug;

type Teardown = Box<dyn FnOnce() + Send>;

/// A live sensor subscription.
///
/// The teardown closure supplied by the provider runs exactly once, either
/// on [`cancel`][Self::cancel] or when the handle is dropped. Owning scopes
/// hold these so that leaving the scope always releases the sensor.
pub struct Subscription {
    name: String,
    teardown: Option<Teardown>,
}

impl Subscription {
    pub fn new(name: impl Into<String>, teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name: name.into(),
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Name of the stream, e.g. `"sim_compass"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.teardown.is_some()
    }

    /// Stop the stream. Further calls are no-ops.
    pub fn cancel(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            debug!(subscription = %self.name, "unsubscribing");
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("active", &self.is_active())
            .finish()
    }
}
