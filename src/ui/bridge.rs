// UiBridge - coordinates between the tokio runtime and the Slint event loop
//
// Two event loops run in this application: Slint's single-threaded GUI loop
// and tokio's thread pool for background work. The bridge lets background
// tasks mutate widgets safely (marshaled through invoke_from_event_loop)
// and lets Slint callbacks spawn async work.

use slint::ComponentHandle;
use std::future::Future;
use tokio::sync::mpsc;

/// Cloneable handle marshaling UI updates onto the Slint event loop and
/// spawning async tasks from Slint callbacks.
///
/// Widget mutations are queued on a bounded channel (capacity 100) drained
/// by a dedicated thread; if the UI lags behind, updates are dropped rather
/// than letting the queue grow without bound.
pub struct UiBridge<T: ComponentHandle> {
    tokio_handle: tokio::runtime::Handle,
    update_tx: mpsc::Sender<Box<dyn FnOnce(&T) + Send>>,
}

// Manual Clone to avoid requiring T: Clone
impl<T: ComponentHandle> Clone for UiBridge<T> {
    fn clone(&self) -> Self {
        Self {
            tokio_handle: self.tokio_handle.clone(),
            update_tx: self.update_tx.clone(),
        }
    }
}

impl<T: ComponentHandle + 'static> UiBridge<T> {
    /// Create the bridge and start its handler thread.
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle) -> Self {
        let ui_weak_clone = ui.as_weak();
        let (update_tx, mut update_rx) = mpsc::channel::<Box<dyn FnOnce(&T) + Send>>(100);

        std::thread::spawn(move || {
            tracing::debug!("UiBridge handler thread started");

            while let Some(update_fn) = update_rx.blocking_recv() {
                // upgrade_in_event_loop queues the closure onto Slint's
                // event loop thread where widget access is legal
                let result = ui_weak_clone.upgrade_in_event_loop(move |ui| {
                    update_fn(&ui);
                });

                if let Err(e) = result {
                    // Event loop gone, nothing left to update
                    tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
                    break;
                }
            }

            tracing::debug!("UiBridge handler thread terminated");
        });

        Self {
            tokio_handle,
            update_tx,
        }
    }

    /// Schedule a widget update from any thread.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        match self.update_tx.try_send(Box::new(update)) {
            Ok(_) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("UI update channel full - dropping update");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Failed to send UI update - handler thread has stopped");
            }
        }
    }

    /// Spawn an async task on the tokio runtime from a Slint callback.
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }

}
