use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Something that can show a notification to the user
pub trait Notifier: Send + 'static {
    fn notify(&self, title: &str, body: &str);
}

/// A one-shot reminder running on a background thread.
///
/// Fires at most once. Dropping the handle (or calling [`Reminder::cancel`])
/// before the delay elapses unschedules it.
pub struct Reminder {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<bool>>,
}

impl Reminder {
    /// Schedule `notifier.notify("Reminder", title)` after `delay`
    pub fn schedule<N: Notifier>(title: impl Into<String>, delay: Duration, notifier: N) -> Self {
        let title = title.into();
        let (tx, rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || match rx.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(%title, "reminder fired");
                notifier.notify("Reminder", &title);
                true
            }
            // Cancelled explicitly or the handle was dropped
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        });
        Reminder {
            cancel: Some(tx),
            handle: Some(handle),
        }
    }

    /// Block until the reminder fires or is cancelled. Returns true if it fired.
    pub fn wait(mut self) -> bool {
        self.handle
            .take()
            .map(|h| h.join().unwrap_or(false))
            .unwrap_or(false)
    }

    /// Unschedule the reminder. Returns true if it had already fired.
    pub fn cancel(mut self) -> bool {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
        self.wait()
    }
}

impl Drop for Reminder {
    fn drop(&mut self) {
        // Dropping the sender disconnects the channel, which wakes the thread
        self.cancel.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(String, String)>>>);

    impl Notifier for Recorder {
        fn notify(&self, title: &str, body: &str) {
            self.0.lock().unwrap().push((title.into(), body.into()));
        }
    }

    #[test]
    fn fires_after_delay() {
        let rec = Recorder::default();
        let reminder = Reminder::schedule("stretch", Duration::from_millis(10), rec.clone());
        assert!(reminder.wait());
        assert_eq!(
            *rec.0.lock().unwrap(),
            vec![("Reminder".to_string(), "stretch".to_string())]
        );
    }

    #[test]
    fn cancel_prevents_notification() {
        let rec = Recorder::default();
        let reminder = Reminder::schedule("later", Duration::from_secs(30), rec.clone());
        assert!(!reminder.cancel());
        assert!(rec.0.lock().unwrap().is_empty());
    }

    #[test]
    fn drop_unschedules() {
        let rec = Recorder::default();
        drop(Reminder::schedule("gone", Duration::from_secs(30), rec.clone()));
        thread::sleep(Duration::from_millis(20));
        assert!(rec.0.lock().unwrap().is_empty());
    }
}
