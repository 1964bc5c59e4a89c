//! Pointer and keyboard output
//!
//! Every side effect on the game goes through an [`InputSink`] as an
//! [`InputAction`]. Settle delays are actions too, so a recorded sequence
//! shows exactly what a turn did and in which order.

#[cfg(feature = "desktop")]
pub mod desktop;
pub mod dispatcher;

#[cfg(feature = "desktop")]
pub use desktop::DesktopSink;
pub use dispatcher::ActionDispatcher;

use std::time::Duration;

/// Actions that can be sent to the game window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Glide the pointer to a screen coordinate
    MoveTo { x: i32, y: i32, duration_ms: u64 },
    /// Left click at a screen coordinate
    Click { x: i32, y: i32 },
    /// Press and release a named key
    Press { key: String },
    /// Wait for a specified duration
    Wait { duration_ms: u64 },
}

/// Executes input actions
pub trait InputSink {
    fn perform(&mut self, action: &InputAction) -> Result<(), InputError>;
}

/// Sink that only logs pointer and key actions and sleeps through waits.
///
/// Used when no input backend is attached, e.g. while replaying screenshots.
#[derive(Debug, Default)]
pub struct LoggingSink {
    performed: u64,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actions performed so far
    pub fn performed(&self) -> u64 {
        self.performed
    }
}

impl InputSink for LoggingSink {
    fn perform(&mut self, action: &InputAction) -> Result<(), InputError> {
        self.performed += 1;
        match action {
            InputAction::MoveTo { x, y, duration_ms } => {
                log::debug!("Move pointer to ({}, {}) over {}ms", x, y, duration_ms);
            }
            InputAction::Click { x, y } => log::info!("Click at ({}, {})", x, y),
            InputAction::Press { key } => log::info!("Press {}", key),
            InputAction::Wait { duration_ms } => {
                std::thread::sleep(Duration::from_millis(*duration_ms));
            }
        }
        Ok(())
    }
}

/// Input errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Input backend failed: {0}")]
    Backend(String),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records actions without sleeping
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSink {
        pub actions: Rc<RefCell<Vec<InputAction>>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Everything except waits
        pub fn visible(&self) -> Vec<InputAction> {
            self.actions
                .borrow()
                .iter()
                .filter(|a| !matches!(a, InputAction::Wait { .. }))
                .cloned()
                .collect()
        }
    }

    impl InputSink for RecordingSink {
        fn perform(&mut self, action: &InputAction) -> Result<(), InputError> {
            self.actions.borrow_mut().push(action.clone());
            Ok(())
        }
    }

    #[test]
    fn test_logging_sink_counts() {
        let mut sink = LoggingSink::new();
        sink.perform(&InputAction::Click { x: 1, y: 2 }).unwrap();
        sink.perform(&InputAction::Press { key: "space".into() }).unwrap();
        sink.perform(&InputAction::Wait { duration_ms: 0 }).unwrap();
        assert_eq!(sink.performed(), 3);
    }

    #[test]
    fn test_recording_sink_visible() {
        let sink = RecordingSink::new();
        let mut boxed: Box<dyn InputSink> = Box::new(sink.clone());
        boxed.perform(&InputAction::Wait { duration_ms: 10 }).unwrap();
        boxed.perform(&InputAction::Click { x: 5, y: 6 }).unwrap();

        assert_eq!(sink.actions.borrow().len(), 2);
        assert_eq!(sink.visible(), vec![InputAction::Click { x: 5, y: 6 }]);
    }
}
