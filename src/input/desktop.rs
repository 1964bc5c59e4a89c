//! Real mouse and keyboard output through `enigo`
//!
//! Coordinates are absolute screen pixels. Built with the `desktop` feature.

use std::time::Duration;

use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse};

use super::{InputAction, InputError, InputSink};

/// Interval between pointer steps while gliding
const GLIDE_STEP_MS: u64 = 10;

/// Sink that moves the actual pointer and presses actual keys
pub struct DesktopSink {
    enigo: Enigo,
}

impl DesktopSink {
    /// Connect to the platform input backend
    pub fn new() -> Result<Self, InputError> {
        let enigo = Enigo::new(&enigo::Settings::default()).map_err(backend)?;
        log::info!("Desktop input backend ready");
        Ok(Self { enigo })
    }

    fn glide(&mut self, x: i32, y: i32, duration_ms: u64) -> Result<(), InputError> {
        let (start_x, start_y) = self.enigo.location().map_err(backend)?;
        let steps = (duration_ms / GLIDE_STEP_MS).max(1);

        for step in 1..=steps {
            let t = step as f64 / steps as f64;
            let step_x = start_x + (f64::from(x - start_x) * t).round() as i32;
            let step_y = start_y + (f64::from(y - start_y) * t).round() as i32;
            self.enigo
                .move_mouse(step_x, step_y, Coordinate::Abs)
                .map_err(backend)?;
            if step < steps {
                std::thread::sleep(Duration::from_millis(GLIDE_STEP_MS));
            }
        }
        Ok(())
    }
}

impl InputSink for DesktopSink {
    fn perform(&mut self, action: &InputAction) -> Result<(), InputError> {
        match action {
            InputAction::MoveTo { x, y, duration_ms } => self.glide(*x, *y, *duration_ms),
            InputAction::Click { x, y } => {
                log::debug!("Click at ({}, {})", x, y);
                self.enigo.move_mouse(*x, *y, Coordinate::Abs).map_err(backend)?;
                self.enigo
                    .button(Button::Left, Direction::Click)
                    .map_err(backend)
            }
            InputAction::Press { key } => {
                log::debug!("Press {}", key);
                let key = parse_key(key)?;
                self.enigo.key(key, Direction::Click).map_err(backend)
            }
            InputAction::Wait { duration_ms } => {
                std::thread::sleep(Duration::from_millis(*duration_ms));
                Ok(())
            }
        }
    }
}

/// Map a key name from the settings file to a key
fn parse_key(name: &str) -> Result<Key, InputError> {
    let lower = name.trim().to_lowercase();
    let key = match lower.as_str() {
        "space" => Key::Space,
        "enter" | "return" => Key::Return,
        "esc" | "escape" => Key::Escape,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        _ => {
            let mut chars = lower.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => return Err(InputError::Backend(format!("unknown key {:?}", name))),
            }
        }
    };
    Ok(key)
}

fn backend(e: impl std::fmt::Display) -> InputError {
    InputError::Backend(e.to_string())
}
