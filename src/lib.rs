//! Shiny Hunter - screen-driven automation for turn-based creature battles
//!
//! This library watches frames of a running game, classifies what is on
//! screen with template matching, reads creature and move names with OCR,
//! and answers with pointer and key actions until a shiny is found.
//!
//! ## Layers
//!
//! - [`vision`]: frame intake, region geometry, template matching, state
//!   classification and OCR field reading
//! - [`game`]: game phase model, per-battle tracking, move and roster memory
//! - [`ai`]: the decision policy consulted on every battle turn
//! - [`input`]: input actions and the dispatcher turning decisions into clicks
//! - [`engine`]: the turn engine, the overworld handler and the main loop
//!
//! ## Humanization
//!
//! The `stealth` module varies settle delays and click positions so that
//! repeated actions do not land on identical pixels at identical intervals.

pub mod ai;
pub mod config;
pub mod engine;
pub mod game;
pub mod input;
pub mod stealth;
pub mod vision;

pub use config::Settings;
pub use engine::{BotError, BotLoop, LoopOutcome, RunSummary};
pub use game::state::GameState;
