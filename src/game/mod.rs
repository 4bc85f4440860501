//! Game module

pub mod chain;
pub mod drawing;
#[allow(clippy::module_inception)]
pub mod game;
pub mod prompts;

pub use drawing::Drawing;
pub use game::{DrawingDeadline, Game, GamePhase, Outcome};
pub use prompts::PromptLanguage;
