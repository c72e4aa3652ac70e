//! User interface rendering and input handling.
//!
//! - **renderer**: lays the session buffer out on screen and maps clicks back
//! - **keymapper**: keyboard and mouse events to session actions

pub mod keymapper;
pub mod renderer;

pub use keymapper::{Action, KeyMapper};
pub use renderer::Renderer;
