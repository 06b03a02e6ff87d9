//! Terminal UI module using ratatui.
//!
//! - `render`: screen and overlay rendering
//! - `input`: Keyboard event handling
//! - `styles`: Color scheme and text styling

pub mod input;
pub mod render;
pub mod styles;
