//! Record renderers.

mod gelf;
mod text;

pub use gelf::{GelfOptions, GelfRenderer, PreparedGelf};
pub use text::{PreparedText, TextOptions, TextRenderer};
