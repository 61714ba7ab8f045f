//! The built-in plugin set: text editing, inline formats, paste
//! sanitization, and the toggle embedded block.

pub mod format;
pub mod paste;
pub mod text;
pub mod toggle;

pub use format::FormatPlugin;
pub use paste::PastePlugin;
pub use text::TextPlugin;
pub use toggle::TogglePlugin;
