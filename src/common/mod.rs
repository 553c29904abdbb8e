//! Common utilities shared by the package writer and the slide composer.

pub mod unit;
pub mod xml;

pub use unit::{EMUS_PER_INCH, EMUS_PER_PT, emu_to_inches, inches_to_emu};
pub use xml::{escape_xml, unescape_entity};
