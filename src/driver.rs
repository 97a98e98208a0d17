// The driver is split in two: `hd44780` turns controller bytes into timed backpack bus writes,
// `layout` decides what the text printer sends for each input byte. `CharacterDisplay` in the
// crate root ties them together.

pub mod hd44780;
pub mod layout;
