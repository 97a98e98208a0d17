//! Cursor tracking for the text printer. Pure bookkeeping: decides, byte by byte, what the
//! printer has to put on the bus, without touching the bus itself.

use crate::config::{WrapPolicy, FIXED_LAST_LINE, FIXED_WRAP_COLUMNS};

/// Number of lines the DDRAM row table can address.
pub const ADDRESSABLE_LINES: u8 = 4;

/// Widest line a single HD44780 controller drives.
pub const MAX_LINE_LENGTH: u8 = 40;

/// Where the next printed character lands. Lives with the caller between print calls; the
/// display does not remember it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Cursor {
    pub line: u8,
    pub column: u8,
}

impl Cursor {
    /// Cursor at the start of `line`.
    pub const fn line_start(line: u8) -> Self {
        Self { line, column: 0 }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Cursor {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "line {} col {}", self.line, self.column);
    }
}

/// Printable area the cursor wraps within.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct WrapArea {
    pub width: u8,
    pub last_line: u8,
}

impl WrapArea {
    pub fn new(policy: WrapPolicy, columns: u8, rows: u8) -> Self {
        match policy {
            WrapPolicy::FixedWidth => Self {
                width: FIXED_WRAP_COLUMNS,
                last_line: FIXED_LAST_LINE,
            },
            WrapPolicy::DisplayGeometry => Self {
                width: columns.clamp(1, MAX_LINE_LENGTH),
                last_line: rows.clamp(1, ADDRESSABLE_LINES) - 1,
            },
        }
    }
}

/// What happens on the line after a character has been written.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Wrap {
    /// Column is still on the current line.
    None,
    /// Line was full; continue at the start of the given line.
    NextLine(u8),
    /// Last line was full; blank the top line and continue there.
    ClearTop,
}

/// Bus work required for one input byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Step {
    /// Byte has no effect.
    Skip,
    /// Newline away from column 0: address the start of the given line.
    NewLine(u8),
    /// Write the byte as character data, then handle the wrap.
    Emit(u8, Wrap),
}

impl Cursor {
    /// Advance the cursor over one input byte and report what the printer must do for it.
    pub fn step(&mut self, byte: u8, area: WrapArea) -> Step {
        match byte {
            b'\r' => Step::Skip,
            b'\n' if self.column == 0 => Step::Skip,
            b'\n' => {
                self.line = self.line.wrapping_add(1);
                self.column = 0;
                Step::NewLine(self.line)
            }
            _ => {
                if self.column + 1 < area.width {
                    self.column += 1;
                    return Step::Emit(byte, Wrap::None);
                }
                self.column = 0;
                if self.line >= area.last_line {
                    self.line = 0;
                    Step::Emit(byte, Wrap::ClearTop)
                } else {
                    self.line += 1;
                    Step::Emit(byte, Wrap::NextLine(self.line))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA_20X4: WrapArea = WrapArea {
        width: 20,
        last_line: 3,
    };

    #[test]
    fn test_plain_characters_advance_column() {
        let mut cursor = Cursor::line_start(0);
        assert_eq!(cursor.step(b'A', AREA_20X4), Step::Emit(b'A', Wrap::None));
        assert_eq!(cursor.column, 1);
        assert_eq!(cursor.step(b'B', AREA_20X4), Step::Emit(b'B', Wrap::None));
        assert_eq!(cursor, Cursor { line: 0, column: 2 });
    }

    #[test]
    fn test_carriage_return_is_ignored() {
        let mut cursor = Cursor { line: 1, column: 5 };
        assert_eq!(cursor.step(b'\r', AREA_20X4), Step::Skip);
        assert_eq!(cursor, Cursor { line: 1, column: 5 });
    }

    #[test]
    fn test_newline_at_column_zero_is_noop() {
        let mut cursor = Cursor::line_start(2);
        assert_eq!(cursor.step(b'\n', AREA_20X4), Step::Skip);
        assert_eq!(cursor, Cursor::line_start(2));
    }

    #[test]
    fn test_newline_moves_to_next_line() {
        let mut cursor = Cursor { line: 1, column: 3 };
        assert_eq!(cursor.step(b'\n', AREA_20X4), Step::NewLine(2));
        assert_eq!(cursor, Cursor::line_start(2));
    }

    #[test]
    fn test_newline_past_last_line_is_reported() {
        // the printer turns this into an out of range line address
        let mut cursor = Cursor { line: 3, column: 3 };
        assert_eq!(cursor.step(b'\n', AREA_20X4), Step::NewLine(4));
    }

    #[test]
    fn test_full_line_wraps_to_next_line() {
        let mut cursor = Cursor { line: 1, column: 19 };
        assert_eq!(cursor.step(b'x', AREA_20X4), Step::Emit(b'x', Wrap::NextLine(2)));
        assert_eq!(cursor, Cursor::line_start(2));
        // a newline right after the wrap does not skip another line
        assert_eq!(cursor.step(b'\n', AREA_20X4), Step::Skip);
    }

    #[test]
    fn test_full_last_line_clears_top() {
        let mut cursor = Cursor { line: 3, column: 19 };
        assert_eq!(cursor.step(b'x', AREA_20X4), Step::Emit(b'x', Wrap::ClearTop));
        assert_eq!(cursor, Cursor::line_start(0));
    }

    #[test]
    fn test_fixed_width_ignores_geometry() {
        let area = WrapArea::new(WrapPolicy::FixedWidth, 16, 2);
        assert_eq!(area, AREA_20X4);
    }

    #[test]
    fn test_display_geometry_area() {
        let area = WrapArea::new(WrapPolicy::DisplayGeometry, 16, 2);
        assert_eq!(
            area,
            WrapArea {
                width: 16,
                last_line: 1
            }
        );

        let mut cursor = Cursor { line: 1, column: 15 };
        assert_eq!(cursor.step(b'x', area), Step::Emit(b'x', Wrap::ClearTop));

        // rows beyond the row table are capped
        let area = WrapArea::new(WrapPolicy::DisplayGeometry, 40, 8);
        assert_eq!(area.last_line, 3);

        // so are columns beyond one controller line
        let area = WrapArea::new(WrapPolicy::DisplayGeometry, 100, 4);
        assert_eq!(area.width, MAX_LINE_LENGTH);
    }
}
