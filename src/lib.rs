//! This `no_std` library drives a [HD44780](https://en.wikipedia.org/wiki/Hitachi_HD44780_LCD_controller)
//! compatible character display through a PCF8574 based "I2C backpack", with the controller wired in 4-bit mode.
//! The backpack maps its eight GPIO pins to RS, RW, EN, the backlight, and the four upper data lines D4-D7.
//!
//! The driver is write-only. It never polls the busy flag and relies on fixed delays instead, so all bus access
//! goes through three board supplied operations bundled in the [`Transport`] trait: bring up the bus, write one
//! byte to the backpack, and wait a number of microseconds. An [`I2cTransport`] built from any `embedded-hal` 1.0
//! I2C bus and delay provider is included.
//!
//! Key features include:
//! - Controller cold-start handshake and 4-bit mode setup
//! - Text printing with line wrap, newline handling, and wrap-around from the bottom line to a cleared top line
//! - Backlight control that takes effect with the next byte sent
//! - `core::fmt::Write` support through [`TextWriter`] for use with the `write!` macro
//! - Optional support for the `defmt` and `ufmt` frameworks
//!
//! ## Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! hd44780-i2c-lcd = { version = "0.1", features = ["defmt"] }
//! ```
//! The `defmt` feature adds debug logging and `defmt::Format` for the library's types. The `ufmt` feature lets
//! the `uwrite!` and `uwriteln!` macros be used with a [`TextWriter`].
//!
//! Wrap the board's I2C bus and delay and initialize the display:
//! ```rust
//! use hd44780_i2c_lcd::{CharacterDisplay, I2cTransport};
//!
//! let i2c = ...; // I2C peripheral
//! let delay = ...; // DelayNs implementation
//!
//! let mut lcd = CharacterDisplay::new(I2cTransport::new(i2c, delay));
//! if let Err(e) = lcd.init(0x27, 20, 4) {
//!    panic!("Error initializing LCD: {}", e);
//! }
//! ```
//! Use the display:
//! ```rust
//! lcd.clear()?.print("Hello,\nworld!", 0)?;
//! // the text writer remembers where the last write ended
//! use core::fmt::Write;
//!
//! let mut out = lcd.writer(2);
//! write!(out, "temp {} C", 21)?;
//! write!(out, "  ok")?;
//! ```
//! The line and column reached by printing are not stored in the display. `print` always starts at column 0 of
//! the line it is given; use [`CharacterDisplay::print_from`] or a [`TextWriter`] to continue where earlier text ended.
//!
//! ### Line wrapping
//! By default text wraps after 20 columns and the fourth line wraps back to a freshly blanked first line,
//! whatever geometry was passed to `init`. Select [`WrapPolicy::DisplayGeometry`] through [`DisplayOptions`]
//! to wrap at the configured column and row counts instead.
//!
#![no_std]
#![allow(non_upper_case_globals)]
use core::fmt::Display;

mod bit_configurations;
mod config;
mod driver;
mod transport;

pub use bit_configurations::{BACKLIGHT_BIT, EN_BIT, RS_BIT, RW_BIT};
pub use config::{
    DisplayOptions, LcdDisplayType, WrapPolicy, DEFAULT_CHAR_DELAY_US, FIXED_LAST_LINE,
    FIXED_WRAP_COLUMNS,
};
pub use driver::hd44780::{WriteMode, BLANK_CELL, LINE_ADDRESSES};
pub use driver::layout::Cursor;
pub use transport::{I2cTransport, Transport};

use driver::{
    hd44780::HD44780,
    layout::{Step, Wrap, WrapArea},
};

// commands
const LCD_CMD_CLEARDISPLAY: u8 = 0x01; //  Clear display, set cursor position to zero
const LCD_CMD_RETURNHOME: u8 = 0x02; //  Set cursor position to zero
const LCD_CMD_ENTRYMODESET: u8 = 0x04; //  Sets the entry mode
const LCD_CMD_DISPLAYCONTROL: u8 = 0x08; //  Display on/off, cursor and blink control
const LCD_CMD_FUNCTIONSET: u8 = 0x20; //  Used to send the function to set to the display
const LCD_CMD_SETDDRAMADDR: u8 = 0x80; //  Used to set the DDRAM (Display Data RAM)

// flags for display entry mode
const LCD_FLAG_ENTRYLEFT: u8 = 0x02; //  Used to set text to flow from left to right

// flags for display on/off control
const LCD_FLAG_DISPLAYON: u8 = 0x04; //  Turns the display on
const LCD_FLAG_CURSORON: u8 = 0x02; //  Turns the cursor on
const LCD_FLAG_BLINKON: u8 = 0x01; //  Turns on the blinking cursor

// flags for function set
const LCD_FLAG_4BITMODE: u8 = 0x00; //  LCD 4 bit mode
const LCD_FLAG_2LINE: u8 = 0x08; //  LCD 2 line mode
const LCD_FLAG_5x8_DOTS: u8 = 0x00; //  8 pixel high font mode

#[derive(Debug, PartialEq, Copy, Clone)]
/// Errors that can occur when using the display. `E` is the error type of the `Transport`.
pub enum CharacterDisplayError<E> {
    /// The transport failed to initialize the bus
    TransportInit(E),
    /// A byte write to the backpack failed
    BusWrite(E),
    /// The transport failed to delay
    Delay(E),
    /// Line is out of range
    LineOutOfRange,
    /// Column is out of range
    ColumnOutOfRange,
    /// I2C address does not fit in 7 bits
    AddressOutOfRange,
    /// The display has not been initialized
    NotInitialized,
    /// Formatting error
    FormattingError(core::fmt::Error),
}

impl<E> From<core::fmt::Error> for CharacterDisplayError<E> {
    fn from(err: core::fmt::Error) -> Self {
        CharacterDisplayError::FormattingError(err)
    }
}

impl<E> From<&CharacterDisplayError<E>> for &'static str {
    fn from(err: &CharacterDisplayError<E>) -> Self {
        match err {
            CharacterDisplayError::TransportInit(_) => "Transport init error",
            CharacterDisplayError::BusWrite(_) => "Bus write error",
            CharacterDisplayError::Delay(_) => "Delay error",
            CharacterDisplayError::LineOutOfRange => "Line out of range",
            CharacterDisplayError::ColumnOutOfRange => "Column out of range",
            CharacterDisplayError::AddressOutOfRange => "I2C address out of range",
            CharacterDisplayError::NotInitialized => "Display not initialized",
            CharacterDisplayError::FormattingError(_) => "Formatting error",
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for CharacterDisplayError<E> {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl<E> ufmt::uDisplay for CharacterDisplayError<E> {
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl<E> Display for CharacterDisplayError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

/// Backlight setting. The discriminant is the backpack bit that carries it.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[repr(u8)]
pub enum Backlight {
    Off = 0x00,
    #[default]
    On = 0x08,
}

impl Backlight {
    pub const fn is_on(self) -> bool {
        matches!(self, Backlight::On)
    }
}

impl From<bool> for Backlight {
    fn from(on: bool) -> Self {
        if on {
            Backlight::On
        } else {
            Backlight::Off
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Backlight {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Backlight::Off => defmt::write!(fmt, "Off"),
            Backlight::On => defmt::write!(fmt, "On"),
        }
    }
}

#[derive(Debug, PartialEq, Copy, Clone)]
struct Geometry {
    columns: u8,
    rows: u8,
}

/// HD44780 character display on a 4-bit I2C backpack.
pub struct CharacterDisplay<T>
where
    T: Transport,
{
    device: HD44780<T>,
    geometry: Option<Geometry>,
    options: DisplayOptions,
    display_control: u8,
}

impl<T> CharacterDisplay<T>
where
    T: Transport,
{
    /// Create a display with the default options. Nothing is sent until `init` is called.
    pub fn new(transport: T) -> Self {
        Self::new_with_options(transport, DisplayOptions::default())
    }

    pub fn new_with_options(transport: T, options: DisplayOptions) -> Self {
        Self {
            device: HD44780::new(transport),
            geometry: None,
            options,
            display_control: driver::hd44780::INITIAL_DISPLAY_CONTROL,
        }
    }

    /// Initialize the transport and the controller. This must be called before using the display.
    /// The address and geometry are fixed from here on; the backlight is turned on.
    pub fn init(
        &mut self,
        address: u8,
        columns: u8,
        rows: u8,
    ) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        if address > 0x7F {
            return Err(CharacterDisplayError::AddressOutOfRange);
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("Initializing {}x{} display at {=u8:#x}", columns, rows, address);
        self.geometry = None;
        self.display_control = driver::hd44780::INITIAL_DISPLAY_CONTROL;
        if let Err(e) = self.device.init(address) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Display init failed: {}", e);
            return Err(e);
        }
        self.geometry = Some(Geometry { columns, rows });
        Ok(self)
    }

    /// Same as `init`, taking the geometry from a display type.
    pub fn init_display_type(
        &mut self,
        address: u8,
        lcd_type: LcdDisplayType,
    ) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.init(address, lcd_type.cols(), lcd_type.rows())
    }

    fn geometry(&self) -> Result<Geometry, CharacterDisplayError<T::Error>> {
        self.geometry.ok_or(CharacterDisplayError::NotInitialized)
    }

    fn wrap_area(&self) -> Result<WrapArea, CharacterDisplayError<T::Error>> {
        let geometry = self.geometry()?;
        Ok(WrapArea::new(
            self.options.wrap_policy,
            geometry.columns,
            geometry.rows,
        ))
    }

    /// returns the I2C client address given to `init`
    pub fn address(&self) -> u8 {
        self.device.address()
    }

    /// returns the column count given to `init`, or 0 before initialization
    pub fn columns(&self) -> u8 {
        self.geometry.map_or(0, |g| g.columns)
    }

    /// returns the row count given to `init`, or 0 before initialization
    pub fn rows(&self) -> u8 {
        self.geometry.map_or(0, |g| g.rows)
    }

    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    pub fn backlight(&self) -> Backlight {
        self.device.backlight()
    }

    /// returns a reference to the transport. mostly needed for testing
    pub fn transport(&mut self) -> &mut T {
        self.device.transport()
    }

    /// Give back the transport. There is no bus traffic on release.
    pub fn release(self) -> T {
        self.device.release()
    }

    /// Writes a byte to the controller, either as a command or as character data. Normally users
    /// do not need to call this directly.
    pub fn write_byte(
        &mut self,
        value: u8,
        mode: WriteMode,
    ) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.geometry()?;
        self.device.write_byte(value, mode)?;
        Ok(self)
    }

    //----------------------------------------------------------------------------------------------
    // high level commands, for the user!
    //----------------------------------------------------------------------------------------------

    /// Set the backlight. Nothing is sent; the setting goes out with the next byte written.
    pub fn set_backlight(&mut self, backlight: Backlight) -> &mut Self {
        self.device.set_backlight(backlight);
        self
    }

    /// Move the cursor to the start of `line`. Lines 0 to 3 are accepted whatever the row count.
    pub fn set_line(&mut self, line: u8) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.geometry()?;
        self.device.set_line(line)?;
        Ok(self)
    }

    /// Set the cursor position at `column` on `line`. The column must lie within the wrap width.
    pub fn set_cursor(
        &mut self,
        column: u8,
        line: u8,
    ) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        let area = self.wrap_area()?;
        if column >= area.width {
            return Err(CharacterDisplayError::ColumnOutOfRange);
        }
        self.device.set_position(column, line)?;
        Ok(self)
    }

    /// Clear the display and return the cursor home.
    pub fn clear(&mut self) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.geometry()?;
        self.device.clear()?;
        Ok(self)
    }

    /// Set the cursor to the home position.
    pub fn home(&mut self) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.geometry()?;
        self.device.home()?;
        Ok(self)
    }

    /// Blank `line` across the wrap width and leave the cursor at its start.
    pub fn clear_line(&mut self, line: u8) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        let area = self.wrap_area()?;
        self.device.clear_line(line, area.width)?;
        Ok(self)
    }

    /// Set the display visibility.
    pub fn show_display(
        &mut self,
        show: bool,
    ) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.update_display_control(LCD_FLAG_DISPLAYON, show)
    }

    /// Set the cursor visibility.
    pub fn show_cursor(
        &mut self,
        show: bool,
    ) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.update_display_control(LCD_FLAG_CURSORON, show)
    }

    /// Set the cursor blinking.
    pub fn blink_cursor(
        &mut self,
        blink: bool,
    ) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.update_display_control(LCD_FLAG_BLINKON, blink)
    }

    fn update_display_control(
        &mut self,
        flag: u8,
        on: bool,
    ) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.geometry()?;
        let control = if on {
            self.display_control | flag
        } else {
            self.display_control & !flag
        };
        self.device.command(LCD_CMD_DISPLAYCONTROL | control)?;
        self.display_control = control;
        Ok(self)
    }

    /// Prints text starting at column 0 of `line`. See `print_bytes`.
    pub fn print(
        &mut self,
        text: &str,
        line: u8,
    ) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.print_bytes(text.as_bytes(), line)
    }

    /// Prints raw bytes starting at column 0 of `line`. Carriage returns are dropped, a newline
    /// moves to the next line unless the cursor is already at the start of one, and every other
    /// byte is written as a character code. A full line continues on the next one; a full last
    /// line continues on the first line after blanking it.
    pub fn print_bytes(
        &mut self,
        text: &[u8],
        line: u8,
    ) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.print_from(Cursor::line_start(line), text)?;
        Ok(self)
    }

    /// Prints raw bytes starting at `cursor` and returns where the next character would go.
    pub fn print_from(
        &mut self,
        cursor: Cursor,
        text: &[u8],
    ) -> Result<Cursor, CharacterDisplayError<T::Error>> {
        let area = self.wrap_area()?;
        self.set_cursor(cursor.column, cursor.line)?;

        let mut cursor = cursor;
        for &byte in text {
            match cursor.step(byte, area) {
                Step::Skip => {}
                Step::NewLine(line) => self.device.set_line(line)?,
                Step::Emit(character, wrap) => {
                    self.device.data(character)?;
                    match wrap {
                        Wrap::None => {}
                        Wrap::NextLine(line) => self.device.set_line(line)?,
                        Wrap::ClearTop => {
                            #[cfg(feature = "defmt")]
                            defmt::trace!("Last line full, wrapping to cleared line 0");
                            self.device.clear_line(0, area.width)?;
                        }
                    }
                    self.device.delay_us(self.options.char_delay_us)?;
                }
            }
        }
        Ok(cursor)
    }

    /// Returns a `core::fmt::Write` sink that prints from the start of `line` and continues
    /// where each write left off.
    pub fn writer(&mut self, line: u8) -> TextWriter<'_, T> {
        TextWriter {
            display: self,
            cursor: Cursor::line_start(line),
        }
    }
}

/// Text sink that carries its own cursor between writes.
pub struct TextWriter<'a, T>
where
    T: Transport,
{
    display: &'a mut CharacterDisplay<T>,
    cursor: Cursor,
}

impl<T> TextWriter<'_, T>
where
    T: Transport,
{
    /// Where the next character will be printed.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn print(&mut self, text: &str) -> Result<&mut Self, CharacterDisplayError<T::Error>> {
        self.cursor = self.display.print_from(self.cursor, text.as_bytes())?;
        Ok(self)
    }
}

/// `core::fmt::Write` for the text writer, so it works with the `write!` macro.
impl<T> core::fmt::Write for TextWriter<'_, T>
where
    T: Transport,
{
    fn write_str(&mut self, s: &str) -> Result<(), core::fmt::Error> {
        if let Err(_e) = self.print(s) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Write to display failed: {}", _e);
            return Err(core::fmt::Error);
        }
        Ok(())
    }
}

#[cfg(feature = "ufmt")]
/// `ufmt::uWrite` for the text writer, so it works with the `uwrite!` and `uwriteln!` macros.
impl<T> ufmt::uWrite for TextWriter<'_, T>
where
    T: Transport,
{
    fn write_str(&mut self, s: &str) -> Result<(), CharacterDisplayError<T::Error>> {
        self.print(s)?;
        Ok(())
    }

    type Error = CharacterDisplayError<T::Error>;
}
