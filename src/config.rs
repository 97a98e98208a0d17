use core::fmt::Display;

/// Wrap width the text printer assumes when `WrapPolicy::FixedWidth` is selected. Backpack
/// displays in the field are 20 columns wide, so this is independent of the configured columns.
pub const FIXED_WRAP_COLUMNS: u8 = 20;
/// Line after which `WrapPolicy::FixedWidth` wraps back to the top of the display.
pub const FIXED_LAST_LINE: u8 = 3;

/// Default pacing delay after every printed character, in microseconds.
pub const DEFAULT_CHAR_DELAY_US: u32 = 75_000;
/// Setup time after the data byte of a nibble is placed on the bus, before the enable strobe.
pub const NIBBLE_SETTLE_US: u32 = 100;
/// Delay after every blank cell written while clearing a line.
pub const CLEAR_CELL_DELAY_US: u32 = 1_000;
/// Wait for the controller's supply to settle before the cold-start handshake.
pub const POWER_ON_DELAY_US: u32 = 50_000;
/// Wait after the first `0x3` function-set nibble of the handshake.
pub const HANDSHAKE_FIRST_DELAY_US: u32 = 4_500;
/// Wait after each of the remaining handshake nibbles.
pub const HANDSHAKE_DELAY_US: u32 = 150;
/// Execution time of the clear-display and return-home commands.
pub const CLEAR_DELAY_US: u32 = 2_000;

/// How the text printer decides where a line ends.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum WrapPolicy {
    /// Wrap after `FIXED_WRAP_COLUMNS` characters and roll over after `FIXED_LAST_LINE`,
    /// whatever geometry was passed to `init`.
    #[default]
    FixedWidth,
    /// Wrap after the configured column count and roll over after the last configured row.
    /// This changes printing on displays that are not 20x4.
    DisplayGeometry,
}

/// Tunables of the display driver that are not part of the controller geometry.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DisplayOptions {
    pub(crate) char_delay_us: u32,
    pub(crate) wrap_policy: WrapPolicy,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            char_delay_us: DEFAULT_CHAR_DELAY_US,
            wrap_policy: WrapPolicy::FixedWidth,
        }
    }
}

impl DisplayOptions {
    /// Delay issued after each printed character.
    pub fn with_char_delay_us(mut self, us: u32) -> Self {
        self.char_delay_us = us;
        self
    }

    pub fn with_wrap_policy(mut self, policy: WrapPolicy) -> Self {
        self.wrap_policy = policy;
        self
    }

    pub fn char_delay_us(&self) -> u32 {
        self.char_delay_us
    }

    pub fn wrap_policy(&self) -> WrapPolicy {
        self.wrap_policy
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Common display sizes. Used by `CharacterDisplay::init_display_type` in place of explicit
/// column and row counts.
pub enum LcdDisplayType {
    /// 20x4 display
    Lcd20x4,
    /// 20x2 display
    Lcd20x2,
    /// 16x2 display
    Lcd16x2,
    /// 16x4 display
    Lcd16x4,
}

impl From<&LcdDisplayType> for &'static str {
    fn from(display_type: &LcdDisplayType) -> Self {
        match display_type {
            LcdDisplayType::Lcd20x4 => "20x4",
            LcdDisplayType::Lcd20x2 => "20x2",
            LcdDisplayType::Lcd16x2 => "16x2",
            LcdDisplayType::Lcd16x4 => "16x4",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LcdDisplayType {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl ufmt::uDisplay for LcdDisplayType {
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl Display for LcdDisplayType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

impl LcdDisplayType {
    /// Get the number of rows for the display type
    pub const fn rows(&self) -> u8 {
        match self {
            LcdDisplayType::Lcd20x4 => 4,
            LcdDisplayType::Lcd20x2 => 2,
            LcdDisplayType::Lcd16x2 => 2,
            LcdDisplayType::Lcd16x4 => 4,
        }
    }

    /// Get the number of columns for the display type
    pub const fn cols(&self) -> u8 {
        match self {
            LcdDisplayType::Lcd20x4 => 20,
            LcdDisplayType::Lcd20x2 => 20,
            LcdDisplayType::Lcd16x2 => 16,
            LcdDisplayType::Lcd16x4 => 16,
        }
    }
}
