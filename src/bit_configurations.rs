use bitfield::bitfield;

/// Register select bit. Set for character data, clear for commands.
pub const RS_BIT: u8 = 0b0000_0001;
/// Read/write bit. This driver only ever writes, so it stays clear.
pub const RW_BIT: u8 = 0b0000_0010;
/// Enable bit. The controller latches the data nibble on its falling edge.
pub const EN_BIT: u8 = 0b0000_0100;
/// Backlight bit.
pub const BACKLIGHT_BIT: u8 = 0b0000_1000;

// Pin layout of the PCF8574 based 4-bit LCD backpack
bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct BackpackBits(u8);
    impl Debug;
    pub rs, set_rs: 0;
    pub rw, set_rw: 1;
    pub enable, set_enable: 2;
    pub backlight, set_backlight: 3;
    pub u8, data, set_data: 7, 4;
}

impl BackpackBits {
    /// Bus byte for one nibble transfer. `value` carries the nibble in its upper four bits and
    /// may carry the RS bit in its lowest bit, as produced by the byte splitter.
    pub fn for_nibble(value: u8, backlight: bool) -> Self {
        let mut bits = BackpackBits(value & !(EN_BIT | RW_BIT | BACKLIGHT_BIT));
        bits.set_backlight(backlight);
        bits
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Same byte with the enable line driven high.
    pub fn strobed(mut self) -> Self {
        self.set_enable(true);
        self
    }

    /// Same byte with the enable line driven low.
    pub fn latched(mut self) -> Self {
        self.set_enable(false);
        self
    }
}
