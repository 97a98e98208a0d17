// HD44780 4-bit protocol over a PCF8574 style backpack.
// Every controller byte is split into two nibbles. Each nibble goes out as three single byte
// bus writes: the data byte, the same byte with EN high, and the same byte with EN low again.
// The controller latches on the falling edge of EN. The backlight bit rides along on every
// byte and is sampled from the current setting at the moment the byte is sent.

use crate::{
    bit_configurations::{BackpackBits, RS_BIT},
    config::{
        CLEAR_CELL_DELAY_US, CLEAR_DELAY_US, HANDSHAKE_DELAY_US, HANDSHAKE_FIRST_DELAY_US,
        NIBBLE_SETTLE_US, POWER_ON_DELAY_US,
    },
    transport::Transport,
    Backlight, CharacterDisplayError, LCD_CMD_CLEARDISPLAY, LCD_CMD_DISPLAYCONTROL,
    LCD_CMD_ENTRYMODESET, LCD_CMD_FUNCTIONSET, LCD_CMD_RETURNHOME, LCD_CMD_SETDDRAMADDR,
    LCD_FLAG_2LINE, LCD_FLAG_4BITMODE, LCD_FLAG_5x8_DOTS, LCD_FLAG_BLINKON, LCD_FLAG_DISPLAYON,
    LCD_FLAG_ENTRYLEFT,
};

use super::layout::ADDRESSABLE_LINES;

/// DDRAM set-address commands for the start of each line of a 4 line module.
pub const LINE_ADDRESSES: [u8; ADDRESSABLE_LINES as usize] = [0x80, 0xC0, 0x94, 0xD4];

/// Glyph written into every cell when a line is blanked. It renders empty in the A00 ROM.
/// Sent as character data (RS set), not as a command byte, so the bus stream of a line clear
/// differs from drivers that push 0xFE through the command register.
pub const BLANK_CELL: u8 = 0xFE;

/// Mode argument for `write_byte`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WriteMode {
    Command,
    Data,
}

impl WriteMode {
    const fn bits(self) -> u8 {
        match self {
            WriteMode::Command => 0,
            WriteMode::Data => RS_BIT,
        }
    }
}

/// Display control flags issued by `init`.
pub const INITIAL_DISPLAY_CONTROL: u8 = LCD_FLAG_DISPLAYON | LCD_FLAG_BLINKON;

pub struct HD44780<T>
where
    T: Transport,
{
    transport: T,
    address: u8,
    backlight: Backlight,
}

impl<T> HD44780<T>
where
    T: Transport,
{
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            address: 0,
            backlight: Backlight::On,
        }
    }

    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn release(self) -> T {
        self.transport
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn backlight(&self) -> Backlight {
        self.backlight
    }

    /// Only the stored flag changes. The next bus byte carries it.
    pub fn set_backlight(&mut self, backlight: Backlight) {
        self.backlight = backlight;
    }

    pub fn delay_us(&mut self, us: u32) -> Result<(), CharacterDisplayError<T::Error>> {
        self.transport
            .delay_us(us)
            .map_err(CharacterDisplayError::Delay)
    }

    fn write_bus(&mut self, bits: BackpackBits) -> Result<(), CharacterDisplayError<T::Error>> {
        self.transport
            .write(self.address, bits.bits())
            .map_err(CharacterDisplayError::BusWrite)
    }

    /// Pulse EN around a byte that is already on the bus.
    fn strobe(&mut self, value: u8) -> Result<(), CharacterDisplayError<T::Error>> {
        let bits = BackpackBits::for_nibble(value, self.backlight.is_on());
        self.write_bus(bits.strobed())?;
        self.write_bus(bits.latched())
    }

    /// Send one nibble. `value` holds the nibble in its upper four bits and the RS setting in
    /// bit 0.
    pub fn write_nibble(&mut self, value: u8) -> Result<(), CharacterDisplayError<T::Error>> {
        let bits = BackpackBits::for_nibble(value, self.backlight.is_on());
        self.write_bus(bits)?;
        self.delay_us(NIBBLE_SETTLE_US)?;
        self.strobe(value)
    }

    /// Send a full byte as two nibbles, high nibble first.
    pub fn write_byte(
        &mut self,
        value: u8,
        mode: WriteMode,
    ) -> Result<(), CharacterDisplayError<T::Error>> {
        let mode = mode.bits();
        self.write_nibble(mode | (value & 0xF0))?;
        self.write_nibble(mode | ((value << 4) & 0xF0))
    }

    pub fn command(&mut self, command: u8) -> Result<(), CharacterDisplayError<T::Error>> {
        self.write_byte(command, WriteMode::Command)
    }

    pub fn data(&mut self, value: u8) -> Result<(), CharacterDisplayError<T::Error>> {
        self.write_byte(value, WriteMode::Data)
    }

    /// Bring up the transport and run the controller reset sequence. The controller may be in
    /// 8-bit mode or halfway through a 4-bit transfer when this starts, so three function-set
    /// nibbles force it into a known 8-bit state before it is switched to 4-bit mode.
    pub fn init(&mut self, address: u8) -> Result<(), CharacterDisplayError<T::Error>> {
        self.transport
            .init(address)
            .map_err(CharacterDisplayError::TransportInit)?;
        self.address = address;
        self.backlight = Backlight::On;

        self.delay_us(POWER_ON_DELAY_US)?;
        self.write_nibble(0x30)?;
        self.delay_us(HANDSHAKE_FIRST_DELAY_US)?;
        self.write_nibble(0x30)?;
        self.delay_us(HANDSHAKE_DELAY_US)?;
        self.write_nibble(0x30)?;
        self.delay_us(HANDSHAKE_DELAY_US)?;
        self.write_nibble(0x20)?;
        self.delay_us(HANDSHAKE_DELAY_US)?;

        self.command(
            LCD_CMD_FUNCTIONSET | LCD_FLAG_2LINE | LCD_FLAG_5x8_DOTS | LCD_FLAG_4BITMODE,
        )?;
        self.command(LCD_CMD_DISPLAYCONTROL | INITIAL_DISPLAY_CONTROL)?;
        self.command(LCD_CMD_CLEARDISPLAY)?;
        self.delay_us(CLEAR_DELAY_US)?;
        self.command(LCD_CMD_ENTRYMODESET | LCD_FLAG_ENTRYLEFT)
    }

    /// Move the controller's address counter to the start of `line`.
    pub fn set_line(&mut self, line: u8) -> Result<(), CharacterDisplayError<T::Error>> {
        let address = *LINE_ADDRESSES
            .get(line as usize)
            .ok_or(CharacterDisplayError::LineOutOfRange)?;
        self.command(address)
    }

    /// Move the controller's address counter to `column` on `line`. The column is not checked;
    /// the DDRAM address is kept to 7 bits so the command is always a set-address command.
    pub fn set_position(
        &mut self,
        column: u8,
        line: u8,
    ) -> Result<(), CharacterDisplayError<T::Error>> {
        let offset = LINE_ADDRESSES
            .get(line as usize)
            .ok_or(CharacterDisplayError::LineOutOfRange)?
            & !LCD_CMD_SETDDRAMADDR;
        self.command(LCD_CMD_SETDDRAMADDR | (offset.wrapping_add(column) & 0x7F))
    }

    /// Overwrite the first `width` cells of `line` with blanks and return to its start.
    pub fn clear_line(
        &mut self,
        line: u8,
        width: u8,
    ) -> Result<(), CharacterDisplayError<T::Error>> {
        self.set_line(line)?;
        for _ in 0..width {
            self.data(BLANK_CELL)?;
            self.delay_us(CLEAR_CELL_DELAY_US)?;
        }
        self.set_line(line)
    }

    pub fn clear(&mut self) -> Result<(), CharacterDisplayError<T::Error>> {
        self.command(LCD_CMD_CLEARDISPLAY)?;
        self.delay_us(CLEAR_DELAY_US)?;
        self.home()
    }

    pub fn home(&mut self) -> Result<(), CharacterDisplayError<T::Error>> {
        self.command(LCD_CMD_RETURNHOME)?;
        self.delay_us(CLEAR_DELAY_US)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use crate::transport::I2cTransport;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };
    use std::vec::Vec;

    /// The three bus bytes of one nibble transfer.
    fn nibble(address: u8, byte: u8) -> [I2cTransaction; 3] {
        [
            I2cTransaction::write(address, std::vec![byte]),
            I2cTransaction::write(address, std::vec![byte | 0b0000_0100]),
            I2cTransaction::write(address, std::vec![byte]),
        ]
    }

    fn driver(
        address: u8,
        expected: &[I2cTransaction],
    ) -> HD44780<I2cTransport<I2cMock, NoopDelay>> {
        let transport = I2cTransport::new(I2cMock::new(expected), NoopDelay::new());
        let mut driver = HD44780::new(transport);
        driver.address = address;
        driver
    }

    #[test]
    fn test_command_nibbles() {
        let i2c_address = 0x27_u8;
        // 0x28 with backlight on
        let expected: Vec<I2cTransaction> = [
            nibble(i2c_address, 0b0010_1000),
            nibble(i2c_address, 0b1000_1000),
        ]
        .concat();
        let mut driver = driver(i2c_address, &expected);

        assert!(driver.command(0x28).is_ok());
        driver.transport().i2c().done();
    }

    #[test]
    fn test_data_nibbles_carry_rs() {
        let i2c_address = 0x27_u8;
        // 'h' 0x68, backlight off
        let expected: Vec<I2cTransaction> = [
            nibble(i2c_address, 0b0110_0001),
            nibble(i2c_address, 0b1000_0001),
        ]
        .concat();
        let mut driver = driver(i2c_address, &expected);
        driver.set_backlight(Backlight::Off);

        assert!(driver.data(b'h').is_ok());
        driver.transport().i2c().done();
    }

    #[test]
    fn test_backlight_change_applies_to_next_byte_only() {
        let i2c_address = 0x27_u8;
        let expected: Vec<I2cTransaction> = [
            nibble(i2c_address, 0b0000_1000),
            nibble(i2c_address, 0b0001_1000),
            nibble(i2c_address, 0b0000_0000),
            nibble(i2c_address, 0b0010_0000),
        ]
        .concat();
        let mut driver = driver(i2c_address, &expected);

        assert!(driver.command(0x01).is_ok());
        driver.set_backlight(Backlight::Off);
        assert!(driver.command(0x02).is_ok());
        driver.transport().i2c().done();
    }

    #[test]
    fn test_set_line_addresses() {
        let i2c_address = 0x27_u8;
        let expected: Vec<I2cTransaction> = [
            nibble(i2c_address, 0b1000_1000), // 0x80
            nibble(i2c_address, 0b0000_1000),
            nibble(i2c_address, 0b1100_1000), // 0xC0
            nibble(i2c_address, 0b0000_1000),
            nibble(i2c_address, 0b1001_1000), // 0x94
            nibble(i2c_address, 0b0100_1000),
            nibble(i2c_address, 0b1101_1000), // 0xD4
            nibble(i2c_address, 0b0100_1000),
        ]
        .concat();
        let mut driver = driver(i2c_address, &expected);

        for line in 0..4 {
            assert!(driver.set_line(line).is_ok());
        }
        driver.transport().i2c().done();
    }

    #[test]
    fn test_set_line_out_of_range_writes_nothing() {
        let mut driver = driver(0x27, &[]);

        assert_eq!(driver.set_line(4), Err(CharacterDisplayError::LineOutOfRange));
        assert_eq!(driver.set_line(255), Err(CharacterDisplayError::LineOutOfRange));
        driver.transport().i2c().done();
    }

    #[test]
    fn test_set_position_adds_column() {
        let i2c_address = 0x27_u8;
        // line 2 column 5 -> 0x94 + 5 = 0x99
        let expected: Vec<I2cTransaction> = [
            nibble(i2c_address, 0b1001_1000),
            nibble(i2c_address, 0b1001_1000),
        ]
        .concat();
        let mut driver = driver(i2c_address, &expected);

        assert!(driver.set_position(5, 2).is_ok());
        driver.transport().i2c().done();
    }

    #[test]
    fn test_set_position_keeps_ddram_command() {
        let i2c_address = 0x27_u8;
        // line 3 column 200 -> offset 0x54 + 200 wraps to 0x1C, sent as 0x80 | 0x1C = 0x9C
        let expected: Vec<I2cTransaction> = [
            nibble(i2c_address, 0b1001_1000),
            nibble(i2c_address, 0b1100_1000),
        ]
        .concat();
        let mut driver = driver(i2c_address, &expected);

        assert!(driver.set_position(200, 3).is_ok());
        driver.transport().i2c().done();
    }
}
