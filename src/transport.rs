use embedded_hal::{delay::DelayNs, i2c};

/// Board specific bus access used by the display driver. The implementing value is the device
/// context: the driver never looks inside it, it only calls these three operations in order.
///
/// Implementations are expected to block until the bus cycle or delay has completed, and to
/// deliver writes to the backpack in call order.
pub trait Transport {
    /// Error reported by the board for a failed bus operation.
    type Error;

    /// Prepare the bus for talking to the client at `address`.
    fn init(&mut self, address: u8) -> Result<(), Self::Error>;

    /// Write a single byte to the client at `address`.
    fn write(&mut self, address: u8, byte: u8) -> Result<(), Self::Error>;

    /// Block for at least `us` microseconds.
    fn delay_us(&mut self, us: u32) -> Result<(), Self::Error>;
}

impl<T> Transport for &mut T
where
    T: Transport + ?Sized,
{
    type Error = T::Error;

    fn init(&mut self, address: u8) -> Result<(), Self::Error> {
        (**self).init(address)
    }

    fn write(&mut self, address: u8, byte: u8) -> Result<(), Self::Error> {
        (**self).write(address, byte)
    }

    fn delay_us(&mut self, us: u32) -> Result<(), Self::Error> {
        (**self).delay_us(us)
    }
}

/// `Transport` built from an `embedded-hal` I2C bus and delay provider.
pub struct I2cTransport<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    i2c: I2C,
    delay: DELAY,
}

impl<I2C, DELAY> I2cTransport<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    pub fn new(i2c: I2C, delay: DELAY) -> Self {
        Self { i2c, delay }
    }

    /// returns a reference to the I2C peripheral. mostly needed for testing
    pub fn i2c(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// returns a reference to the delay provider
    pub fn delay(&mut self) -> &mut DELAY {
        &mut self.delay
    }

    /// Give back the wrapped peripherals.
    pub fn release(self) -> (I2C, DELAY) {
        (self.i2c, self.delay)
    }
}

impl<I2C, DELAY> Transport for I2cTransport<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    type Error = I2C::Error;

    /// The PCF8574 needs no setup; the bus itself is brought up by the board.
    fn init(&mut self, _address: u8) -> Result<(), Self::Error> {
        Ok(())
    }

    fn write(&mut self, address: u8, byte: u8) -> Result<(), Self::Error> {
        self.i2c.write(address, &[byte])
    }

    fn delay_us(&mut self, us: u32) -> Result<(), Self::Error> {
        self.delay.delay_us(us);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };

    #[test]
    fn test_i2c_transport_writes_single_bytes() {
        let expected_transactions = [
            I2cTransaction::write(0x27, std::vec![0b1010_0101]),
            I2cTransaction::write(0x27, std::vec![0b0000_1000]),
        ];
        let i2c = I2cMock::new(&expected_transactions);
        let mut transport = I2cTransport::new(i2c, NoopDelay::new());

        assert!(transport.init(0x27).is_ok());
        assert!(transport.write(0x27, 0b1010_0101).is_ok());
        assert!(transport.delay_us(100).is_ok());
        assert!(transport.write(0x27, 0b0000_1000).is_ok());

        transport.i2c().done();
    }

    #[test]
    fn test_mut_reference_is_a_transport() {
        let expected_transactions = [I2cTransaction::write(0x3F, std::vec![0x42])];
        let i2c = I2cMock::new(&expected_transactions);
        let mut transport = I2cTransport::new(i2c, NoopDelay::new());

        {
            let mut borrowed = &mut transport;
            assert!(Transport::write(&mut borrowed, 0x3F, 0x42).is_ok());
        }

        let (mut i2c, _delay) = transport.release();
        i2c.done();
    }
}
