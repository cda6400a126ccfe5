use embedded_hal::spi::{Error as _, SpiDevice};

use crate::{AnalogInput, DriverError};

const CHANNELS: u8 = 8;
const FULL_SCALE: u16 = 1023;

/// 8-channel, 10-bit SPI ADC.
pub struct Mcp3008<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Mcp3008<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Single-ended conversion on `channel` (0..=7).
    pub fn read_channel(&mut self, channel: u8) -> Result<u16, DriverError> {
        if channel >= CHANNELS {
            return Err(DriverError::InvalidChannel(channel));
        }

        // Start bit, then SGL/DIFF=1 and the channel in the high nibble.
        let write = [0x01, 0x80 | (channel << 4), 0x00];
        let mut read = [0u8; 3];

        self.spi
            .transfer(&mut read, &write)
            .map_err(|e| DriverError::Bus(format!("{:?}", e.kind())))?;

        Ok((u16::from(read[1] & 0x03) << 8) | u16::from(read[2]))
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> AnalogInput for Mcp3008<SPI> {
    fn read_raw(&mut self, channel: u8) -> Result<u16, DriverError> {
        self.read_channel(channel)
    }

    fn full_scale(&self) -> u16 {
        FULL_SCALE
    }
}

#[cfg(feature = "rpi")]
pub fn open(path: &str) -> Result<Mcp3008<linux_embedded_hal::SpidevDevice>, DriverError> {
    use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};

    let mut spi = linux_embedded_hal::SpidevDevice::open(path)
        .map_err(|e| DriverError::Unavailable(format!("{path}: {e:?}")))?;

    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(1_350_000)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.0.configure(&options)?;

    Ok(Mcp3008::new(spi))
}
