//! ADS1119 ADC driver built on embedded-hal, with a Linux convenience constructor.
//!
//! Every read runs the full conversion sequence: write the configuration register (WREG),
//! START/SYNC, wait for the data rate's conversion time, RDATA, then read two bytes.
//!
//! Failures are handled according to an [`ErrorPolicy`]. The default, [`ErrorPolicy::Lenient`],
//! falls back to safe-looking values (a zero sample, the default channel) and logs a warning.
//! [`ErrorPolicy::Strict`] reports each condition as an [`Error`].

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

pub mod config;
#[cfg(feature = "linux")]
pub mod linux;

pub use config::{
    Config, ConversionMode, DataRate, Gain, InputMode, Mux, Status, VoltageReference,
    FULL_SCALE_RANGE, INTERNAL_REFERENCE_VOLTAGE,
};

/// Command bytes, datasheet section 8.5.3.
pub mod command {
    pub const POWERDOWN: u8 = 0x02;
    pub const RESET: u8 = 0x06;
    pub const START_SYNC: u8 = 0x08;
    pub const RDATA: u8 = 0x10;
    pub const RREG: u8 = 0x20;
    pub const WREG: u8 = 0x40;
}

/// Default 7-bit address with A0 and A1 tied to DGND.
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Samples averaged by [`Ads1119::perform_offset_calibration`].
pub const CALIBRATION_SAMPLES: u32 = 100;
const CALIBRATION_PACING_MS: u32 = 10;
const REGISTER_READ_DELAY_MS: u32 = 1;

/// Errors for the ADS1119 driver.
#[derive(Error, Debug)]
pub enum Error<E> {
    #[error("I2C bus error: {0:?}")]
    I2c(E),
    #[error("conversion data could not be read, device was reset: {0:?}")]
    ShortRead(E),
    #[error("channel {channel} does not exist in {mode:?} input mode")]
    InvalidChannel { channel: u8, mode: InputMode },
    #[error("Configuration read back from device does not match driver config: device {used:#04x}, stored {stored:#04x}")]
    ConfigMismatch { used: u8, stored: u8 },
}

/// How the driver reacts to bus failures and out-of-range input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Fall back to default values:
    /// * failed command writes during a conversion are ignored
    /// * a failed data read resets the device and yields a zero sample
    /// * unknown channel indices select channel 0
    /// * words above 0x7FFF are clamped to zero
    /// * a failed register read yields 0
    /// * calibration takes 101 readings and divides by 100
    #[default]
    Lenient,
    /// Report every failure, sign-extend negative words and average exactly 100 readings.
    Strict,
}

/// Registers readable with RREG.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    Configuration = 0b0,
    Status = 0b1,
}

/// ADS1119 driver struct.
pub struct Ads1119<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    config: Config,
    input_mode: InputMode,
    offset: f32,
    policy: ErrorPolicy,
}

impl<I2C, D, E> Ads1119<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
    E: Debug,
{
    /// Create a new ADC instance. No bus traffic happens until the first command.
    pub fn new(i2c: I2C, delay: D, address: u8, config: Config) -> Self {
        Ads1119 {
            i2c,
            delay,
            address,
            config,
            input_mode: InputMode::SingleEnded,
            offset: 0.0,
            policy: ErrorPolicy::default(),
        }
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Snapshot of the configuration used for the next conversion.
    pub fn config(&self) -> Config {
        self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    /// Choose how channel indices are mapped by [`Self::select_channel`].
    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.input_mode = mode;
    }

    /// Select an input by index for the current input mode.
    ///
    /// Single-ended has channels 0..=3 (AINx vs AGND), differential has 0..=2
    /// (AIN0-AIN1, AIN2-AIN3, AIN1-AIN2). Returns the mux that was applied.
    pub fn select_channel(&mut self, channel: u8) -> Result<Mux, Error<E>> {
        let mode = self.input_mode;
        let mux = match Mux::for_channel(mode, channel) {
            Some(mux) => mux,
            None if self.policy == ErrorPolicy::Strict => {
                return Err(Error::InvalidChannel { channel, mode });
            }
            None => {
                let fallback = Mux::default_for(mode);
                warn!("Channel {channel} not available in {mode:?} mode, using {fallback:?}");
                fallback
            }
        };
        self.config.mux = mux;
        debug!("Selected {mux:?}");
        Ok(mux)
    }

    /// Offset subtracted from every sample before it is returned.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Restore a previously measured offset.
    pub fn set_offset(&mut self, offset: f32) {
        self.offset = offset;
    }

    /// Gain multiplier used for voltage conversion.
    pub fn gain_factor(&self) -> f32 {
        self.config.gain.factor()
    }

    /// Reference voltage used for voltage conversion.
    pub fn reference_voltage(&self) -> f32 {
        self.config.reference_voltage()
    }

    /// Run a conversion and return the offset-corrected code.
    pub fn read_raw_value(&mut self) -> Result<f32, Error<E>> {
        let code = self.read_sample()?;
        Ok(code as f32 - self.offset)
    }

    /// Run a conversion and return the offset-corrected voltage.
    pub fn read_voltage(&mut self) -> Result<f32, Error<E>> {
        let value = self.read_raw_value()?;
        let voltage = self.reference_voltage() * (value / FULL_SCALE_RANGE) * self.gain_factor();
        Ok(voltage)
    }

    /// Measure the offset with the inputs set to `mux` and store it.
    ///
    /// Each reading contributes `reference - measured`. Readings are paced 10 ms apart and
    /// the call blocks for the whole run.
    pub fn perform_offset_calibration(&mut self, mux: Mux) -> Result<f32, Error<E>> {
        self.config.mux = mux;

        let readings = match self.policy {
            ErrorPolicy::Lenient => CALIBRATION_SAMPLES + 1,
            ErrorPolicy::Strict => CALIBRATION_SAMPLES,
        };
        let mut total_offset = 0.0;
        for _ in 0..readings {
            total_offset += self.reference_voltage() - self.read_voltage()?;
            self.delay.delay_ms(CALIBRATION_PACING_MS);
        }

        self.offset = total_offset / CALIBRATION_SAMPLES as f32;
        info!("Offset calibration on {mux:?} over {readings} readings: {}", self.offset);
        Ok(self.offset)
    }

    /// Send RESET. Reports whether the device acknowledged.
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.write_command(command::RESET)
    }

    /// Send POWERDOWN. Reports whether the device acknowledged.
    pub fn power_down(&mut self) -> Result<(), Error<E>> {
        self.write_command(command::POWERDOWN)
    }

    /// Read a register with RREG.
    ///
    /// With [`ErrorPolicy::Lenient`] a bus failure yields 0.
    pub fn read_register(&mut self, register: Register) -> Result<u8, Error<E>> {
        match (self.fetch_register(register), self.policy) {
            (Err(e), ErrorPolicy::Lenient) => {
                warn!("Reading {register:?} register failed, returning 0: {e}");
                Ok(0)
            }
            (result, _) => result,
        }
    }

    /// Read the configuration register back from the device.
    ///
    /// The external reference voltage is not stored on the device and is copied from the
    /// driver's configuration.
    pub fn read_configuration(&mut self) -> Result<Config, Error<E>> {
        let byte = self.fetch_register(Register::Configuration)?;
        Ok(Config {
            external_reference_voltage: self.config.external_reference_voltage,
            ..Config::from_byte(byte)
        })
    }

    /// Check the device's configuration register against the driver's configuration.
    pub fn verify_configuration(&mut self) -> Result<(), Error<E>> {
        let used = self.fetch_register(Register::Configuration)?;
        let stored = self.config.to_byte();
        if used != stored {
            return Err(Error::ConfigMismatch { used, stored });
        }
        Ok(())
    }

    pub fn read_status(&mut self) -> Result<Status, Error<E>> {
        self.fetch_register(Register::Status).map(Status)
    }

    /// Give back the I2C bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn write_command(&mut self, command: u8) -> Result<(), Error<E>> {
        debug!("Command {command:#04x} to {:#04x}", self.address);
        self.i2c.write(self.address, &[command]).map_err(Error::I2c)
    }

    fn write_config_register(&mut self, value: u8) -> Result<(), Error<E>> {
        debug!("WREG {value:#010b} to {:#04x}", self.address);
        self.i2c
            .write(self.address, &[command::WREG, value])
            .map_err(Error::I2c)
    }

    fn fetch_register(&mut self, register: Register) -> Result<u8, Error<E>> {
        // RREG is 0010 0rxx
        let request = command::RREG | ((register as u8) << 2);
        self.write_command(request)?;
        self.delay.delay_ms(REGISTER_READ_DELAY_MS);

        let mut buf = [0u8; 1];
        self.i2c.read(self.address, &mut buf).map_err(Error::I2c)?;
        trace!("{register:?} register = {:#010b}", buf[0]);
        Ok(buf[0])
    }

    /// Ignore a failed write under the lenient policy.
    fn tolerate(&self, result: Result<(), Error<E>>, step: &str) -> Result<(), Error<E>> {
        match (result, self.policy) {
            (Err(e), ErrorPolicy::Lenient) => {
                warn!("{step} failed, continuing conversion: {e}");
                Ok(())
            }
            (result, _) => result,
        }
    }

    /// Configure, start, wait, request and decode one conversion.
    fn read_sample(&mut self) -> Result<i32, Error<E>> {
        let conversion_time = self.config.data_rate.conversion_time_ms();
        let value = self.config.to_byte();

        let written = self.write_config_register(value);
        self.tolerate(written, "WREG")?;
        let started = self.write_command(command::START_SYNC);
        self.tolerate(started, "START/SYNC")?;

        self.delay.delay_ms(conversion_time);

        let requested = self.write_command(command::RDATA);
        self.tolerate(requested, "RDATA")?;

        let mut buf = [0u8; 2];
        if let Err(e) = self.i2c.read(self.address, &mut buf) {
            warn!("Conversion data unavailable, resetting device: {e:?}");
            if let Err(reset_error) = self.reset() {
                warn!("Reset after failed read also failed: {reset_error}");
            }
            return match self.policy {
                ErrorPolicy::Lenient => Ok(0),
                ErrorPolicy::Strict => Err(Error::ShortRead(e)),
            };
        }

        let code = match self.policy {
            ErrorPolicy::Lenient => {
                let word = u16::from_be_bytes(buf);
                if word > 0x7FFF {
                    debug!("Negative word {word:#06x} clamped to zero");
                    0
                } else {
                    i32::from(word)
                }
            }
            ErrorPolicy::Strict => i32::from(i16::from_be_bytes(buf)),
        };
        trace!("Sample {code} from {:?}", self.config.mux);
        Ok(code)
    }
}
