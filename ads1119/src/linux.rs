//! Convenience constructor for Linux hosts (`/dev/i2c-*`).

use std::error::Error;
use std::path::Path;

use linux_embedded_hal::{Delay, I2cdev};
use tracing::info;

use crate::{Ads1119, Config};

/// ADS1119 on a Linux I2C character device.
pub type LinuxAds1119 = Ads1119<I2cdev, Delay>;

/// Open the I2C bus at `bus_path` and create a driver for the device at `address`.
///
/// # Examples
///
/// ```no_run
/// use ads1119::{linux, Config, DEFAULT_ADDRESS};
///
/// let mut adc = linux::open("/dev/i2c-1", DEFAULT_ADDRESS, Config::default())
///     .expect("Failed to open ADS1119");
/// let volts = adc.read_voltage().expect("Conversion failed");
/// println!("{volts:.4} V");
/// ```
pub fn open(
    bus_path: impl AsRef<Path>,
    address: u8,
    config: Config,
) -> Result<LinuxAds1119, Box<dyn Error>> {
    let bus_path = bus_path.as_ref();
    let i2c_bus = I2cdev::new(bus_path)?;
    info!("Opened ADS1119 at {address:#04x} on {}", bus_path.display());
    Ok(Ads1119::new(i2c_bus, Delay, address, config))
}
