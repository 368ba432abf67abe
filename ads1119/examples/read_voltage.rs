use std::env;

use ads1119::{linux, Config, DataRate, ErrorPolicy, InputMode, Mux, DEFAULT_ADDRESS};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::FmtSubscriber::new();
    tracing::subscriber::set_global_default(subscriber)?;

    let bus = env::var("ADS1119_I2C_BUS").unwrap_or_else(|_| "/dev/i2c-1".to_string());
    let address = match env::var("ADS1119_ADDRESS") {
        Ok(hex) => u8::from_str_radix(hex.trim_start_matches("0x"), 16)?,
        Err(_) => DEFAULT_ADDRESS,
    };

    let config = Config::default().with_data_rate(DataRate::Sps90);
    let mut adc = linux::open(&bus, address, config)?.with_error_policy(ErrorPolicy::Strict);
    adc.reset()?;

    let offset = adc.perform_offset_calibration(Mux::Shorted)?;
    info!("Offset: {offset:.6}");

    adc.set_input_mode(InputMode::SingleEnded);
    for channel in 0..4 {
        adc.select_channel(channel)?;
        let volts = adc.read_voltage()?;
        println!("AIN{channel}: {volts:.4} V");
    }

    adc.power_down()?;
    Ok(())
}
