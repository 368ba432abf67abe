//! Configuration register fields and their bit encodings.
//!
//! The ADS1119 has a single 8-bit configuration register:
//!
//! | Bits  | Field             |
//! | :---  | :---              |
//! | 7:5   | [`Mux`]           |
//! | 4     | [`Gain`]          |
//! | 3:2   | [`DataRate`]      |
//! | 1     | [`ConversionMode`]|
//! | 0     | [`VoltageReference`] |

/// Internal reference voltage in volts.
pub const INTERNAL_REFERENCE_VOLTAGE: f32 = 2.048;

/// Code span of the positive half of the 16-bit output.
pub const FULL_SCALE_RANGE: f32 = 32768.0;

/// Input multiplexer selection (positive input vs negative input).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mux {
    Ain0Ain1 = 0b000,
    Ain2Ain3 = 0b001,
    Ain1Ain2 = 0b010,
    Ain0Agnd = 0b011,
    Ain1Agnd = 0b100,
    Ain2Agnd = 0b101,
    Ain3Agnd = 0b110,
    /// Both inputs shorted to AVDD / 2, used for offset calibration.
    Shorted = 0b111,
}

/// How channel indices passed to [`crate::Ads1119::select_channel`] are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    SingleEnded,
    Differential,
}

/// PGA gain settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gain {
    #[default]
    G1 = 0b0,
    G4 = 0b1,
}

/// Conversion speed in samples per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataRate {
    #[default]
    Sps20 = 0b00,
    Sps90 = 0b01,
    Sps330 = 0b10,
    Sps1000 = 0b11,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConversionMode {
    #[default]
    SingleShot = 0b0,
    Continuous = 0b1,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoltageReference {
    /// Internal 2.048 V reference.
    #[default]
    Internal = 0b0,
    /// External reference on REFP/REFN.
    External = 0b1,
}

impl Mux {
    const ALL: [Mux; 8] = [
        Mux::Ain0Ain1,
        Mux::Ain2Ain3,
        Mux::Ain1Ain2,
        Mux::Ain0Agnd,
        Mux::Ain1Agnd,
        Mux::Ain2Agnd,
        Mux::Ain3Agnd,
        Mux::Shorted,
    ];

    /// Map a channel index to an input pair for the given mode.
    ///
    /// Returns `None` for indices the mode does not have (4+ single-ended, 3+ differential).
    pub fn for_channel(mode: InputMode, channel: u8) -> Option<Self> {
        match (mode, channel) {
            (InputMode::SingleEnded, 0) => Some(Mux::Ain0Agnd),
            (InputMode::SingleEnded, 1) => Some(Mux::Ain1Agnd),
            (InputMode::SingleEnded, 2) => Some(Mux::Ain2Agnd),
            (InputMode::SingleEnded, 3) => Some(Mux::Ain3Agnd),
            (InputMode::Differential, 0) => Some(Mux::Ain0Ain1),
            (InputMode::Differential, 1) => Some(Mux::Ain2Ain3),
            (InputMode::Differential, 2) => Some(Mux::Ain1Ain2),
            _ => None,
        }
    }

    /// Pair used when a channel index is out of range.
    pub fn default_for(mode: InputMode) -> Self {
        match mode {
            InputMode::SingleEnded => Mux::Ain0Agnd,
            InputMode::Differential => Mux::Ain0Ain1,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl Gain {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Multiplier applied when scaling a code to volts.
    pub fn factor(self) -> f32 {
        match self {
            Gain::G1 => 1.0,
            Gain::G4 => 4.0,
        }
    }
}

impl DataRate {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Time to wait for a conversion, in whole milliseconds.
    pub fn conversion_time_ms(self) -> u32 {
        match self {
            DataRate::Sps20 => 1000 / 20,
            DataRate::Sps90 => 1000 / 90,
            DataRate::Sps330 => 1000 / 330,
            DataRate::Sps1000 => 1,
        }
    }
}

impl ConversionMode {
    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl VoltageReference {
    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Mux {
    type Error = u8;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Mux::ALL.get(bits as usize).copied().ok_or(bits)
    }
}

impl TryFrom<u8> for Gain {
    type Error = u8;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            0b0 => Ok(Gain::G1),
            0b1 => Ok(Gain::G4),
            _ => Err(bits),
        }
    }
}

impl TryFrom<u8> for DataRate {
    type Error = u8;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            0b00 => Ok(DataRate::Sps20),
            0b01 => Ok(DataRate::Sps90),
            0b10 => Ok(DataRate::Sps330),
            0b11 => Ok(DataRate::Sps1000),
            _ => Err(bits),
        }
    }
}

impl TryFrom<u8> for ConversionMode {
    type Error = u8;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            0b0 => Ok(ConversionMode::SingleShot),
            0b1 => Ok(ConversionMode::Continuous),
            _ => Err(bits),
        }
    }
}

impl TryFrom<u8> for VoltageReference {
    type Error = u8;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            0b0 => Ok(VoltageReference::Internal),
            0b1 => Ok(VoltageReference::External),
            _ => Err(bits),
        }
    }
}

/// Device configuration, packed into the configuration register on every conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    pub mux: Mux,
    pub gain: Gain,
    pub data_rate: DataRate,
    pub conversion_mode: ConversionMode,
    pub voltage_reference: VoltageReference,
    /// Volts on REFP - REFN, used only with [`VoltageReference::External`].
    pub external_reference_voltage: f32,
}

impl Default for Config {
    /// Power-on register value (0x00).
    fn default() -> Self {
        Config {
            mux: Mux::Ain0Ain1,
            gain: Gain::default(),
            data_rate: DataRate::default(),
            conversion_mode: ConversionMode::default(),
            voltage_reference: VoltageReference::default(),
            external_reference_voltage: INTERNAL_REFERENCE_VOLTAGE,
        }
    }
}

impl Config {
    const MUX_SHIFT: u8 = 5;
    const GAIN_SHIFT: u8 = 4;
    const DR_SHIFT: u8 = 2;
    const CM_SHIFT: u8 = 1;
    const VREF_SHIFT: u8 = 0;

    const MUX_MASK: u8 = 0b111;
    const DR_MASK: u8 = 0b11;
    const BIT_MASK: u8 = 0b1;

    pub fn with_mux(mut self, mux: Mux) -> Self {
        self.mux = mux;
        self
    }

    pub fn with_gain(mut self, gain: Gain) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_data_rate(mut self, data_rate: DataRate) -> Self {
        self.data_rate = data_rate;
        self
    }

    pub fn with_conversion_mode(mut self, conversion_mode: ConversionMode) -> Self {
        self.conversion_mode = conversion_mode;
        self
    }

    /// Use the internal 2.048 V reference.
    pub fn with_internal_reference(mut self) -> Self {
        self.voltage_reference = VoltageReference::Internal;
        self
    }

    /// Use an external reference of `volts`.
    pub fn with_external_reference(mut self, volts: f32) -> Self {
        self.voltage_reference = VoltageReference::External;
        self.external_reference_voltage = volts;
        self
    }

    /// Pack the register fields into the configuration byte.
    pub fn to_byte(&self) -> u8 {
        (self.mux.bits() << Self::MUX_SHIFT)
            | (self.gain.bits() << Self::GAIN_SHIFT)
            | (self.data_rate.bits() << Self::DR_SHIFT)
            | (self.conversion_mode.bits() << Self::CM_SHIFT)
            | (self.voltage_reference.bits() << Self::VREF_SHIFT)
    }

    /// Decode a configuration byte. Every bit pattern is valid.
    ///
    /// `external_reference_voltage` is not stored on the device and is taken from the default.
    pub fn from_byte(byte: u8) -> Self {
        // All masked values are in range, the fallbacks are never taken.
        Config {
            mux: Mux::try_from((byte >> Self::MUX_SHIFT) & Self::MUX_MASK)
                .unwrap_or(Mux::Ain0Ain1),
            gain: Gain::try_from((byte >> Self::GAIN_SHIFT) & Self::BIT_MASK).unwrap_or_default(),
            data_rate: DataRate::try_from((byte >> Self::DR_SHIFT) & Self::DR_MASK)
                .unwrap_or_default(),
            conversion_mode: ConversionMode::try_from((byte >> Self::CM_SHIFT) & Self::BIT_MASK)
                .unwrap_or_default(),
            voltage_reference: VoltageReference::try_from(
                (byte >> Self::VREF_SHIFT) & Self::BIT_MASK,
            )
            .unwrap_or_default(),
            ..Config::default()
        }
    }

    /// Reference voltage used for scaling, in volts.
    pub fn reference_voltage(&self) -> f32 {
        match self.voltage_reference {
            VoltageReference::Internal => INTERNAL_REFERENCE_VOLTAGE,
            VoltageReference::External => self.external_reference_voltage,
        }
    }
}

/// Contents of the status register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    const DRDY: u8 = 0b1000_0000;

    /// A new conversion result is ready.
    pub fn data_ready(&self) -> bool {
        self.0 & Self::DRDY != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn default_packs_to_zero() {
        assert_eq!(Config::default().to_byte(), 0x00);
    }

    #[test]
    fn each_field_moves_only_its_bits() {
        let base = Config::default();
        assert_eq!(base.with_mux(Mux::Shorted).to_byte(), 0b1110_0000);
        assert_eq!(base.with_mux(Mux::Ain0Agnd).to_byte(), 0b0110_0000);
        assert_eq!(base.with_gain(Gain::G4).to_byte(), 0b0001_0000);
        assert_eq!(base.with_data_rate(DataRate::Sps90).to_byte(), 0b0000_0100);
        assert_eq!(base.with_data_rate(DataRate::Sps1000).to_byte(), 0b0000_1100);
        assert_eq!(
            base.with_conversion_mode(ConversionMode::Continuous).to_byte(),
            0b0000_0010
        );
        assert_eq!(base.with_external_reference(3.3).to_byte(), 0b0000_0001);
    }

    #[test]
    fn all_fields_combined() {
        let config = Config::default()
            .with_mux(Mux::Ain3Agnd)
            .with_gain(Gain::G4)
            .with_data_rate(DataRate::Sps330)
            .with_conversion_mode(ConversionMode::Continuous)
            .with_external_reference(2.5);
        assert_eq!(config.to_byte(), 0b1101_1011);
        assert_eq!(Config::from_byte(0b1101_1011).with_external_reference(2.5), config);
    }

    #[test]
    fn from_byte_keeps_default_external_voltage() {
        let config = Config::from_byte(0b0110_0001);
        assert_eq!(config.mux, Mux::Ain0Agnd);
        assert_eq!(config.voltage_reference, VoltageReference::External);
        assert_eq!(config.external_reference_voltage, INTERNAL_REFERENCE_VOLTAGE);
    }

    #[test]
    fn single_ended_channel_table() {
        let expected = [Mux::Ain0Agnd, Mux::Ain1Agnd, Mux::Ain2Agnd, Mux::Ain3Agnd];
        for (channel, mux) in expected.into_iter().enumerate() {
            assert_eq!(Mux::for_channel(InputMode::SingleEnded, channel as u8), Some(mux));
        }
        assert_eq!(Mux::for_channel(InputMode::SingleEnded, 4), None);
        assert_eq!(Mux::default_for(InputMode::SingleEnded), Mux::Ain0Agnd);
    }

    #[test]
    fn differential_channel_table() {
        let expected = [Mux::Ain0Ain1, Mux::Ain2Ain3, Mux::Ain1Ain2];
        for (channel, mux) in expected.into_iter().enumerate() {
            assert_eq!(Mux::for_channel(InputMode::Differential, channel as u8), Some(mux));
        }
        assert_eq!(Mux::for_channel(InputMode::Differential, 3), None);
        assert_eq!(Mux::default_for(InputMode::Differential), Mux::Ain0Ain1);
    }

    #[test]
    fn conversion_times() {
        assert_eq!(DataRate::Sps20.conversion_time_ms(), 50);
        assert_eq!(DataRate::Sps90.conversion_time_ms(), 11);
        assert_eq!(DataRate::Sps330.conversion_time_ms(), 3);
        assert_eq!(DataRate::Sps1000.conversion_time_ms(), 1);
    }

    #[test]
    fn reference_voltage_follows_selection() {
        assert_eq!(Config::default().reference_voltage(), 2.048);
        assert_eq!(Config::default().with_external_reference(3.3).reference_voltage(), 3.3);
    }

    #[test]
    fn status_data_ready_bit() {
        assert!(Status(0x80).data_ready());
        assert!(!Status(0x7F).data_ready());
    }

    #[test]
    fn mux_rejects_out_of_range_bits() {
        assert_eq!(Mux::try_from(0b111), Ok(Mux::Shorted));
        assert_eq!(Mux::try_from(8), Err(8));
    }
}
