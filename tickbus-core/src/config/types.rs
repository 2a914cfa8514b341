//! Configuration type definitions
//!
//! These types describe the I2C peripherals attached to the host: fan
//! controllers, multiplexers, and how fans are exposed as PWM pins. The
//! host parses its config file into these; boards can also carry them as
//! postcard binary (see [`super::persist`]).

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::FaultClass;

/// Maximum device name length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum fan controllers per board
pub const MAX_FANS: usize = 4;

/// Maximum multiplexers per board
pub const MAX_MUXES: usize = 2;

/// Downstream channels on a TCA9548A
pub const MUX_CHANNELS: u8 = 8;

/// Fixed EMC2101 bus address
pub const EMC2101_DEFAULT_ADDRESS: u8 = 0x4C;

/// TCA9548A address with A0..A2 tied low
pub const TCA9548A_DEFAULT_ADDRESS: u8 = 0x70;

/// Device name as used in config section headers (`[emc2101 exhaust]`)
pub type DeviceName = String<MAX_LABEL_LEN>;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Device name longer than [`MAX_LABEL_LEN`]
    NameTooLong,
    /// Two devices share a name
    DuplicateName,
    /// Address is not a 7-bit I2C address
    InvalidAddress(u8),
    /// Multiplexer channel outside 0-7
    InvalidChannel(u8),
    /// Multiplexer channel already assigned to another device
    ChannelTaken(u8),
    /// Referenced multiplexer is not configured
    UnknownMux,
    /// Multiplexer placed behind another multiplexer
    NestedMux,
    /// Too many devices for the fixed-capacity tables
    TooManyDevices,
    /// Pull-up requested on an output without one
    PullupUnsupported,
    /// Inverted output requested
    InversionUnsupported,
    /// Software-timed PWM requested on a hardware-only output
    SoftwarePwmUnsupported,
    /// Automatic max-duration cutoff requested
    MaxDurationUnsupported,
    /// Numeric value outside its allowed range
    ValueOutOfRange,
    /// Binary encoding failed (buffer too small)
    Encode,
    /// Binary decoding failed
    Decode,
    /// Stored config was written by an incompatible version
    VersionMismatch,
}

impl ConfigError {
    /// Fault class of every configuration error
    pub fn class(&self) -> FaultClass {
        FaultClass::Configuration
    }
}

/// Build a device name, rejecting names that do not fit
pub fn device_name(name: &str) -> Result<DeviceName, ConfigError> {
    let mut out = DeviceName::new();
    out.push_str(name).map_err(|_| ConfigError::NameTooLong)?;
    Ok(out)
}

/// Placement of a device behind a multiplexer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MuxBinding {
    /// Name of the multiplexer
    pub mux: DeviceName,
    /// Downstream channel (0-7)
    pub channel: u8,
}

/// Bus placement of an I2C device
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct I2cDeviceConfig {
    /// 7-bit device address
    pub address: u8,
    /// Multiplexer channel the device sits behind (None = directly on the bus)
    pub mux: Option<MuxBinding>,
}

impl I2cDeviceConfig {
    /// Device directly on the bus at `address`
    pub fn new(address: u8) -> Self {
        Self {
            address,
            mux: None,
        }
    }

    /// Check the address and channel ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address > 0x7F {
            return Err(ConfigError::InvalidAddress(self.address));
        }
        if let Some(binding) = &self.mux {
            if binding.channel >= MUX_CHANNELS {
                return Err(ConfigError::InvalidChannel(binding.channel));
            }
        }
        Ok(())
    }
}

impl Default for I2cDeviceConfig {
    fn default() -> Self {
        Self::new(EMC2101_DEFAULT_ADDRESS)
    }
}

/// Generic PWM pin request, as the host would make it for any output pin
///
/// Whether each feature is supported is up to the pin implementation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PwmPinConfig {
    /// Pull-up request (0 = none, 1 = pull-up, -1 = pull-down)
    pub pullup: i8,
    /// Output is active-low
    pub invert: bool,
    /// Period must be generated by hardware
    pub hardware_pwm: bool,
    /// PWM period in seconds
    pub cycle_time: f32,
    /// Cutoff after this many seconds without an update (0 = none)
    pub max_duration: f32,
    /// Duty cycle applied once the host is ready
    pub start_value: f32,
    /// Duty cycle applied on shutdown
    pub shutdown_value: f32,
}

impl Default for PwmPinConfig {
    fn default() -> Self {
        Self {
            pullup: 0,
            invert: false,
            hardware_pwm: true,
            cycle_time: 0.010,
            max_duration: 0.0,
            start_value: 0.0,
            shutdown_value: 0.0,
        }
    }
}

/// EMC2101 fan controller configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Emc2101Config {
    /// Device name
    pub name: DeviceName,
    /// Bus placement
    pub i2c: I2cDeviceConfig,
    /// PWM pin the fan is exposed as
    pub pwm: PwmPinConfig,
}

impl Default for Emc2101Config {
    fn default() -> Self {
        Self {
            name: DeviceName::new(),
            i2c: I2cDeviceConfig::new(EMC2101_DEFAULT_ADDRESS),
            pwm: PwmPinConfig::default(),
        }
    }
}

/// TCA9548A multiplexer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Tca9548aConfig {
    /// Device name
    pub name: DeviceName,
    /// Bus placement
    pub i2c: I2cDeviceConfig,
}

impl Default for Tca9548aConfig {
    fn default() -> Self {
        Self {
            name: DeviceName::new(),
            i2c: I2cDeviceConfig::new(TCA9548A_DEFAULT_ADDRESS),
        }
    }
}

/// Current configuration version
pub const CONFIG_VERSION: u8 = 1;

/// All I2C peripherals on a board
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BoardConfig {
    /// Configuration version for compatibility checks
    pub version: u8,
    /// Multiplexers
    pub muxes: Vec<Tca9548aConfig, MAX_MUXES>,
    /// Fan controllers
    pub fans: Vec<Emc2101Config, MAX_FANS>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            muxes: Vec::new(),
            fans: Vec::new(),
        }
    }
}

impl BoardConfig {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a fan controller by name
    pub fn find_fan(&self, name: &str) -> Option<&Emc2101Config> {
        self.fans.iter().find(|f| f.name.as_str() == name)
    }

    /// Find a multiplexer by name
    pub fn find_mux(&self, name: &str) -> Option<&Tca9548aConfig> {
        self.muxes.iter().find(|m| m.name.as_str() == name)
    }

    /// Fans placed behind the named multiplexer, with their channels
    pub fn fans_behind<'a>(
        &'a self,
        mux: &'a str,
    ) -> impl Iterator<Item = (&'a Emc2101Config, u8)> + 'a {
        self.fans.iter().filter_map(move |fan| match &fan.i2c.mux {
            Some(binding) if binding.mux.as_str() == mux => Some((fan, binding.channel)),
            _ => None,
        })
    }

    /// Check cross-device consistency
    ///
    /// Device-specific feature support (PWM pin options) is checked by the
    /// drivers when the devices are built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = self
            .muxes
            .iter()
            .map(|m| &m.name)
            .chain(self.fans.iter().map(|f| &f.name));
        for (i, name) in names.clone().enumerate() {
            if names.clone().skip(i + 1).any(|other| other == name) {
                return Err(ConfigError::DuplicateName);
            }
        }

        for mux in &self.muxes {
            mux.i2c.validate()?;
            if mux.i2c.mux.is_some() {
                return Err(ConfigError::NestedMux);
            }
        }

        for (i, fan) in self.fans.iter().enumerate() {
            fan.i2c.validate()?;
            let Some(binding) = &fan.i2c.mux else {
                continue;
            };
            if self.find_mux(&binding.mux).is_none() {
                return Err(ConfigError::UnknownMux);
            }
            let taken = self.fans[..i].iter().any(|other| other.i2c.mux.as_ref() == Some(binding));
            if taken {
                return Err(ConfigError::ChannelTaken(binding.channel));
            }
        }

        Ok(())
    }
}
