//! EMC2101 register model
//!
//! Register addresses, bit layouts and the value encodings the fan
//! controller uses. Nothing in here touches the bus.

use tickbus_core::traits::DutyCycle;

/// Product ID of the EMC2101
pub const CHIP_ID_EMC2101: u8 = 0x16;

/// Product ID of the EMC2101-R
pub const CHIP_ID_EMC2101R: u8 = 0x28;

/// Tachometer count to RPM numerator (two pulses per revolution, 90 kHz tach clock)
pub const TACH_RPM_NUMERATOR: u32 = 5_400_000;

/// Highest fan setting value (6-bit)
pub const DUTY_STEPS: u8 = 63;

/// PWM_FREQ value giving the finest duty resolution
pub const PWM_FREQ_MAX_RESOLUTION: u8 = 0x1F;

/// DATA_RATE value for the slowest conversion rate (1/16 Hz)
pub const DATA_RATE_SLOWEST: u8 = 0x00;

/// FAN_SPINUP value with spin-up drive and time disabled
pub const SPINUP_DISABLED: u8 = 0x00;

/// EMC2101 registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Internal diode temperature (signed °C)
    InternalTemp = 0x00,
    /// Status flags
    Status = 0x02,
    /// Configuration
    Config = 0x03,
    /// Temperature conversion rate
    DataRate = 0x04,
    /// Tachometer reading, low byte
    TachLsb = 0x46,
    /// Tachometer reading, high byte
    TachMsb = 0x47,
    /// Fan configuration
    FanConfig = 0x4A,
    /// Fan spin-up behavior
    FanSpinup = 0x4B,
    /// Fan setting (6-bit duty cycle)
    FanSetting = 0x4C,
    /// PWM frequency
    PwmFreq = 0x4D,
    /// PWM frequency divisor
    PwmDiv = 0x4E,
    /// Product ID
    ChipId = 0xFD,
}

impl Register {
    /// Register address on the device
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// CONFIG register bits
pub mod config {
    /// ALERT/TACH pin is a tachometer input
    pub const TACH_ENABLE: u8 = 1 << 2;
    /// Fan drive is the DAC (voltage) output instead of PWM
    pub const DAC_MODE: u8 = 1 << 4;
    /// Standby: conversions and fan drive stop
    pub const STANDBY: u8 = 1 << 6;

    /// Bits cleared at initialization (PWM drive, not in standby)
    pub const INIT_CLEAR: u8 = DAC_MODE | STANDBY;
    /// Bits set at initialization
    pub const INIT_SET: u8 = TACH_ENABLE;
}

/// FAN_CONFIG register bits
pub mod fan_config {
    /// Tach reads 0xFFFF below the minimum speed instead of 0xFFFE
    pub const TACH_ALL_ONES: u8 = 1 << 0;
    /// PWM_FREQ/PWM_DIV override the base clock
    pub const CLK_OVERRIDE: u8 = 1 << 2;
    /// Base PWM clock is 1.4 kHz (360 kHz when clear)
    pub const CLK_SELECT: u8 = 1 << 3;
    /// Invert the fan setting (0x3F = off)
    pub const POLARITY_INVERT: u8 = 1 << 4;
    /// Fan setting is written by the host; lookup table disabled
    pub const MANUAL: u8 = 1 << 5;

    /// Bits cleared at initialization
    pub const INIT_CLEAR: u8 = CLK_OVERRIDE | POLARITY_INVERT;
    /// Bits set at initialization
    pub const INIT_SET: u8 = TACH_ALL_ONES | CLK_SELECT | MANUAL;
}

/// STATUS register bits
pub mod status {
    /// Tachometer count exceeded the TACH limit
    pub const TACH: u8 = 1 << 0;
    /// External diode over TCRIT limit
    pub const TCRIT: u8 = 1 << 1;
    /// External diode fault (open or short)
    pub const DIODE_FAULT: u8 = 1 << 2;
    /// External diode below low limit
    pub const EXT_LOW: u8 = 1 << 3;
    /// External diode above high limit
    pub const EXT_HIGH: u8 = 1 << 4;
    /// Internal diode above high limit
    pub const INT_HIGH: u8 = 1 << 6;
    /// ADC conversion in progress
    pub const BUSY: u8 = 1 << 7;
}

/// Detected part, from the product ID register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipIdentity {
    /// EMC2101 (0x16)
    Emc2101,
    /// EMC2101-R (0x28)
    Emc2101R,
    /// Anything else; likely a wiring or address problem
    Unknown(u8),
}

impl ChipIdentity {
    /// Decode the product ID byte
    pub fn from_byte(id: u8) -> Self {
        match id {
            CHIP_ID_EMC2101 => ChipIdentity::Emc2101,
            CHIP_ID_EMC2101R => ChipIdentity::Emc2101R,
            other => ChipIdentity::Unknown(other),
        }
    }

    /// Raw product ID byte
    pub fn byte(&self) -> u8 {
        match self {
            ChipIdentity::Emc2101 => CHIP_ID_EMC2101,
            ChipIdentity::Emc2101R => CHIP_ID_EMC2101R,
            ChipIdentity::Unknown(id) => *id,
        }
    }

    /// Check if the ID matches a supported part
    pub fn is_expected(&self) -> bool {
        !matches!(self, ChipIdentity::Unknown(_))
    }
}

/// Raw tachometer reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TachReading {
    raw: u16,
}

impl TachReading {
    /// Wrap a raw 16-bit count
    pub const fn new(raw: u16) -> Self {
        Self { raw }
    }

    /// Compose from the TACH_LSB and TACH_MSB bytes
    pub const fn from_bytes(lsb: u8, msb: u8) -> Self {
        Self::new(((msb as u16) << 8) | lsb as u16)
    }

    /// Raw count
    pub fn raw(&self) -> u16 {
        self.raw
    }

    /// Check if the count is a stalled/unreadable sentinel
    pub fn is_stalled(&self) -> bool {
        self.raw == 0 || self.raw == 0xFFFF
    }

    /// Fan speed in RPM (0 when stalled)
    pub fn rpm(&self) -> u32 {
        if self.is_stalled() {
            0
        } else {
            TACH_RPM_NUMERATOR / self.raw as u32
        }
    }
}

/// Decoded STATUS register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(pub u8);

impl Status {
    /// Check if the tachometer limit tripped (fan too slow)
    pub fn tach_limit(&self) -> bool {
        self.0 & status::TACH != 0
    }

    /// Check if the external diode is faulty
    pub fn diode_fault(&self) -> bool {
        self.0 & status::DIODE_FAULT != 0
    }

    /// Check if any temperature limit tripped
    pub fn over_temperature(&self) -> bool {
        self.0 & (status::TCRIT | status::EXT_HIGH | status::INT_HIGH) != 0
    }

    /// Check if a conversion is in progress
    pub fn is_busy(&self) -> bool {
        self.0 & status::BUSY != 0
    }
}

/// Encode a duty cycle as a FAN_SETTING value
pub fn duty_to_register(duty: DutyCycle) -> u8 {
    duty.to_steps(DUTY_STEPS)
}

/// Decode a FAN_SETTING value (lossy)
pub fn register_to_duty(value: u8) -> DutyCycle {
    DutyCycle::from_steps(value & DUTY_STEPS, DUTY_STEPS)
}
