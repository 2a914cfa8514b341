//! EMC2101 fan controller
//!
//! Drives a 4-wire fan from the EMC2101's PWM output in manual mode and
//! reads back the tachometer. Duty-cycle writes form one ordered stream:
//! each is queued no earlier than the clock of the write before it.
//!
//! # Initialization
//!
//! ```text
//! read CHIP_ID        (log, never fatal)
//! CONFIG      &= ~(DAC | STANDBY), |= TACH_ENABLE
//! FAN_CONFIG  &= ~(CLK_OVR | INVERT), |= TACH_FFFF | CLK_1K4 | MANUAL
//! FAN_SPINUP   = 0x00
//! PWM_FREQ     = 0x1F
//! DATA_RATE    = 0x00
//! ```

use tickbus_core::config::{ConfigError, DeviceName, Emc2101Config, EMC2101_DEFAULT_ADDRESS};
use tickbus_core::scheduler::ClockScheduler;
use tickbus_core::state::LifecycleEvent;
use tickbus_core::traits::{DutyCycle, LifecycleHooks};
use tickbus_core::FaultClass;
use tickbus_hal::{ScheduledI2c, Tick, Window};

use super::registers::{
    self, config, fan_config, ChipIdentity, Register, Status, TachReading, DATA_RATE_SLOWEST,
    PWM_FREQ_MAX_RESOLUTION, SPINUP_DISABLED,
};

/// Fan controller errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FanError<E> {
    /// Transport failure, passed through unchanged
    Bus(E),
    /// Duty cycle outside `[0, 1]` (or NaN); nothing was written
    InvalidDutyCycle,
}

impl<E> FanError<E> {
    /// Fault class of the error
    pub fn class(&self) -> FaultClass {
        match self {
            FanError::Bus(_) => FaultClass::Transport,
            FanError::InvalidDutyCycle => FaultClass::ProtocolViolation,
        }
    }
}

/// Outcome of [`Emc2101::initialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitReport {
    /// Part reported by the product ID register
    pub identity: ChipIdentity,
}

impl InitReport {
    /// Check if the product ID was not a known EMC2101 variant
    pub fn has_anomaly(&self) -> bool {
        !self.identity.is_expected()
    }
}

/// EMC2101 driver
pub struct Emc2101<B> {
    bus: B,
    address: u8,
    name: DeviceName,
    scheduler: ClockScheduler,
    start_duty: DutyCycle,
    shutdown_duty: DutyCycle,
    identity: Option<ChipIdentity>,
}

impl<B: ScheduledI2c> Emc2101<B> {
    /// Create a driver at the fixed EMC2101 address
    pub fn new(bus: B, name: DeviceName) -> Self {
        Self::with_address(bus, name, EMC2101_DEFAULT_ADDRESS)
    }

    /// Create a driver at a custom address
    pub fn with_address(bus: B, name: DeviceName, address: u8) -> Self {
        Self {
            bus,
            address,
            name,
            scheduler: ClockScheduler::new(),
            start_duty: DutyCycle::OFF,
            shutdown_duty: DutyCycle::OFF,
            identity: None,
        }
    }

    /// Create a driver from its configuration section
    ///
    /// `bus` must already be the transport the device sits on (a
    /// multiplexed channel when the config names one).
    pub fn from_config(bus: B, config: &Emc2101Config) -> Result<Self, ConfigError> {
        config.i2c.validate()?;
        let mut fan = Self::with_address(bus, config.name.clone(), config.i2c.address);
        fan.set_default_duty_cycles(config.pwm.start_value, config.pwm.shutdown_value);
        Ok(fan)
    }

    /// Identify the part and put it in manual PWM mode
    ///
    /// An unexpected product ID is reported and logged but does not stop
    /// the sequence. Transport errors abort it.
    pub fn initialize(&mut self) -> Result<InitReport, FanError<B::Error>> {
        let identity = ChipIdentity::from_byte(self.read_register(Register::ChipId)?);
        self.identity = Some(identity);
        if identity.is_expected() {
            log_info!("emc2101 {}: chip id {=u8:#x}", self.name.as_str(), identity.byte());
        } else {
            log_error!(
                "emc2101 {}: unexpected chip id {=u8:#x}",
                self.name.as_str(),
                identity.byte()
            );
        }

        self.modify_register(Register::Config, config::INIT_CLEAR, config::INIT_SET)?;
        self.modify_register(Register::FanConfig, fan_config::INIT_CLEAR, fan_config::INIT_SET)?;
        self.write_register(Register::FanSpinup, SPINUP_DISABLED, Window::IMMEDIATE)?;
        self.write_register(Register::PwmFreq, PWM_FREQ_MAX_RESOLUTION, Window::IMMEDIATE)?;
        self.write_register(Register::DataRate, DATA_RATE_SLOWEST, Window::IMMEDIATE)?;

        Ok(InitReport { identity })
    }

    /// Queue a duty cycle change at `clock`
    ///
    /// Out-of-range values are rejected before anything is scheduled.
    pub fn set_duty_cycle(&mut self, clock: Tick, value: f32) -> Result<(), FanError<B::Error>> {
        let duty = DutyCycle::new(value).ok_or(FanError::InvalidDutyCycle)?;
        self.set_duty(clock, duty)
    }

    /// Queue an already validated duty cycle at `clock`
    pub fn set_duty(&mut self, clock: Tick, duty: DutyCycle) -> Result<(), FanError<B::Error>> {
        let window = self.scheduler.schedule(clock);
        self.write_register(Register::FanSetting, registers::duty_to_register(duty), window)
    }

    /// Read the fan speed
    ///
    /// The low byte is read first; the part latches the high byte on that read.
    pub fn get_rpm(&mut self) -> Result<TachReading, FanError<B::Error>> {
        let lsb = self.read_register(Register::TachLsb)?;
        let msb = self.read_register(Register::TachMsb)?;
        Ok(TachReading::from_bytes(lsb, msb))
    }

    /// Read the internal diode temperature in °C
    pub fn read_internal_temperature(&mut self) -> Result<i8, FanError<B::Error>> {
        Ok(self.read_register(Register::InternalTemp)? as i8)
    }

    /// Read the status flags
    pub fn read_status(&mut self) -> Result<Status, FanError<B::Error>> {
        Ok(Status(self.read_register(Register::Status)?))
    }

    /// Set the duty cycles applied on ready and on shutdown (clamped)
    pub fn set_default_duty_cycles(&mut self, start: f32, shutdown: f32) {
        self.start_duty = DutyCycle::clamped(start);
        self.shutdown_duty = DutyCycle::clamped(shutdown);
    }

    /// `(start, shutdown)` duty cycles
    pub fn default_duty_cycles(&self) -> (DutyCycle, DutyCycle) {
        (self.start_duty, self.shutdown_duty)
    }

    /// Clock of the last scheduled duty write (0 = none yet)
    pub fn last_scheduled_clock(&self) -> Tick {
        self.scheduler.last_clock()
    }

    /// Identity read by the last [`Emc2101::initialize`]
    pub fn identity(&self) -> Option<ChipIdentity> {
        self.identity
    }

    /// Configured device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 7-bit bus address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Underlying transport
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Underlying transport, mutably
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the transport
    pub fn release(self) -> B {
        self.bus
    }

    fn read_register(&mut self, register: Register) -> Result<u8, FanError<B::Error>> {
        let mut buf = [0u8];
        self.bus
            .read(self.address, register.addr(), &mut buf)
            .map_err(FanError::Bus)?;
        Ok(buf[0])
    }

    fn write_register(
        &mut self,
        register: Register,
        value: u8,
        window: Window,
    ) -> Result<(), FanError<B::Error>> {
        self.bus
            .write(self.address, &[register.addr(), value], window)
            .map_err(FanError::Bus)
    }

    fn modify_register(
        &mut self,
        register: Register,
        clear: u8,
        set: u8,
    ) -> Result<u8, FanError<B::Error>> {
        self.bus
            .modify_bits(self.address, register.addr(), clear, set, Window::IMMEDIATE)
            .map_err(FanError::Bus)
    }
}

impl<B: ScheduledI2c> LifecycleHooks for Emc2101<B> {
    type Error = FanError<B::Error>;

    fn handle_event(&mut self, event: LifecycleEvent, clock: Tick) -> Result<(), Self::Error> {
        let duty = match event {
            LifecycleEvent::Ready => self.start_duty,
            LifecycleEvent::Shutdown => self.shutdown_duty,
        };
        self.set_duty(clock, duty)
    }
}
