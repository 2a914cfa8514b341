//! EMC2101 as a virtual PWM pin
//!
//! Lets the host treat a fan behind an EMC2101 like any other PWM output.
//! The chip generates its own PWM, so only hardware PWM is accepted, and
//! pull-ups, inversion and max-duration cutoffs are rejected at setup.

use tickbus_core::config::{ConfigError, PwmPinConfig};
use tickbus_core::state::LifecycleEvent;
use tickbus_core::traits::{LifecycleHooks, PwmPin};
use tickbus_hal::{ClockSource, ScheduledI2c, Tick};

use super::emc2101::{Emc2101, FanError};

/// PWM pin backed by an EMC2101
pub struct Emc2101Pwm<B, C> {
    fan: Emc2101<B>,
    clock: C,
    /// Requested period in seconds. Recorded only: the chip's PWM_FREQ
    /// is fixed at initialization.
    cycle_time: f32,
}

impl<B: ScheduledI2c, C: ClockSource> Emc2101Pwm<B, C> {
    /// Wrap a fan controller without running the setup sequence
    pub fn new(fan: Emc2101<B>, clock: C) -> Self {
        Self {
            fan,
            clock,
            cycle_time: PwmPinConfig::default().cycle_time,
        }
    }

    /// Wrap a fan controller and apply a pin request
    pub fn from_config(
        fan: Emc2101<B>,
        clock: C,
        config: &PwmPinConfig,
    ) -> Result<Self, ConfigError> {
        Self::check_pin(config)?;

        let mut pin = Self::new(fan, clock);
        pin.setup_max_duration(config.max_duration)?;
        pin.setup_cycle_time(config.cycle_time, config.hardware_pwm)?;
        pin.setup_start_value(config.start_value, config.shutdown_value);

        log_info!("emc2101 {}: configured as pwm pin", pin.fan.name());
        Ok(pin)
    }

    /// Reject pin options the EMC2101 output cannot provide
    pub fn check_pin(config: &PwmPinConfig) -> Result<(), ConfigError> {
        if config.pullup != 0 {
            return Err(ConfigError::PullupUnsupported);
        }
        if config.invert {
            return Err(ConfigError::InversionUnsupported);
        }
        Ok(())
    }

    /// Last accepted PWM period in seconds
    pub fn cycle_time(&self) -> f32 {
        self.cycle_time
    }

    /// Wrapped fan controller
    pub fn fan(&self) -> &Emc2101<B> {
        &self.fan
    }

    /// Wrapped fan controller, mutably
    pub fn fan_mut(&mut self) -> &mut Emc2101<B> {
        &mut self.fan
    }

    /// Unwrap the fan controller
    pub fn into_inner(self) -> Emc2101<B> {
        self.fan
    }
}

impl<B: ScheduledI2c, C: ClockSource> PwmPin for Emc2101Pwm<B, C> {
    type Error = FanError<B::Error>;

    fn setup_max_duration(&mut self, max_duration: f32) -> Result<(), ConfigError> {
        if max_duration != 0.0 {
            return Err(ConfigError::MaxDurationUnsupported);
        }
        Ok(())
    }

    fn setup_cycle_time(&mut self, cycle_time: f32, hardware_pwm: bool) -> Result<(), ConfigError> {
        if !hardware_pwm {
            return Err(ConfigError::SoftwarePwmUnsupported);
        }
        if cycle_time.is_nan() || cycle_time <= 0.0 {
            return Err(ConfigError::ValueOutOfRange);
        }
        self.cycle_time = cycle_time;
        Ok(())
    }

    fn setup_start_value(&mut self, start_value: f32, shutdown_value: f32) {
        self.fan.set_default_duty_cycles(start_value, shutdown_value);
    }

    fn set_pwm(&mut self, time: f64, value: f32) -> Result<(), Self::Error> {
        let clock = self.clock.to_clock_tick(time);
        self.fan.set_duty_cycle(clock, value)
    }
}

impl<B: ScheduledI2c, C> LifecycleHooks for Emc2101Pwm<B, C> {
    type Error = FanError<B::Error>;

    fn handle_event(&mut self, event: LifecycleEvent, clock: Tick) -> Result<(), Self::Error> {
        self.fan.handle_event(event, clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;
    use tickbus_core::config::{device_name, EMC2101_DEFAULT_ADDRESS};
    use tickbus_core::traits::DutyCycle;
    use tickbus_hal::mock::MockI2c;
    use tickbus_hal::{FixedRateClock, Window};

    fn fan() -> Emc2101<MockI2c> {
        Emc2101::new(MockI2c::new(), device_name("exhaust").unwrap())
    }

    fn clock() -> FixedRateClock {
        FixedRateClock::new(1_000)
    }

    #[test]
    fn test_from_config_defaults() {
        let pin = Emc2101Pwm::from_config(fan(), clock(), &PwmPinConfig::default()).unwrap();
        assert_eq!(pin.cycle_time(), 0.010);
    }

    #[test]
    fn test_rejects_unsupported_options() {
        let pin = PwmPinConfig::default;
        let cases = [
            (PwmPinConfig { pullup: 1, ..pin() }, ConfigError::PullupUnsupported),
            (PwmPinConfig { pullup: -1, ..pin() }, ConfigError::PullupUnsupported),
            (PwmPinConfig { invert: true, ..pin() }, ConfigError::InversionUnsupported),
            (PwmPinConfig { hardware_pwm: false, ..pin() }, ConfigError::SoftwarePwmUnsupported),
            (PwmPinConfig { max_duration: 2.0, ..pin() }, ConfigError::MaxDurationUnsupported),
            (PwmPinConfig { cycle_time: 0.0, ..pin() }, ConfigError::ValueOutOfRange),
        ];

        for (config, expected) in cases {
            let err = Emc2101Pwm::from_config(fan(), clock(), &config).err();
            assert_eq!(err, Some(expected));
            assert!(expected.class().is_setup_fault());
        }
    }

    #[test]
    fn test_cycle_time_is_recorded_only() {
        let mut pin = Emc2101Pwm::new(fan(), clock());

        pin.setup_cycle_time(0.040, true).unwrap();

        assert_eq!(pin.cycle_time(), 0.040);
        assert!(pin.fan().bus().ops().is_empty());
    }

    #[test]
    fn test_set_pwm_converts_time() {
        let mut pin = Emc2101Pwm::new(fan(), clock());

        pin.set_pwm(1.0, 0.5).unwrap();
        pin.set_pwm(2.5, 1.0).unwrap();

        let writes: Vec<_> = pin
            .fan()
            .bus()
            .writes_to(EMC2101_DEFAULT_ADDRESS)
            .map(|(data, window)| (data[1], window))
            .collect();
        assert_eq!(writes, [(32, Window::new(0, 1_000)), (63, Window::new(1_000, 2_500))]);
    }

    #[test]
    fn test_set_pwm_rejects_out_of_range() {
        let mut pin = Emc2101Pwm::new(fan(), clock());

        assert_eq!(pin.set_pwm(1.0, 1.5), Err(FanError::InvalidDutyCycle));
        assert!(pin.fan().bus().ops().is_empty());
    }

    #[test]
    fn test_start_values_reach_lifecycle() {
        let config = PwmPinConfig {
            start_value: 0.5,
            shutdown_value: 1.0,
            ..Default::default()
        };
        let mut pin = Emc2101Pwm::from_config(fan(), clock(), &config).unwrap();

        assert_eq!(
            pin.fan().default_duty_cycles(),
            (DutyCycle::clamped(0.5), DutyCycle::FULL)
        );

        pin.handle_event(LifecycleEvent::Shutdown, 5_000).unwrap();
        let (data, window) = pin.fan().bus().writes_to(EMC2101_DEFAULT_ADDRESS).last().unwrap();
        assert_eq!(data, [0x4C, 63]);
        assert_eq!(window, Window::new(0, 5_000));
    }
}
