//! Async implementation of the DS3231 driver.
//!
//! This module provides an async interface to the DS3231 RTC device using
//! `embedded-hal-async` traits. It is only available when the `async` feature
//! is enabled. Every operation issues the same bus transactions as the
//! blocking [`crate::DS3231`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3231_rtc::asynch::DS3231;
//!
//! let mut rtc = DS3231::with_default_address(i2c);
//! rtc.configure(&config).await?;
//!
//! let now = rtc.time().await?;
//! let (alarm1, alarm2) = rtc.alarm_flags(true).await?;
//! ```

use chrono::NaiveDateTime;
use embedded_hal_async::i2c::I2c;
use paste::paste;

use crate::{
    datetime::{convert_hours, decode_hours, DS3231DateTime},
    decode_aging_offset, decode_alarm, decode_temperature, AgingOffset, AlarmRegisters, AlarmTime,
    AlarmUnit, CalendarTime, Config, Control, DS3231DateTimeError, DS3231Error, Hours, MatchMode,
    RegAddr, Status, TimeRepresentation, DEFAULT_ADDRESS,
};

/// DS3231 Real-Time Clock async driver.
pub struct DS3231<I2C: I2c> {
    i2c: I2C,
    address: u8,
    time_representation: TimeRepresentation,
}

impl<I2C: I2c> DS3231<I2C> {
    /// Creates a new DS3231 async driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The async I2C bus implementation
    /// * `address` - The I2C address of the device (typically 0x68)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            time_representation: TimeRepresentation::TwentyFourHour,
        }
    }

    /// Creates a new driver at [`DEFAULT_ADDRESS`].
    pub fn with_default_address(i2c: I2C) -> Self {
        Self::new(i2c, DEFAULT_ADDRESS)
    }

    /// Releases the I2C bus.
    pub fn free(self) -> I2C {
        self.i2c
    }

    /// Configures the device according to the provided configuration.
    ///
    /// # Arguments
    /// * `config` - The configuration to apply
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(DS3231Error)` on error
    pub async fn configure(&mut self, config: &Config) -> Result<(), DS3231Error<I2C::Error>> {
        debug!("DS3231: reading hours register");
        let hours = self.hour().await?;
        let hour = decode_hours(hours)
            .ok_or(DS3231Error::DateTime(DS3231DateTimeError::InvalidDateTime))?;
        let hours = convert_hours(u32::from(hour), config.time_representation)
            .map_err(DS3231Error::DateTime)?;

        debug!("DS3231: reading control register");
        let mut control = self.control().await?;
        control.set_oscillator_enable(config.oscillator_enable);
        control.set_battery_backed_square_wave(config.battery_backed_square_wave);
        control.set_square_wave_frequency(config.square_wave_frequency);
        control.set_interrupt_control(config.interrupt_control);
        debug!("DS3231: writing control: {:?}", control);
        self.set_control(control).await?;
        self.set_hour(hours).await?;
        self.time_representation = config.time_representation;
        Ok(())
    }

    async fn read_registers(
        &mut self,
        start: RegAddr,
        data: &mut [u8],
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.i2c
            .write_read(self.address, &[start as u8], data)
            .await?;
        Ok(())
    }

    async fn write_register(
        &mut self,
        reg: RegAddr,
        value: u8,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.i2c.write(self.address, &[reg as u8, value]).await?;
        Ok(())
    }

    async fn read_raw_datetime(&mut self) -> Result<DS3231DateTime, DS3231Error<I2C::Error>> {
        let mut data = [0; 7];
        self.read_registers(RegAddr::Seconds, &mut data).await?;
        Ok(data.into())
    }

    async fn write_raw_datetime(
        &mut self,
        datetime: &DS3231DateTime,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let data: [u8; 7] = datetime.into();
        let mut buffer = [0; 8];
        buffer[0] = RegAddr::Seconds as u8;
        buffer[1..].copy_from_slice(&data);
        self.i2c.write(self.address, &buffer).await?;
        Ok(())
    }

    /// Reads the current time with one 7-byte burst read.
    pub async fn time(&mut self) -> Result<CalendarTime, DS3231Error<I2C::Error>> {
        let raw = self.read_raw_datetime().await?;
        raw.into_calendar().map_err(DS3231Error::DateTime)
    }

    /// Sets the time with one 8-byte burst write, validated first.
    pub async fn set_time(&mut self, time: &CalendarTime) -> Result<(), DS3231Error<I2C::Error>> {
        let raw = DS3231DateTime::from_calendar(time, self.time_representation)
            .map_err(DS3231Error::DateTime)?;
        self.write_raw_datetime(&raw).await
    }

    /// Gets the current date and time from the device.
    ///
    /// # Returns
    /// * `Ok(NaiveDateTime)` - The current date and time
    /// * `Err(DS3231Error)` on error
    pub async fn datetime(&mut self) -> Result<NaiveDateTime, DS3231Error<I2C::Error>> {
        self.time()
            .await?
            .to_naive_datetime()
            .map_err(DS3231Error::DateTime)
    }

    /// Sets the current date and time on the device.
    ///
    /// # Arguments
    /// * `datetime` - The date and time to set, 2000-2099
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(DS3231Error)` on error
    pub async fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let time = CalendarTime::try_from(datetime).map_err(DS3231Error::DateTime)?;
        self.set_time(&time).await
    }

    /// Reads the die temperature in degrees Celsius, in 0.25 steps.
    pub async fn temperature(&mut self) -> Result<f32, DS3231Error<I2C::Error>> {
        let mut data = [0; 2];
        self.read_registers(RegAddr::MSBTemp, &mut data).await?;
        Ok(decode_temperature(data[0], data[1]))
    }

    pub async fn aging_offset(&mut self) -> Result<i8, DS3231Error<I2C::Error>> {
        let mut data = [0];
        self.read_registers(RegAddr::AgingOffset, &mut data).await?;
        Ok(decode_aging_offset(data[0]))
    }

    pub async fn set_aging_offset(&mut self, offset: i8) -> Result<(), DS3231Error<I2C::Error>> {
        let mut value = AgingOffset::default();
        value.set_aging_offset(offset);
        self.write_register(RegAddr::AgingOffset, value.into())
            .await
    }

    pub async fn status(&mut self) -> Result<Status, DS3231Error<I2C::Error>> {
        let mut data = [0];
        self.read_registers(RegAddr::ControlStatus, &mut data)
            .await?;
        Ok(Status(data[0]))
    }

    /// Read-modify-write of the status register; only the writable bits are
    /// taken from `status`.
    pub async fn set_status(&mut self, status: Status) -> Result<(), DS3231Error<I2C::Error>> {
        let current = self.status().await?;
        let merged = current.merge_writable(status);
        debug!("DS3231: status {:?} -> {:?}", current, merged);
        self.write_register(RegAddr::ControlStatus, merged.into())
            .await
    }

    /// Returns the (alarm 1, alarm 2) fired flags, clearing both when `clear`
    /// is set.
    pub async fn alarm_flags(
        &mut self,
        clear: bool,
    ) -> Result<(bool, bool), DS3231Error<I2C::Error>> {
        let status = self.status().await?;
        let flags = (status.alarm1_flag(), status.alarm2_flag());
        if clear {
            self.write_register(
                RegAddr::ControlStatus,
                status.with_alarm_flags_cleared().into(),
            )
            .await?;
        }
        Ok(flags)
    }

    /// Reads an alarm and the match mode it is set to.
    pub async fn alarm(
        &mut self,
        unit: AlarmUnit,
    ) -> Result<(AlarmTime, Option<MatchMode>), DS3231Error<I2C::Error>> {
        let mut data = [0; 4];
        let data = &mut data[..unit.register_count()];
        self.read_registers(unit.base_register(), data).await?;
        decode_alarm(data, unit).map_err(DS3231Error::Alarm)
    }

    /// Sets the alarm of the unit `mode` belongs to, with one burst write.
    pub async fn set_alarm(
        &mut self,
        time: &AlarmTime,
        mode: MatchMode,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let registers = AlarmRegisters::encode(time, mode, self.time_representation)
            .map_err(DS3231Error::Alarm)?;
        let bytes = registers.as_bytes();
        let mut buffer = [0; 5];
        buffer[0] = registers.unit().base_register() as u8;
        buffer[1..=bytes.len()].copy_from_slice(bytes);
        self.i2c
            .write(self.address, &buffer[..=bytes.len()])
            .await?;
        Ok(())
    }

    /// Routes the alarms to the INT pin, alarm 2 first; see
    /// [`crate::DS3231::control_alarm_interrupt`].
    pub async fn control_alarm_interrupt(
        &mut self,
        alarm2: bool,
        alarm1: bool,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let control = self.control().await?.with_alarm_interrupts(alarm1, alarm2);
        debug!("DS3231: writing control: {:?}", control);
        self.set_control(control).await
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ident)),+) => {
        impl<I2C: I2c> DS3231<I2C> {
            $(
                paste! {
                    #[doc = concat!("Reads the raw ", stringify!($name), " register.")]
                    pub async fn $name(&mut self) -> Result<$typ, DS3231Error<I2C::Error>> {
                        let mut data = [0];
                        self.read_registers($regaddr, &mut data).await?;
                        Ok($typ(data[0]))
                    }

                    #[doc = concat!("Writes the raw ", stringify!($name), " register.")]
                    pub async fn [<set_ $name>](&mut self, value: $typ) -> Result<(), DS3231Error<I2C::Error>> {
                        self.write_register($regaddr, value.into()).await
                    }
                }
            )+
        }
    }
}

impl_register_access!(
    (hour, RegAddr::Hours, Hours),
    (control, RegAddr::Control, Control)
);
