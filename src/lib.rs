//! A platform-agnostic driver for the DS3231 precision real-time clock.
//!
//! The driver talks to the chip over any `embedded-hal` 1.0 I2C bus and
//! covers the timekeeping registers, both alarms, the control and status
//! registers, the aging offset and the temperature sensor.
//!
//! # Features
//!
//! - `async`: adds [`asynch::DS3231`], the same driver over `embedded-hal-async`
//! - `log`: debug logging through the `log` crate
//! - `defmt`: debug logging through `defmt`, plus `defmt::Format` for public types
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3231_rtc::{Alarm2Mode, AlarmTime, CalendarTime, DS3231};
//!
//! let mut rtc = DS3231::with_default_address(i2c);
//!
//! rtc.set_time(&CalendarTime {
//!     year: 2031,
//!     month: 7,
//!     day: 4,
//!     hour: 12,
//!     minute: 30,
//!     second: 0,
//!     weekday: 4,
//! })?;
//!
//! // fire every day at 06:30 on the INT/SQW pin
//! let wake = AlarmTime { hours: 6, minutes: 30, seconds: 0, day: 0 };
//! rtc.set_alarm(&wake, Alarm2Mode::HoursMinutes.into())?;
//! rtc.control_alarm_interrupt(true, false)?;
//!
//! for time in rtc.times().take(3) {
//!     let time = time?;
//! }
//! ```
#![no_std]

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        #[allow(unused_macros)]
        macro_rules! debug {
            ($($arg:tt)+) => { defmt::debug!($($arg)+) };
        }
        #[allow(unused_macros)]
        macro_rules! error {
            ($($arg:tt)+) => { defmt::error!($($arg)+) };
        }
    } else if #[cfg(feature = "log")] {
        #[allow(unused_macros)]
        macro_rules! debug {
            ($($arg:tt)+) => { log::debug!($($arg)+) };
        }
        #[allow(unused_macros)]
        macro_rules! error {
            ($($arg:tt)+) => { log::error!($($arg)+) };
        }
    } else {
        #[allow(unused_macros)]
        macro_rules! debug {
            ($($arg:tt)+) => {{}};
        }
        #[allow(unused_macros)]
        macro_rules! error {
            ($($arg:tt)+) => {{}};
        }
    }
}

mod alarm;
#[cfg(feature = "async")]
pub mod asynch;
mod datetime;
mod registers;

use chrono::NaiveDateTime;
use embedded_hal::i2c::I2c;
use paste::paste;

pub use alarm::{
    decode_alarm, encode_alarm, Alarm1Mode, Alarm2Mode, AlarmError, AlarmRegisters, AlarmTime,
    AlarmUnit, MatchMode,
};
pub use datetime::{
    decode_aging_offset, decode_temperature, decode_time, encode_time, encode_time_with,
    CalendarTime, DS3231DateTimeError,
};
pub use registers::*;

use datetime::{convert_hours, decode_hours, DS3231DateTime};

/// Factory-set I2C address of the DS3231.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Settings applied by `configure`.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Hour register format, also used for later time and alarm writes
    pub time_representation: TimeRepresentation,
    /// Square wave rate on INT/SQW when `interrupt_control` selects it
    pub square_wave_frequency: SquareWaveFrequency,
    /// INT/SQW pin function: square wave or alarm interrupt
    pub interrupt_control: InterruptControl,
    /// Keep the square wave running on battery power
    pub battery_backed_square_wave: bool,
    /// Oscillator on battery power (EOSC)
    pub oscillator_enable: Oscillator,
}

/// Errors returned by the driver.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DS3231Error<I2CE> {
    /// Transport error from the I2C bus
    I2c(I2CE),
    /// Time value out of range, or time registers holding garbage
    DateTime(DS3231DateTimeError),
    /// Alarm value out of range, or alarm registers holding garbage
    Alarm(AlarmError),
}

impl<I2CE> From<I2CE> for DS3231Error<I2CE> {
    fn from(e: I2CE) -> Self {
        DS3231Error::I2c(e)
    }
}

/// DS3231 Real-Time Clock driver.
pub struct DS3231<I2C: I2c> {
    i2c: I2C,
    address: u8,
    time_representation: TimeRepresentation,
}

impl<I2C: I2c> DS3231<I2C> {
    /// Creates a new driver. No bus traffic happens until the first call.
    ///
    /// Time and alarm writes use the 24-hour format until `configure` selects
    /// another one.
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
    /// Rewrites the oscillator, square wave and interrupt bits of the control
    /// register and re-encodes the current hour in the requested format. The
    /// hour is decoded first; if it holds garbage nothing is written.
    ///
    /// # Arguments
    /// * `config` - The configuration to apply
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(DS3231Error)` on error
    pub fn configure(&mut self, config: &Config) -> Result<(), DS3231Error<I2C::Error>> {
        let hours = self.hour()?;
        let hour = decode_hours(hours)
            .ok_or(DS3231Error::DateTime(DS3231DateTimeError::InvalidDateTime))?;
        let hours = convert_hours(u32::from(hour), config.time_representation)
            .map_err(DS3231Error::DateTime)?;

        let mut control = self.control()?;
        control.set_oscillator_enable(config.oscillator_enable);
        control.set_battery_backed_square_wave(config.battery_backed_square_wave);
        control.set_square_wave_frequency(config.square_wave_frequency);
        control.set_interrupt_control(config.interrupt_control);
        debug!("DS3231: writing control: {:?}", control);
        self.set_control(control)?;
        self.set_hour(hours)?;
        self.time_representation = config.time_representation;
        Ok(())
    }

    fn read_registers(
        &mut self,
        start: RegAddr,
        data: &mut [u8],
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.i2c.write_read(self.address, &[start as u8], data)?;
        Ok(())
    }

    fn write_register(&mut self, reg: RegAddr, value: u8) -> Result<(), DS3231Error<I2C::Error>> {
        self.i2c.write(self.address, &[reg as u8, value])?;
        Ok(())
    }

    fn read_raw_datetime(&mut self) -> Result<DS3231DateTime, DS3231Error<I2C::Error>> {
        let mut data = [0; 7];
        self.read_registers(RegAddr::Seconds, &mut data)?;
        Ok(data.into())
    }

    fn write_raw_datetime(
        &mut self,
        datetime: &DS3231DateTime,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let data: [u8; 7] = datetime.into();
        let mut buffer = [0; 8];
        buffer[0] = RegAddr::Seconds as u8;
        buffer[1..].copy_from_slice(&data);
        self.i2c.write(self.address, &buffer)?;
        Ok(())
    }

    /// Reads the current time with one 7-byte burst read.
    ///
    /// # Errors
    ///
    /// Returns `DS3231Error::DateTime` if the registers do not hold a valid
    /// time, e.g. after a power loss without battery.
    pub fn time(&mut self) -> Result<CalendarTime, DS3231Error<I2C::Error>> {
        let raw = self.read_raw_datetime()?;
        raw.into_calendar().map_err(DS3231Error::DateTime)
    }

    /// Sets the time with one 8-byte burst write.
    ///
    /// The value is validated before anything is written. The century bit
    /// is always set.
    pub fn set_time(&mut self, time: &CalendarTime) -> Result<(), DS3231Error<I2C::Error>> {
        let raw = DS3231DateTime::from_calendar(time, self.time_representation)
            .map_err(DS3231Error::DateTime)?;
        self.write_raw_datetime(&raw)
    }

    /// Gets the current date and time from the device.
    ///
    /// # Returns
    /// * `Ok(NaiveDateTime)` - The current date and time
    /// * `Err(DS3231Error)` on error
    pub fn datetime(&mut self) -> Result<NaiveDateTime, DS3231Error<I2C::Error>> {
        self.time()?
            .to_naive_datetime()
            .map_err(DS3231Error::DateTime)
    }

    /// Sets the current date and time on the device. The weekday register is
    /// derived from the date.
    ///
    /// # Arguments
    /// * `datetime` - The date and time to set, 2000-2099
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(DS3231Error)` on error
    pub fn set_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), DS3231Error<I2C::Error>> {
        let time = CalendarTime::try_from(datetime).map_err(DS3231Error::DateTime)?;
        self.set_time(&time)
    }

    /// Reads the die temperature in degrees Celsius, in 0.25 steps.
    pub fn temperature(&mut self) -> Result<f32, DS3231Error<I2C::Error>> {
        let mut data = [0; 2];
        self.read_registers(RegAddr::MSBTemp, &mut data)?;
        Ok(decode_temperature(data[0], data[1]))
    }

    /// Reads the signed crystal aging offset.
    pub fn aging_offset(&mut self) -> Result<i8, DS3231Error<I2C::Error>> {
        let mut data = [0];
        self.read_registers(RegAddr::AgingOffset, &mut data)?;
        Ok(decode_aging_offset(data[0]))
    }

    /// Writes the signed crystal aging offset. Positive values slow the
    /// oscillator down.
    pub fn set_aging_offset(&mut self, offset: i8) -> Result<(), DS3231Error<I2C::Error>> {
        let mut value = AgingOffset::default();
        value.set_aging_offset(offset);
        self.write_register(RegAddr::AgingOffset, value.into())
    }

    /// Reads the status register.
    pub fn status(&mut self) -> Result<Status, DS3231Error<I2C::Error>> {
        let mut data = [0];
        self.read_registers(RegAddr::ControlStatus, &mut data)?;
        Ok(Status(data[0]))
    }

    /// Read-modify-write of the status register.
    ///
    /// Only OSF, EN32kHz, A2F and A1F are taken from `status`; the other bits
    /// are written back as read.
    pub fn set_status(&mut self, status: Status) -> Result<(), DS3231Error<I2C::Error>> {
        let current = self.status()?;
        let merged = current.merge_writable(status);
        debug!("DS3231: status {:?} -> {:?}", current, merged);
        self.write_register(RegAddr::ControlStatus, merged.into())
    }

    /// Returns the (alarm 1, alarm 2) fired flags.
    ///
    /// With `clear` set, the status register is written back with both flags
    /// zeroed, which releases the INT pin.
    pub fn alarm_flags(&mut self, clear: bool) -> Result<(bool, bool), DS3231Error<I2C::Error>> {
        let status = self.status()?;
        let flags = (status.alarm1_flag(), status.alarm2_flag());
        if clear {
            self.write_register(
                RegAddr::ControlStatus,
                status.with_alarm_flags_cleared().into(),
            )?;
        }
        Ok(flags)
    }

    /// Reads an alarm and the match mode it is set to.
    ///
    /// The mode is `None` when the mask bits form a combination this driver
    /// does not name.
    pub fn alarm(
        &mut self,
        unit: AlarmUnit,
    ) -> Result<(AlarmTime, Option<MatchMode>), DS3231Error<I2C::Error>> {
        let mut data = [0; 4];
        let data = &mut data[..unit.register_count()];
        self.read_registers(unit.base_register(), data)?;
        decode_alarm(data, unit).map_err(DS3231Error::Alarm)
    }

    /// Sets the alarm of the unit `mode` belongs to, with one burst write.
    ///
    /// Hours are written in the format selected by `configure`. Does not touch
    /// the interrupt enables; see [`DS3231::control_alarm_interrupt`].
    pub fn set_alarm(
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
        self.i2c.write(self.address, &buffer[..=bytes.len()])?;
        Ok(())
    }

    /// Routes the alarms to the INT pin. Note the order: alarm 2 first.
    ///
    /// Clears BBSQW, INTCN, A2IE and A1IE, then sets INTCN and the requested
    /// enables. The square wave output stops as a side effect.
    pub fn control_alarm_interrupt(
        &mut self,
        alarm2: bool,
        alarm1: bool,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let control = self.control()?.with_alarm_interrupts(alarm1, alarm2);
        debug!("DS3231: writing control: {:?}", control);
        self.set_control(control)
    }

    /// Returns an endless iterator of [`DS3231::time`] readings.
    ///
    /// Every `next` performs one read; nothing paces the reads, so callers
    /// should sleep between items or `take` a bounded number.
    pub fn times(&mut self) -> Times<'_, I2C> {
        Times { rtc: self }
    }
}

// Raw single register access
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ident)),+) => {
        impl<I2C: I2c> DS3231<I2C> {
            $(
                paste! {
                    #[doc = concat!("Reads the raw ", stringify!($name), " register.")]
                    pub fn $name(&mut self) -> Result<$typ, DS3231Error<I2C::Error>> {
                        let mut data = [0];
                        self.read_registers($regaddr, &mut data)?;
                        Ok($typ(data[0]))
                    }

                    #[doc = concat!("Writes the raw ", stringify!($name), " register.")]
                    pub fn [<set_ $name>](&mut self, value: $typ) -> Result<(), DS3231Error<I2C::Error>> {
                        self.write_register($regaddr, value.into())
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

/// Endless iterator of time readings, see [`DS3231::times`].
pub struct Times<'a, I2C: I2c> {
    rtc: &'a mut DS3231<I2C>,
}

impl<I2C: I2c> Iterator for Times<'_, I2C> {
    type Item = Result<CalendarTime, DS3231Error<I2C::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.rtc.time())
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use chrono::NaiveDate;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const DEVICE_ADDRESS: u8 = 0x68;

    // 2024-03-14 15:30:00, a Thursday
    const TIME_REGISTERS: [u8; 7] = [0x00, 0x30, 0x15, 0x04, 0x14, 0x83, 0x24];

    fn setup(expectations: &[I2cTrans]) -> DS3231<I2cMock> {
        DS3231::new(I2cMock::new(expectations), DEVICE_ADDRESS)
    }

    fn read(reg: RegAddr, data: &[u8]) -> I2cTrans {
        I2cTrans::write_read(DEVICE_ADDRESS, vec![reg as u8], data.to_vec())
    }

    fn write(reg: RegAddr, data: &[u8]) -> I2cTrans {
        let mut bytes = vec![reg as u8];
        bytes.extend_from_slice(data);
        I2cTrans::write(DEVICE_ADDRESS, bytes)
    }

    fn thursday() -> CalendarTime {
        CalendarTime {
            year: 2024,
            month: 3,
            day: 14,
            hour: 15,
            minute: 30,
            second: 0,
            weekday: 3,
        }
    }

    #[test]
    fn test_default_address_and_free() {
        let dev = DS3231::with_default_address(I2cMock::new(&[]));
        assert_eq!(dev.address, DEFAULT_ADDRESS);
        let mut i2c = dev.free();
        i2c.done();
    }

    #[test]
    fn test_configure() {
        let config = Config {
            time_representation: TimeRepresentation::TwelveHour,
            square_wave_frequency: SquareWaveFrequency::Hz1,
            interrupt_control: InterruptControl::Interrupt,
            battery_backed_square_wave: false,
            oscillator_enable: Oscillator::Enabled,
        };
        let mut dev = setup(&[
            // 15h in 24-hour format becomes 3 PM
            read(RegAddr::Hours, &[0x15]),
            read(RegAddr::Control, &[0b0001_1000]),
            write(RegAddr::Control, &[0b0000_0100]),
            write(RegAddr::Hours, &[0x63]),
        ]);
        dev.configure(&config).unwrap();
        assert_eq!(dev.time_representation, TimeRepresentation::TwelveHour);
        dev.i2c.done();
    }

    #[test]
    fn test_configure_bad_hour_leaves_control_alone() {
        let config = Config {
            time_representation: TimeRepresentation::TwelveHour,
            square_wave_frequency: SquareWaveFrequency::Hz1,
            interrupt_control: InterruptControl::Interrupt,
            battery_backed_square_wave: false,
            oscillator_enable: Oscillator::Enabled,
        };
        // 24-hour 0x3F is not an hour
        let mut dev = setup(&[read(RegAddr::Hours, &[0x3F])]);
        assert_eq!(
            dev.configure(&config),
            Err(DS3231Error::DateTime(DS3231DateTimeError::InvalidDateTime))
        );
        assert_eq!(dev.time_representation, TimeRepresentation::TwentyFourHour);
        dev.i2c.done();
    }

    #[test]
    fn test_time() {
        let mut dev = setup(&[read(RegAddr::Seconds, &TIME_REGISTERS)]);
        assert_eq!(dev.time().unwrap(), thursday());
        dev.i2c.done();
    }

    #[test]
    fn test_time_rejects_garbage() {
        let mut dev = setup(&[read(
            RegAddr::Seconds,
            &[0x00, 0x00, 0x00, 0x01, 0x31, 0x02, 0x24],
        )]);
        assert_eq!(
            dev.time(),
            Err(DS3231Error::DateTime(DS3231DateTimeError::InvalidDateTime))
        );
        dev.i2c.done();
    }

    #[test]
    fn test_set_time_is_one_burst_write() {
        let mut dev = setup(&[write(RegAddr::Seconds, &TIME_REGISTERS)]);
        dev.set_time(&thursday()).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_time_century_bit() {
        let time = CalendarTime {
            year: 2031,
            month: 7,
            day: 4,
            hour: 12,
            minute: 30,
            second: 45,
            weekday: 4,
        };
        let mut dev = setup(&[write(
            RegAddr::Seconds,
            &[0x45, 0x30, 0x12, 0x05, 0x04, 0x87, 0x31],
        )]);
        dev.set_time(&time).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_time_twelve_hour() {
        let mut dev = setup(&[write(
            RegAddr::Seconds,
            &[0x00, 0x30, 0x63, 0x04, 0x14, 0x83, 0x24],
        )]);
        dev.time_representation = TimeRepresentation::TwelveHour;
        dev.set_time(&thursday()).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_range_errors_do_not_touch_the_bus() {
        let mut dev = setup(&[]);

        let feb30 = CalendarTime {
            month: 2,
            day: 30,
            ..thursday()
        };
        assert_eq!(
            dev.set_time(&feb30),
            Err(DS3231Error::DateTime(DS3231DateTimeError::InvalidDateTime))
        );
        assert_eq!(
            dev.set_time(&CalendarTime {
                year: 1999,
                ..thursday()
            }),
            Err(DS3231Error::DateTime(DS3231DateTimeError::YearNotAfter1999))
        );

        let late = NaiveDate::from_ymd_opt(2100, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            dev.set_datetime(&late),
            Err(DS3231Error::DateTime(DS3231DateTimeError::YearNotBefore2100))
        );

        let alarm = AlarmTime {
            hours: 24,
            ..AlarmTime::default()
        };
        assert_eq!(
            dev.set_alarm(&alarm, Alarm2Mode::HoursMinutes.into()),
            Err(DS3231Error::Alarm(AlarmError::InvalidTime(
                "hours must be 0-23"
            )))
        );
        dev.i2c.done();
    }

    #[test]
    fn test_datetime_roundtrip() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        let mut dev = setup(&[
            write(RegAddr::Seconds, &TIME_REGISTERS),
            read(RegAddr::Seconds, &TIME_REGISTERS),
        ]);
        dev.set_datetime(&dt).unwrap();
        assert_eq!(dev.datetime().unwrap(), dt);
        dev.i2c.done();
    }

    #[test]
    fn test_temperature() {
        let mut dev = setup(&[
            read(RegAddr::MSBTemp, &[0x19, 0x40]),
            read(RegAddr::MSBTemp, &[0xFF, 0x00]),
        ]);
        assert_eq!(dev.temperature().unwrap(), 25.25);
        assert_eq!(dev.temperature().unwrap(), -1.0);
        dev.i2c.done();
    }

    #[test]
    fn test_aging_offset() {
        let mut dev = setup(&[
            read(RegAddr::AgingOffset, &[0xF6]),
            write(RegAddr::AgingOffset, &[0xFD]),
        ]);
        assert_eq!(dev.aging_offset().unwrap(), -10);
        dev.set_aging_offset(-3).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_status_keeps_read_only_bits() {
        let mut dev = setup(&[
            // OSF, BSY, A2F, A1F
            read(RegAddr::ControlStatus, &[0b1000_0111]),
            // BSY survives, EN32kHz comes from the caller
            write(RegAddr::ControlStatus, &[0b0000_1100]),
        ]);
        dev.set_status(Status(0b0000_1000)).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_alarm_flags() {
        let mut dev = setup(&[
            read(RegAddr::ControlStatus, &[0b0000_0010]),
            read(RegAddr::ControlStatus, &[0b1100_0111]),
            write(RegAddr::ControlStatus, &[0b1100_0100]),
        ]);
        assert_eq!(dev.alarm_flags(false).unwrap(), (false, true));
        assert_eq!(dev.alarm_flags(true).unwrap(), (true, true));
        dev.i2c.done();
    }

    #[test]
    fn test_control_alarm_interrupt() {
        let mut dev = setup(&[
            // alarm 2 only: INTCN + A2IE
            read(RegAddr::Control, &[0x00]),
            write(RegAddr::Control, &[0b0000_0110]),
            // BBSQW, 8.192kHz, A2IE; alarm 1 only
            read(RegAddr::Control, &[0b0101_1010]),
            write(RegAddr::Control, &[0b0001_1101]),
            read(RegAddr::Control, &[0b1000_0101]),
            write(RegAddr::Control, &[0b1000_0110]),
        ]);
        dev.control_alarm_interrupt(true, false).unwrap();
        dev.control_alarm_interrupt(false, true).unwrap();
        dev.control_alarm_interrupt(true, false).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_alarm() {
        let mut dev = setup(&[
            read(RegAddr::Alarm1Seconds, &[0x30, 0x45, 0x18, 0x45]),
            read(RegAddr::Alarm2Minutes, &[0x80, 0x80, 0x80]),
        ]);
        assert_eq!(
            dev.alarm(AlarmUnit::Alarm1).unwrap(),
            (
                AlarmTime {
                    hours: 18,
                    minutes: 45,
                    seconds: 30,
                    day: 5
                },
                Some(Alarm1Mode::DayHoursMinutesSeconds.into())
            )
        );
        let (_, mode) = dev.alarm(AlarmUnit::Alarm2).unwrap();
        assert_eq!(mode, None);
        dev.i2c.done();
    }

    #[test]
    fn test_set_alarm() {
        let time = AlarmTime {
            hours: 11,
            minutes: 10,
            seconds: 0,
            day: 12,
        };
        let mut dev = setup(&[
            write(RegAddr::Alarm1Seconds, &[0x00, 0x90, 0x91, 0x92]),
            write(RegAddr::Alarm2Minutes, &[0x10, 0x11, 0x92]),
        ]);
        dev.set_alarm(&time, Alarm1Mode::Seconds.into()).unwrap();
        dev.set_alarm(&time, Alarm2Mode::HoursMinutes.into())
            .unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_alarm_follows_time_representation() {
        let time = AlarmTime {
            hours: 15,
            minutes: 30,
            seconds: 0,
            day: 1,
        };
        let mut dev = setup(&[write(RegAddr::Alarm2Minutes, &[0x30, 0x63, 0x81])]);
        dev.time_representation = TimeRepresentation::TwelveHour;
        dev.set_alarm(&time, Alarm2Mode::HoursMinutes.into())
            .unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_bus_errors_propagate() {
        let mut dev = setup(&[
            read(RegAddr::Seconds, &[0; 7]).with_error(ErrorKind::Other),
            read(RegAddr::ControlStatus, &[0]).with_error(ErrorKind::Other),
            I2cTrans::write(DEVICE_ADDRESS, vec![RegAddr::AgingOffset as u8, 0x01])
                .with_error(ErrorKind::Other),
        ]);
        assert_eq!(dev.time(), Err(DS3231Error::I2c(ErrorKind::Other)));
        assert_eq!(
            dev.alarm_flags(true),
            Err(DS3231Error::I2c(ErrorKind::Other))
        );
        assert_eq!(
            dev.set_aging_offset(1),
            Err(DS3231Error::I2c(ErrorKind::Other))
        );
        dev.i2c.done();
    }

    #[test]
    fn test_times() {
        let mut second_later = TIME_REGISTERS;
        second_later[0] = 0x01;
        let mut dev = setup(&[
            read(RegAddr::Seconds, &TIME_REGISTERS),
            read(RegAddr::Seconds, &second_later),
            read(RegAddr::Seconds, &[0xFF; 7]),
        ]);
        let readings: Vec<_> = dev.times().take(3).collect();
        assert_eq!(readings[0], Ok(thursday()));
        assert_eq!(
            readings[1],
            Ok(CalendarTime {
                second: 1,
                ..thursday()
            })
        );
        assert!(readings[2].is_err());
        dev.i2c.done();
    }

    #[test]
    fn test_raw_registers() {
        let mut dev = setup(&[
            read(RegAddr::Hours, &[0x52]),
            write(RegAddr::Control, &[0x1C]),
        ]);
        let hours = dev.hour().unwrap();
        assert_eq!(hours.time_representation(), TimeRepresentation::TwelveHour);
        let mut control = Control::default();
        control.set_square_wave_frequency(SquareWaveFrequency::Hz8192);
        control.set_interrupt_control(InterruptControl::Interrupt);
        dev.set_control(control).unwrap();
        dev.i2c.done();
    }
}
