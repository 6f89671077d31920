//! Register map and bitfield wrappers for the DS3231.
//!
//! Every register the driver touches has a one-byte wrapper here. The wrappers
//! only name bits; range checking and BCD arithmetic live in the codec modules.

use bitfield::bitfield;

/// Register offsets of the DS3231 (0x00-0x12).
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds, BCD 00-59
    Seconds = 0x00,
    /// Minutes, BCD 00-59
    Minutes = 0x01,
    /// Hours, 12/24 hour select in bit 6
    Hours = 0x02,
    /// Day of week, 1-7
    Day = 0x03,
    /// Day of month, BCD 1-31
    Date = 0x04,
    /// Month, century flag in bit 7
    Month = 0x05,
    /// Year within the century, BCD 00-99
    Year = 0x06,
    Alarm1Seconds = 0x07,
    Alarm1Minutes = 0x08,
    Alarm1Hours = 0x09,
    Alarm1DayDate = 0x0A,
    Alarm2Minutes = 0x0B,
    Alarm2Hours = 0x0C,
    Alarm2DayDate = 0x0D,
    Control = 0x0E,
    /// Status register (the datasheet calls it control/status)
    ControlStatus = 0x0F,
    /// Signed crystal aging trim
    AgingOffset = 0x10,
    /// Integer part of the temperature, two's complement
    MSBTemp = 0x11,
    /// Quarter degrees in bits 7:6
    LSBTemp = 0x12,
}

/// Hour register format.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeRepresentation {
    /// 0-23
    TwentyFourHour = 0,
    /// 1-12 plus an AM/PM bit
    TwelveHour = 1,
}
impl From<u8> for TimeRepresentation {
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => TimeRepresentation::TwentyFourHour,
            1 => TimeRepresentation::TwelveHour,
            _ => panic!("Invalid value for TimeRepresentation: {}", v),
        }
    }
}
impl From<TimeRepresentation> for u8 {
    fn from(v: TimeRepresentation) -> Self {
        v as u8
    }
}

/// Oscillator state while running from the backup battery (EOSC, active low).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oscillator {
    Enabled = 0,
    Disabled = 1,
}
impl From<u8> for Oscillator {
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => Oscillator::Enabled,
            1 => Oscillator::Disabled,
            _ => panic!("Invalid value for Oscillator: {}", v),
        }
    }
}
impl From<Oscillator> for u8 {
    fn from(v: Oscillator) -> Self {
        v as u8
    }
}

/// Function of the INT/SQW pin (INTCN bit).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptControl {
    /// Pin outputs the square wave selected by the rate bits
    SquareWave = 0,
    /// Pin is driven low when an enabled alarm fires
    Interrupt = 1,
}
impl From<u8> for InterruptControl {
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => InterruptControl::SquareWave,
            1 => InterruptControl::Interrupt,
            _ => panic!("Invalid value for InterruptControl: {}", v),
        }
    }
}
impl From<InterruptControl> for u8 {
    fn from(v: InterruptControl) -> Self {
        v as u8
    }
}

/// Square wave rate select (RS2:RS1).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWaveFrequency {
    Hz1 = 0b00,
    Hz1024 = 0b01,
    Hz4096 = 0b10,
    Hz8192 = 0b11,
}
impl From<u8> for SquareWaveFrequency {
    /// # Panics
    /// Panics if the value does not fit in two bits.
    fn from(v: u8) -> Self {
        match v {
            0b00 => SquareWaveFrequency::Hz1,
            0b01 => SquareWaveFrequency::Hz1024,
            0b10 => SquareWaveFrequency::Hz4096,
            0b11 => SquareWaveFrequency::Hz8192,
            _ => panic!("Invalid value for SquareWaveFrequency: {}", v),
        }
    }
}
impl From<SquareWaveFrequency> for u8 {
    fn from(v: SquareWaveFrequency) -> Self {
        v as u8
    }
}

/// DY/DT bit of an alarm day register.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DayDateSelect {
    /// Compare against the day of month (1-31)
    Date = 0,
    /// Compare against the day of week register (1-7)
    Day = 1,
}
impl From<u8> for DayDateSelect {
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => DayDateSelect::Date,
            1 => DayDateSelect::Day,
            _ => panic!("Invalid value for DayDateSelect: {}", v),
        }
    }
}
impl From<DayDateSelect> for u8 {
    fn from(v: DayDateSelect) -> Self {
        v as u8
    }
}

// Generates From<u8> and From<$typ> for u8 for a register wrapper.
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Seconds register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Seconds(u8);
    impl Debug;
    pub ten_seconds, set_ten_seconds: 6, 4;
    pub seconds, set_seconds: 3, 0;
}
from_register_u8!(Seconds);

bitfield! {
    /// Minutes register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Minutes(u8);
    impl Debug;
    pub ten_minutes, set_ten_minutes: 6, 4;
    pub minutes, set_minutes: 3, 0;
}
from_register_u8!(Minutes);

bitfield! {
    /// Hours register.
    ///
    /// In 24-hour mode bit 5 is the twenty-hours digit; in 12-hour mode it is
    /// the PM flag and bit 4 alone holds the tens digit.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Hours(u8);
    impl Debug;
    pub from into TimeRepresentation, time_representation, set_time_representation: 6, 6;
    pub pm_or_twenty_hours, set_pm_or_twenty_hours: 5, 5;
    pub ten_hours, set_ten_hours: 4, 4;
    pub hours, set_hours: 3, 0;
}
from_register_u8!(Hours);

#[cfg(feature = "defmt")]
impl defmt::Format for Hours {
    fn format(&self, f: defmt::Formatter) {
        let hours = 10 * self.ten_hours() + self.hours();
        match self.time_representation() {
            TimeRepresentation::TwentyFourHour => {
                defmt::write!(f, "Hours({}h)", hours + 20 * self.pm_or_twenty_hours());
            }
            TimeRepresentation::TwelveHour => {
                let suffix = if self.pm_or_twenty_hours() != 0 { "PM" } else { "AM" };
                defmt::write!(f, "Hours({}h {})", hours, suffix);
            }
        }
    }
}

bitfield! {
    /// Day of week register (1-7). Bits 7:3 read as zero on a healthy chip,
    /// so the whole byte is the value.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Day(u8);
    impl Debug;
    pub day, set_day: 7, 0;
}
from_register_u8!(Day);

bitfield! {
    /// Day of month register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Date(u8);
    impl Debug;
    pub ten_date, set_ten_date: 5, 4;
    pub date, set_date: 3, 0;
}
from_register_u8!(Date);

bitfield! {
    /// Month register. Bit 7 is the century flag the chip toggles when the
    /// year rolls over from 99 to 00.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Month(u8);
    impl Debug;
    pub century, set_century: 7;
    pub ten_month, set_ten_month: 4, 4;
    pub month, set_month: 3, 0;
}
from_register_u8!(Month);

bitfield! {
    /// Year register (00-99).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Year(u8);
    impl Debug;
    pub ten_year, set_ten_year: 7, 4;
    pub year, set_year: 3, 0;
}
from_register_u8!(Year);

bitfield! {
    /// Control register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// EOSC, active low
    pub from into Oscillator, oscillator_enable, set_oscillator_enable: 7, 7;
    /// BBSQW
    pub battery_backed_square_wave, set_battery_backed_square_wave: 6;
    /// CONV, starts a temperature conversion
    pub convert_temperature, set_convert_temperature: 5;
    pub from into SquareWaveFrequency, square_wave_frequency, set_square_wave_frequency: 4, 3;
    /// INTCN
    pub from into InterruptControl, interrupt_control, set_interrupt_control: 2, 2;
    pub alarm2_interrupt_enable, set_alarm2_interrupt_enable: 1;
    pub alarm1_interrupt_enable, set_alarm1_interrupt_enable: 0;
}
from_register_u8!(Control);

impl Control {
    /// BBSQW, INTCN, A2IE and A1IE: the bits owned by alarm interrupt routing.
    pub const ALARM_ROUTING_MASK: u8 = 0b0100_0111;

    /// Returns this control value with the alarm routing bits rewritten.
    ///
    /// The four routing bits are cleared first, then INTCN and the requested
    /// per-alarm enables are set. Oscillator, conversion and rate bits are
    /// left alone.
    #[must_use]
    pub fn with_alarm_interrupts(self, alarm1: bool, alarm2: bool) -> Self {
        let mut control = Control(self.0 & !Self::ALARM_ROUTING_MASK);
        control.set_interrupt_control(InterruptControl::Interrupt);
        control.set_alarm1_interrupt_enable(alarm1);
        control.set_alarm2_interrupt_enable(alarm2);
        control
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Control {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Control(osc: {}, bbsqw: {}, conv: {}, rate: {}, intcn: {}, a2ie: {}, a1ie: {})",
            self.oscillator_enable(),
            self.battery_backed_square_wave(),
            self.convert_temperature(),
            self.square_wave_frequency(),
            self.interrupt_control(),
            self.alarm2_interrupt_enable(),
            self.alarm1_interrupt_enable()
        );
    }
}

bitfield! {
    /// Status register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Status(u8);
    impl Debug;
    /// OSF, set whenever the oscillator stopped since it was last cleared
    pub oscillator_stop_flag, set_oscillator_stop_flag: 7;
    pub enable_32khz_output, set_enable_32khz_output: 3;
    /// BSY, read-only
    pub busy, set_busy: 2;
    pub alarm2_flag, set_alarm2_flag: 1;
    pub alarm1_flag, set_alarm1_flag: 0;
}
from_register_u8!(Status);

impl Status {
    /// OSF, EN32kHz, A2F and A1F. Everything else is read-only or undefined.
    pub const WRITABLE_MASK: u8 = 0b1000_1011;

    /// Takes the writable bits from `requested` and keeps every other bit of
    /// `self`, which should be the value just read from the chip.
    #[must_use]
    pub fn merge_writable(self, requested: Status) -> Self {
        Status((self.0 & !Self::WRITABLE_MASK) | (requested.0 & Self::WRITABLE_MASK))
    }

    /// Returns this status value with both alarm fired flags cleared.
    #[must_use]
    pub fn with_alarm_flags_cleared(mut self) -> Self {
        self.set_alarm1_flag(false);
        self.set_alarm2_flag(false);
        self
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Status(osf: {}, en32khz: {}, bsy: {}, a2f: {}, a1f: {})",
            self.oscillator_stop_flag(),
            self.enable_32khz_output(),
            self.busy(),
            self.alarm2_flag(),
            self.alarm1_flag()
        );
    }
}

bitfield! {
    /// Aging offset register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AgingOffset(u8);
    impl Debug;
    pub i8, aging_offset, set_aging_offset: 7, 0;
}
from_register_u8!(AgingOffset);

bitfield! {
    /// Temperature MSB, whole degrees.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Temperature(u8);
    impl Debug;
    pub i8, temperature, set_temperature: 7, 0;
}
from_register_u8!(Temperature);

bitfield! {
    /// Temperature LSB. Only bits 7:6 carry data, in quarter degrees.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct TemperatureFraction(u8);
    impl Debug;
    pub temperature_fraction, set_temperature_fraction: 7, 6;
}
from_register_u8!(TemperatureFraction);

bitfield! {
    /// Alarm 1 seconds register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmSeconds(u8);
    impl Debug;
    /// A1M1, seconds don't-care
    pub alarm_mask1, set_alarm_mask1: 7;
    pub ten_seconds, set_ten_seconds: 6, 4;
    pub seconds, set_seconds: 3, 0;
}
from_register_u8!(AlarmSeconds);

bitfield! {
    /// Alarm minutes register (both alarms).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmMinutes(u8);
    impl Debug;
    /// A1M2/A2M2, minutes don't-care
    pub alarm_mask2, set_alarm_mask2: 7;
    pub ten_minutes, set_ten_minutes: 6, 4;
    pub minutes, set_minutes: 3, 0;
}
from_register_u8!(AlarmMinutes);

bitfield! {
    /// Alarm hours register (both alarms). Bits 6:0 follow [`Hours`].
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmHours(u8);
    impl Debug;
    /// A1M3/A2M3, hours don't-care
    pub alarm_mask3, set_alarm_mask3: 7;
    pub from into TimeRepresentation, time_representation, set_time_representation: 6, 6;
    pub pm_or_twenty_hours, set_pm_or_twenty_hours: 5, 5;
    pub ten_hours, set_ten_hours: 4, 4;
    pub hours, set_hours: 3, 0;
}
from_register_u8!(AlarmHours);

bitfield! {
    /// Alarm day/date register (both alarms).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmDayDate(u8);
    impl Debug;
    /// A1M4/A2M4, day don't-care
    pub alarm_mask4, set_alarm_mask4: 7;
    pub from into DayDateSelect, day_date_select, set_day_date_select: 6, 6;
    /// Tens of the date; unused when DY/DT selects the day of week
    pub ten_date, set_ten_date: 5, 4;
    pub day_or_date, set_day_or_date: 3, 0;
}
from_register_u8!(AlarmDayDate);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_date_select_conversions() {
        assert_eq!(DayDateSelect::from(0), DayDateSelect::Date);
        assert_eq!(DayDateSelect::from(1), DayDateSelect::Day);
        assert_eq!(u8::from(DayDateSelect::Date), 0);
        assert_eq!(u8::from(DayDateSelect::Day), 1);
    }

    #[test]
    #[should_panic(expected = "Invalid value for DayDateSelect: 2")]
    fn test_invalid_day_date_select_conversion() {
        let _ = DayDateSelect::from(2);
    }

    #[test]
    fn test_hours_register_modes() {
        let hours = Hours::from(0x23);
        assert_eq!(
            hours.time_representation(),
            TimeRepresentation::TwentyFourHour
        );
        assert_eq!(hours.pm_or_twenty_hours(), 1);
        assert_eq!(hours.ten_hours(), 0);
        assert_eq!(hours.hours(), 3);

        // 12 PM
        let hours = Hours::from(0x72);
        assert_eq!(hours.time_representation(), TimeRepresentation::TwelveHour);
        assert_eq!(hours.pm_or_twenty_hours(), 1);
        assert_eq!(hours.ten_hours(), 1);
        assert_eq!(hours.hours(), 2);
        assert_eq!(u8::from(hours), 0x72);
    }

    #[test]
    fn test_day_register_uses_whole_byte() {
        assert_eq!(Day::from(0x07).day(), 7);
        assert_eq!(Day::from(0x0F).day(), 0x0F);
        let mut day = Day::default();
        day.set_day(3);
        assert_eq!(u8::from(day), 0x03);
    }

    #[test]
    fn test_month_century_bit() {
        let month = Month::from(0x87);
        assert!(month.century());
        assert_eq!(month.ten_month(), 0);
        assert_eq!(month.month(), 7);

        let month = Month::from(0x12);
        assert!(!month.century());
        assert_eq!(month.ten_month(), 1);
        assert_eq!(month.month(), 2);
    }

    #[test]
    fn test_control_register_fields() {
        let control = Control::from(0x1C);
        assert_eq!(control.oscillator_enable(), Oscillator::Enabled);
        assert!(!control.battery_backed_square_wave());
        assert_eq!(control.square_wave_frequency(), SquareWaveFrequency::Hz8192);
        assert_eq!(control.interrupt_control(), InterruptControl::Interrupt);
        assert!(!control.alarm2_interrupt_enable());
        assert!(!control.alarm1_interrupt_enable());

        let control = Control::from(0xFF);
        assert_eq!(control.oscillator_enable(), Oscillator::Disabled);
        assert!(control.battery_backed_square_wave());
        assert!(control.convert_temperature());
        assert!(control.alarm2_interrupt_enable());
        assert!(control.alarm1_interrupt_enable());
    }

    #[test]
    fn test_control_alarm_routing_overwrites_four_bits() {
        // BBSQW set, rate 4096 Hz, square wave mode, A2IE set
        let control = Control::from(0b0101_0010);
        let routed = control.with_alarm_interrupts(true, false);
        assert_eq!(u8::from(routed), 0b0001_0101);

        // EOSC, CONV and rate bits survive untouched
        let control = Control::from(0b1011_1011);
        assert_eq!(
            u8::from(control.with_alarm_interrupts(false, true)),
            0b1011_1110
        );
        assert_eq!(
            u8::from(control.with_alarm_interrupts(false, false)),
            0b1011_1100
        );
    }

    #[test]
    fn test_status_register_fields() {
        let status = Status::from(0x8F);
        assert!(status.oscillator_stop_flag());
        assert!(status.enable_32khz_output());
        assert!(status.busy());
        assert!(status.alarm2_flag());
        assert!(status.alarm1_flag());

        let status = Status::from(0x88);
        assert!(status.oscillator_stop_flag());
        assert!(status.enable_32khz_output());
        assert!(!status.busy());
        assert!(!status.alarm2_flag());
        assert!(!status.alarm1_flag());
    }

    #[test]
    fn test_status_merge_keeps_read_only_bits() {
        // BSY and the undefined bits come from the chip, never from the caller
        let current = Status::from(0b0111_0100);
        let merged = current.merge_writable(Status::from(0xFF));
        assert_eq!(u8::from(merged), 0xFF);

        let merged = current.merge_writable(Status::from(0x00));
        assert_eq!(u8::from(merged), 0b0111_0100);

        let current = Status::from(0b1000_1011);
        let merged = current.merge_writable(Status::from(0b0111_0100));
        assert_eq!(u8::from(merged), 0x00);
    }

    #[test]
    fn test_status_clear_alarm_flags() {
        let status = Status::from(0xFF).with_alarm_flags_cleared();
        assert_eq!(u8::from(status), 0xFC);
        let status = Status::from(0x81).with_alarm_flags_cleared();
        assert_eq!(u8::from(status), 0x80);
    }

    #[test]
    fn test_signed_registers() {
        assert_eq!(AgingOffset::from(0xF6).aging_offset(), -10);
        assert_eq!(AgingOffset::from(0x7F).aging_offset(), 127);
        assert_eq!(AgingOffset::from(0x80).aging_offset(), -128);
        assert_eq!(Temperature::from(0x19).temperature(), 25);
        assert_eq!(Temperature::from(0xFF).temperature(), -1);
    }

    #[test]
    fn test_temperature_fraction_uses_top_bits() {
        assert_eq!(TemperatureFraction::from(0x00).temperature_fraction(), 0);
        assert_eq!(TemperatureFraction::from(0x40).temperature_fraction(), 1);
        assert_eq!(TemperatureFraction::from(0xC0).temperature_fraction(), 3);
        // low six bits are reserved
        assert_eq!(TemperatureFraction::from(0x7F).temperature_fraction(), 1);
    }

    #[test]
    fn test_alarm_day_date_fields() {
        let day_date = AlarmDayDate::from(0x45);
        assert!(!day_date.alarm_mask4());
        assert_eq!(day_date.day_date_select(), DayDateSelect::Day);
        assert_eq!(day_date.day_or_date(), 5);

        let day_date = AlarmDayDate::from(0x31);
        assert_eq!(day_date.day_date_select(), DayDateSelect::Date);
        assert_eq!(day_date.ten_date(), 3);
        assert_eq!(day_date.day_or_date(), 1);

        let day_date = AlarmDayDate::from(0x80);
        assert!(day_date.alarm_mask4());
    }

    #[test]
    fn test_alarm_mask_bits() {
        assert!(AlarmSeconds::from(0xB9).alarm_mask1());
        assert_eq!(AlarmSeconds::from(0xB9).ten_seconds(), 3);
        assert_eq!(AlarmSeconds::from(0xB9).seconds(), 9);
        assert!(AlarmMinutes::from(0x80).alarm_mask2());
        assert!(!AlarmMinutes::from(0x59).alarm_mask2());
        let hours = AlarmHours::from(0xD2);
        assert!(hours.alarm_mask3());
        assert_eq!(hours.time_representation(), TimeRepresentation::TwelveHour);
        assert_eq!(hours.ten_hours(), 1);
        assert_eq!(hours.hours(), 2);
    }
}
