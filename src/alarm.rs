//! Alarm register codec for the DS3231.
//!
//! The chip has two alarm comparators. Alarm 1 lives at 0x07-0x0A (seconds,
//! minutes, hours, day/date), alarm 2 at 0x0B-0x0D (minutes, hours, day/date)
//! and always fires at 00 seconds.
//!
//! Bit 7 of every alarm register is a don't-care mask for its field; bit 6 of
//! the day/date register (DY/DT) selects day-of-week matching. Together they
//! form a mode bitmask which is looked up in a fixed per-unit table:
//!
//! | Unit | Ordinal | Fields compared | Bitmask |
//! |------|---------|-----------------|---------|
//! | 1 | 0 | seconds | `0b0_1110` |
//! | 1 | 1 | minutes, seconds | `0b0_1100` |
//! | 1 | 2 | hours, minutes, seconds | `0b0_1000` |
//! | 1 | 3 | date, hours, minutes, seconds | `0b0_0000` |
//! | 1 | 4 | day of week, hours, minutes, seconds | `0b1_0000` |
//! | 2 | 0 | minutes | `0b0_1100` |
//! | 2 | 1 | hours, minutes | `0b0_1000` |
//! | 2 | 2 | date, hours, minutes | `0b0_0000` |
//! | 2 | 3 | day of week, hours, minutes | `0b1_0000` |
//!
//! Bits 0-3 are the seconds, minutes, hours and day don't-care bits, bit 4 is
//! DY/DT. Register contents outside the table (for example "every second",
//! with all four don't-care bits set) decode to no match mode.

use crate::{
    datetime::{convert_hours, decode_hours, from_bcd, make_bcd},
    AlarmDayDate, AlarmHours, AlarmMinutes, AlarmSeconds, DayDateSelect, Hours, RegAddr,
    TimeRepresentation,
};

const SECONDS_MASKED: u8 = 0b0_0001;
const MINUTES_MASKED: u8 = 0b0_0010;
const HOURS_MASKED: u8 = 0b0_0100;
const DAY_MASKED: u8 = 0b0_1000;
const DAY_OF_WEEK: u8 = 0b1_0000;

const ALARM1_MODE_BITS: [u8; 5] = [
    MINUTES_MASKED | HOURS_MASKED | DAY_MASKED,
    HOURS_MASKED | DAY_MASKED,
    DAY_MASKED,
    0,
    DAY_OF_WEEK,
];

const ALARM2_MODE_BITS: [u8; 4] = [HOURS_MASKED | DAY_MASKED, DAY_MASKED, 0, DAY_OF_WEEK];

/// Error type for alarm encoding and decoding.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmError {
    /// Invalid time component value
    InvalidTime(&'static str),
    /// Invalid day of week (must be 1-7)
    InvalidDayOfWeek,
    /// Invalid date of month (must be 1-31)
    InvalidDateOfMonth,
    /// The ordinal does not name a match mode of the alarm unit
    InvalidMatchMode(u8),
    /// The register slice does not match the unit's register count
    InvalidLength,
}

/// One of the two alarm comparators.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmUnit {
    /// Seconds, minutes, hours and day/date
    Alarm1,
    /// Minutes, hours and day/date
    Alarm2,
}

impl AlarmUnit {
    /// First register of the unit.
    #[must_use]
    pub const fn base_register(self) -> RegAddr {
        match self {
            AlarmUnit::Alarm1 => RegAddr::Alarm1Seconds,
            AlarmUnit::Alarm2 => RegAddr::Alarm2Minutes,
        }
    }

    /// Number of consecutive registers the unit occupies.
    #[must_use]
    pub const fn register_count(self) -> usize {
        match self {
            AlarmUnit::Alarm1 => 4,
            AlarmUnit::Alarm2 => 3,
        }
    }

    /// Number of named match modes; valid ordinals are `0..mode_count()`.
    #[must_use]
    pub const fn mode_count(self) -> u8 {
        match self {
            AlarmUnit::Alarm1 => 5,
            AlarmUnit::Alarm2 => 4,
        }
    }

    const fn mode_table(self) -> &'static [u8] {
        match self {
            AlarmUnit::Alarm1 => &ALARM1_MODE_BITS,
            AlarmUnit::Alarm2 => &ALARM2_MODE_BITS,
        }
    }
}

/// Match modes of alarm 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm1Mode {
    /// Seconds match (once a minute)
    Seconds = 0,
    /// Minutes and seconds match (once an hour)
    MinutesSeconds = 1,
    /// Hours, minutes and seconds match (once a day)
    HoursMinutesSeconds = 2,
    /// Date of month, hours, minutes and seconds match
    DateHoursMinutesSeconds = 3,
    /// Day of week, hours, minutes and seconds match
    DayHoursMinutesSeconds = 4,
}

/// Match modes of alarm 2.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm2Mode {
    /// Minutes match (once an hour)
    Minutes = 0,
    /// Hours and minutes match (once a day)
    HoursMinutes = 1,
    /// Date of month, hours and minutes match
    DateHoursMinutes = 2,
    /// Day of week, hours and minutes match
    DayHoursMinutes = 3,
}

/// A match mode together with the alarm unit it belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MatchMode {
    Alarm1(Alarm1Mode),
    Alarm2(Alarm2Mode),
}

impl MatchMode {
    /// Looks up the mode with the given ordinal (see the module table).
    ///
    /// # Errors
    ///
    /// Returns [`AlarmError::InvalidMatchMode`] for ordinals above 4 on alarm 1
    /// or above 3 on alarm 2.
    pub fn from_ordinal(unit: AlarmUnit, ordinal: u8) -> Result<Self, AlarmError> {
        let mode = match (unit, ordinal) {
            (AlarmUnit::Alarm1, 0) => MatchMode::Alarm1(Alarm1Mode::Seconds),
            (AlarmUnit::Alarm1, 1) => MatchMode::Alarm1(Alarm1Mode::MinutesSeconds),
            (AlarmUnit::Alarm1, 2) => MatchMode::Alarm1(Alarm1Mode::HoursMinutesSeconds),
            (AlarmUnit::Alarm1, 3) => MatchMode::Alarm1(Alarm1Mode::DateHoursMinutesSeconds),
            (AlarmUnit::Alarm1, 4) => MatchMode::Alarm1(Alarm1Mode::DayHoursMinutesSeconds),
            (AlarmUnit::Alarm2, 0) => MatchMode::Alarm2(Alarm2Mode::Minutes),
            (AlarmUnit::Alarm2, 1) => MatchMode::Alarm2(Alarm2Mode::HoursMinutes),
            (AlarmUnit::Alarm2, 2) => MatchMode::Alarm2(Alarm2Mode::DateHoursMinutes),
            (AlarmUnit::Alarm2, 3) => MatchMode::Alarm2(Alarm2Mode::DayHoursMinutes),
            _ => return Err(AlarmError::InvalidMatchMode(ordinal)),
        };
        Ok(mode)
    }

    #[must_use]
    pub const fn unit(self) -> AlarmUnit {
        match self {
            MatchMode::Alarm1(_) => AlarmUnit::Alarm1,
            MatchMode::Alarm2(_) => AlarmUnit::Alarm2,
        }
    }

    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            MatchMode::Alarm1(mode) => mode as u8,
            MatchMode::Alarm2(mode) => mode as u8,
        }
    }

    /// The mode's entry in the unit's bitmask table.
    #[must_use]
    pub fn mode_bits(self) -> u8 {
        self.unit().mode_table()[usize::from(self.ordinal())]
    }

    /// Whether the day field is compared against the day of week register.
    #[must_use]
    pub fn matches_day_of_week(self) -> bool {
        self.mode_bits() & DAY_OF_WEEK != 0
    }
}

impl From<Alarm1Mode> for MatchMode {
    fn from(mode: Alarm1Mode) -> Self {
        MatchMode::Alarm1(mode)
    }
}

impl From<Alarm2Mode> for MatchMode {
    fn from(mode: Alarm2Mode) -> Self {
        MatchMode::Alarm2(mode)
    }
}

/// Time fields of an alarm.
///
/// `day` is a date of month (1-31) for date modes, or a day of week in the
/// chip's 1-7 numbering (`CalendarTime::weekday + 1`) for day-of-week modes.
/// Fields the mode does not compare are still stored; a masked `day` may be 0.
/// Alarm 2 has no seconds register, so `seconds` must be 0 there.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmTime {
    /// 0-23
    pub hours: u8,
    /// 0-59
    pub minutes: u8,
    /// 0-59
    pub seconds: u8,
    pub day: u8,
}

/// Raw registers of one alarm unit, in address order.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmRegisters {
    unit: AlarmUnit,
    data: [u8; 4],
}

impl AlarmRegisters {
    /// Wraps registers read from the chip.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmError::InvalidLength`] unless `bytes` holds exactly
    /// [`AlarmUnit::register_count`] bytes.
    pub fn from_bytes(unit: AlarmUnit, bytes: &[u8]) -> Result<Self, AlarmError> {
        if bytes.len() != unit.register_count() {
            return Err(AlarmError::InvalidLength);
        }
        let mut data = [0; 4];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self { unit, data })
    }

    /// Encodes `time` for the unit and mode in `mode`, with the hours register
    /// in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if any field is out of range for the mode; nothing is
    /// encoded in that case.
    pub fn encode(
        time: &AlarmTime,
        mode: MatchMode,
        time_representation: TimeRepresentation,
    ) -> Result<Self, AlarmError> {
        Self::validate(time, mode)?;
        let bits = mode.mode_bits();
        let mut alarm = Self {
            unit: mode.unit(),
            data: [0; 4],
        };

        if alarm.unit == AlarmUnit::Alarm1 {
            let (ones, tens) = make_bcd(u32::from(time.seconds), 59)
                .map_err(|_| AlarmError::InvalidTime("seconds must be 0-59"))?;
            let mut seconds = AlarmSeconds::default();
            seconds.set_seconds(ones);
            seconds.set_ten_seconds(tens);
            seconds.set_alarm_mask1(bits & SECONDS_MASKED != 0);
            alarm.data[0] = seconds.into();
        }

        let offset = alarm.offset();

        let (ones, tens) = make_bcd(u32::from(time.minutes), 59)
            .map_err(|_| AlarmError::InvalidTime("minutes must be 0-59"))?;
        let mut minutes = AlarmMinutes::default();
        minutes.set_minutes(ones);
        minutes.set_ten_minutes(tens);
        minutes.set_alarm_mask2(bits & MINUTES_MASKED != 0);
        alarm.data[offset] = minutes.into();

        let encoded = convert_hours(u32::from(time.hours), time_representation)
            .map_err(|_| AlarmError::InvalidTime("hours must be 0-23"))?;
        let mut hours = AlarmHours(encoded.0);
        hours.set_alarm_mask3(bits & HOURS_MASKED != 0);
        alarm.data[offset + 1] = hours.into();

        let mut day_date = AlarmDayDate::default();
        if mode.matches_day_of_week() {
            day_date.set_day_date_select(DayDateSelect::Day);
            day_date.set_day_or_date(time.day);
        } else {
            let (ones, tens) =
                make_bcd(u32::from(time.day), 31).map_err(|_| AlarmError::InvalidDateOfMonth)?;
            day_date.set_day_date_select(DayDateSelect::Date);
            day_date.set_day_or_date(ones);
            day_date.set_ten_date(tens);
        }
        day_date.set_alarm_mask4(bits & DAY_MASKED != 0);
        alarm.data[offset + 2] = day_date.into();

        debug!("alarm registers: {:?}", alarm.as_bytes());
        Ok(alarm)
    }

    fn validate(time: &AlarmTime, mode: MatchMode) -> Result<(), AlarmError> {
        if time.seconds > 59 {
            return Err(AlarmError::InvalidTime("seconds must be 0-59"));
        }
        if mode.unit() == AlarmUnit::Alarm2 && time.seconds != 0 {
            return Err(AlarmError::InvalidTime("alarm 2 has no seconds register"));
        }
        if time.minutes > 59 {
            return Err(AlarmError::InvalidTime("minutes must be 0-59"));
        }
        if time.hours > 23 {
            return Err(AlarmError::InvalidTime("hours must be 0-23"));
        }

        let day_masked = mode.mode_bits() & DAY_MASKED != 0;
        if mode.matches_day_of_week() {
            if !(1..=7).contains(&time.day) {
                return Err(AlarmError::InvalidDayOfWeek);
            }
        } else if time.day > 31 || (time.day == 0 && !day_masked) {
            return Err(AlarmError::InvalidDateOfMonth);
        }
        Ok(())
    }

    #[must_use]
    pub fn unit(&self) -> AlarmUnit {
        self.unit
    }

    /// The registers in address order, starting at
    /// [`AlarmUnit::base_register`].
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.unit.register_count()]
    }

    // index of the minutes register within `data`
    fn offset(&self) -> usize {
        match self.unit {
            AlarmUnit::Alarm1 => 1,
            AlarmUnit::Alarm2 => 0,
        }
    }

    /// Seconds register; alarm 2 has none.
    #[must_use]
    pub fn seconds(&self) -> Option<AlarmSeconds> {
        match self.unit {
            AlarmUnit::Alarm1 => Some(AlarmSeconds(self.data[0])),
            AlarmUnit::Alarm2 => None,
        }
    }

    #[must_use]
    pub fn minutes(&self) -> AlarmMinutes {
        AlarmMinutes(self.data[self.offset()])
    }

    #[must_use]
    pub fn hours(&self) -> AlarmHours {
        AlarmHours(self.data[self.offset() + 1])
    }

    #[must_use]
    pub fn day_date(&self) -> AlarmDayDate {
        AlarmDayDate(self.data[self.offset() + 2])
    }

    /// Collects the don't-care bits and DY/DT into the table's bitmask layout.
    #[must_use]
    pub fn mode_bits(&self) -> u8 {
        let mut bits = 0;
        if self.seconds().is_some_and(|s| s.alarm_mask1()) {
            bits |= SECONDS_MASKED;
        }
        if self.minutes().alarm_mask2() {
            bits |= MINUTES_MASKED;
        }
        if self.hours().alarm_mask3() {
            bits |= HOURS_MASKED;
        }
        let day_date = self.day_date();
        if day_date.alarm_mask4() {
            bits |= DAY_MASKED;
        }
        if day_date.day_date_select() == DayDateSelect::Day {
            bits |= DAY_OF_WEEK;
        }
        bits
    }

    /// The named mode the registers are in, if any.
    #[must_use]
    pub fn match_mode(&self) -> Option<MatchMode> {
        let bits = self.mode_bits();
        let ordinal = self.unit.mode_table().iter().position(|&b| b == bits)?;
        MatchMode::from_ordinal(self.unit, u8::try_from(ordinal).ok()?).ok()
    }

    /// Decodes the time fields and the match mode.
    ///
    /// Fields the comparator looks at must hold valid BCD. Masked fields are
    /// decoded when they can be and read as 0 otherwise. An unrecognized
    /// mask combination is reported as `None`, not as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a compared field holds an invalid value.
    pub fn decode(&self) -> Result<(AlarmTime, Option<MatchMode>), AlarmError> {
        let seconds = match self.seconds() {
            Some(reg) => Self::field(
                reg.alarm_mask1(),
                from_bcd(reg.ten_seconds(), reg.seconds(), 0, 59),
                AlarmError::InvalidTime("seconds must be 0-59"),
            )?,
            None => 0,
        };

        let reg = self.minutes();
        let minutes = Self::field(
            reg.alarm_mask2(),
            from_bcd(reg.ten_minutes(), reg.minutes(), 0, 59),
            AlarmError::InvalidTime("minutes must be 0-59"),
        )?;

        let reg = self.hours();
        let hours = Self::field(
            reg.alarm_mask3(),
            decode_hours(Hours(reg.0 & 0x7F)),
            AlarmError::InvalidTime("hours must be 0-23"),
        )?;

        let reg = self.day_date();
        let day = match reg.day_date_select() {
            DayDateSelect::Day => Self::field(
                reg.alarm_mask4(),
                from_bcd(0, reg.day_or_date(), 1, 7),
                AlarmError::InvalidDayOfWeek,
            )?,
            DayDateSelect::Date => Self::field(
                reg.alarm_mask4(),
                from_bcd(reg.ten_date(), reg.day_or_date(), 1, 31),
                AlarmError::InvalidDateOfMonth,
            )?,
        };

        let mode = self.match_mode();
        if mode.is_none() {
            debug!("alarm mode bits {} match no mode", self.mode_bits());
        }

        Ok((
            AlarmTime {
                hours,
                minutes,
                seconds,
                day,
            },
            mode,
        ))
    }

    fn field(masked: bool, value: Option<u8>, error: AlarmError) -> Result<u8, AlarmError> {
        match value {
            Some(value) => Ok(value),
            None if masked => Ok(0),
            None => Err(error),
        }
    }
}

/// Decodes the registers of `unit`, read starting at its base register.
///
/// # Errors
///
/// Returns an error if `bytes` has the wrong length for the unit or a compared
/// field holds an invalid value.
pub fn decode_alarm(
    bytes: &[u8],
    unit: AlarmUnit,
) -> Result<(AlarmTime, Option<MatchMode>), AlarmError> {
    AlarmRegisters::from_bytes(unit, bytes)?.decode()
}

/// Encodes an alarm for the unit carried by `mode`, hours in 24-hour format.
///
/// # Errors
///
/// Returns an error if any field is out of range for the mode.
pub fn encode_alarm(time: &AlarmTime, mode: MatchMode) -> Result<AlarmRegisters, AlarmError> {
    AlarmRegisters::encode(time, mode, TimeRepresentation::TwentyFourHour)
}
