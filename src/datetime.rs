//! Time codec for the DS3231's seven timekeeping registers.
//!
//! Converts between the BCD register block at 0x00-0x06 and [`CalendarTime`],
//! and decodes the temperature and aging-offset registers.
//!
//! # Century policy
//!
//! The century bit (bit 7 of the month register) is always written set and is
//! ignored on read. The driver therefore serves the years 2000-2099 only and
//! assumes the chip never crosses a century while in service.
//!
//! # Error Handling
//!
//! Conversion errors are reported via [`DS3231DateTimeError`].

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::{
    AgingOffset, Date, Day, Hours, Minutes, Month, Seconds, Temperature, TemperatureFraction,
    TimeRepresentation, Year,
};

/// A wall-clock reading as stored by the DS3231.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarTime {
    /// Absolute year, 2000-2099
    pub year: u16,
    /// 1-12
    pub month: u8,
    /// Day of month, 1-31
    pub day: u8,
    /// 0-23
    pub hour: u8,
    /// 0-59
    pub minute: u8,
    /// 0-59
    pub second: u8,
    /// Day of week, 0 (Monday) to 6 (Sunday). The chip only counts this
    /// register, so its relation to the date is up to the caller.
    pub weekday: u8,
}

impl CalendarTime {
    /// Converts to a chrono `NaiveDateTime`. The weekday field is dropped
    /// since chrono derives it from the date.
    ///
    /// # Errors
    ///
    /// Returns [`DS3231DateTimeError::InvalidDateTime`] if the fields do not
    /// name a real date and time.
    pub fn to_naive_datetime(&self) -> Result<NaiveDateTime, DS3231DateTimeError> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
            )
        })
        .ok_or(DS3231DateTimeError::InvalidDateTime)
    }
}

impl TryFrom<&NaiveDateTime> for CalendarTime {
    type Error = DS3231DateTimeError;

    fn try_from(datetime: &NaiveDateTime) -> Result<Self, Self::Error> {
        let narrow = |v: u32| u8::try_from(v).map_err(|_| DS3231DateTimeError::InvalidDateTime);
        let year = match datetime.year() {
            y if y < 2000 => return Err(DS3231DateTimeError::YearNotAfter1999),
            y if y > 2099 => return Err(DS3231DateTimeError::YearNotBefore2100),
            y => u16::try_from(y).map_err(|_| DS3231DateTimeError::InvalidDateTime)?,
        };
        Ok(CalendarTime {
            year,
            month: narrow(datetime.month())?,
            day: narrow(datetime.day())?,
            hour: narrow(datetime.hour())?,
            minute: narrow(datetime.minute())?,
            // leap seconds are folded into :59 by chrono's second()
            second: narrow(datetime.second())?,
            weekday: narrow(datetime.weekday().num_days_from_monday())?,
        })
    }
}

/// Splits `value` into BCD (ones, tens) digits, rejecting anything above
/// `max_value`.
pub(crate) fn make_bcd(value: u32, max_value: u32) -> Result<(u8, u8), DS3231DateTimeError> {
    if value > max_value {
        return Err(DS3231DateTimeError::InvalidDateTime);
    }
    let ones = u8::try_from(value % 10).map_err(|_| DS3231DateTimeError::InvalidDateTime)?;
    let tens = u8::try_from(value / 10).map_err(|_| DS3231DateTimeError::InvalidDateTime)?;
    Ok((ones, tens))
}

/// Joins BCD digits, returning `None` for a digit above 9 or a value outside
/// `min..=max`.
pub(crate) fn from_bcd(tens: u8, ones: u8, min: u8, max: u8) -> Option<u8> {
    if ones > 9 || tens > 9 {
        return None;
    }
    let value = 10 * tens + ones;
    (min..=max).contains(&value).then_some(value)
}

/// Encodes a 0-23 hour into the hours register layout.
pub(crate) fn convert_hours(
    hour: u32,
    time_representation: TimeRepresentation,
) -> Result<Hours, DS3231DateTimeError> {
    if hour > 23 {
        return Err(DS3231DateTimeError::InvalidDateTime);
    }
    let mut value = Hours::default();
    value.set_time_representation(time_representation);

    match time_representation {
        TimeRepresentation::TwentyFourHour => {
            let ones = u8::try_from(hour % 10).map_err(|_| DS3231DateTimeError::InvalidDateTime)?;
            value.set_hours(ones);
            value.set_ten_hours(u8::from((10..20).contains(&hour)));
            value.set_pm_or_twenty_hours(u8::from(hour >= 20));
        }
        TimeRepresentation::TwelveHour => {
            let (hour12, is_pm) = match hour {
                0 => (12, false),
                1..=11 => (hour, false),
                12 => (12, true),
                _ => (hour - 12, true),
            };
            let (ones, tens) = make_bcd(hour12, 12)?;
            value.set_hours(ones);
            value.set_ten_hours(tens);
            value.set_pm_or_twenty_hours(u8::from(is_pm));
        }
    }
    Ok(value)
}

/// Decodes bits 6:0 of an hours register to 0-23.
///
/// In 12-hour mode the PM hour is `(value % 12) + 12`, computed from the
/// decoded 1-12 value rather than the raw register byte.
pub(crate) fn decode_hours(hours: Hours) -> Option<u8> {
    match hours.time_representation() {
        TimeRepresentation::TwentyFourHour => {
            let tens = 2 * hours.pm_or_twenty_hours() + hours.ten_hours();
            from_bcd(tens, hours.hours(), 0, 23)
        }
        TimeRepresentation::TwelveHour => {
            let value = from_bcd(hours.ten_hours(), hours.hours(), 1, 12)?;
            if hours.pm_or_twenty_hours() != 0 {
                Some(value % 12 + 12)
            } else {
                Some(value % 12)
            }
        }
    }
}

/// The seven timekeeping registers as typed bitfields.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct DS3231DateTime {
    seconds: Seconds,
    minutes: Minutes,
    hours: Hours,
    day: Day,
    date: Date,
    month: Month,
    year: Year,
}

impl DS3231DateTime {
    fn convert_seconds(seconds: u8) -> Result<Seconds, DS3231DateTimeError> {
        let (ones, tens) = make_bcd(u32::from(seconds), 59)?;
        let mut value = Seconds::default();
        value.set_seconds(ones);
        value.set_ten_seconds(tens);
        Ok(value)
    }

    fn convert_minutes(minutes: u8) -> Result<Minutes, DS3231DateTimeError> {
        let (ones, tens) = make_bcd(u32::from(minutes), 59)?;
        let mut value = Minutes::default();
        value.set_minutes(ones);
        value.set_ten_minutes(tens);
        Ok(value)
    }

    fn convert_day(weekday: u8) -> Result<Day, DS3231DateTimeError> {
        if weekday > 6 {
            return Err(DS3231DateTimeError::InvalidDateTime);
        }
        let mut value = Day::default();
        value.set_day(weekday + 1);
        Ok(value)
    }

    fn convert_date(date: u8) -> Result<Date, DS3231DateTimeError> {
        if date == 0 {
            return Err(DS3231DateTimeError::InvalidDateTime);
        }
        let (ones, tens) = make_bcd(u32::from(date), 31)?;
        let mut value = Date::default();
        value.set_date(ones);
        value.set_ten_date(tens);
        Ok(value)
    }

    fn convert_month(month: u8) -> Result<Month, DS3231DateTimeError> {
        if month == 0 {
            return Err(DS3231DateTimeError::InvalidDateTime);
        }
        let (ones, tens) = make_bcd(u32::from(month), 12)?;
        let mut value = Month::default();
        value.set_month(ones);
        value.set_ten_month(tens);
        value.set_century(true);
        Ok(value)
    }

    fn convert_year(year: u16) -> Result<Year, DS3231DateTimeError> {
        if year < 2000 {
            error!("Year {} is too early! must be greater than 1999", year);
            return Err(DS3231DateTimeError::YearNotAfter1999);
        }
        if year > 2099 {
            error!("Year {} is too late! must be before 2100", year);
            return Err(DS3231DateTimeError::YearNotBefore2100);
        }
        let (ones, tens) = make_bcd(u32::from(year - 2000), 99)?;
        let mut value = Year::default();
        value.set_year(ones);
        value.set_ten_year(tens);
        Ok(value)
    }

    pub(crate) fn from_calendar(
        time: &CalendarTime,
        time_representation: TimeRepresentation,
    ) -> Result<Self, DS3231DateTimeError> {
        let raw = DS3231DateTime {
            seconds: Self::convert_seconds(time.second)?,
            minutes: Self::convert_minutes(time.minute)?,
            hours: convert_hours(u32::from(time.hour), time_representation)?,
            day: Self::convert_day(time.weekday)?,
            date: Self::convert_date(time.day)?,
            month: Self::convert_month(time.month)?,
            year: Self::convert_year(time.year)?,
        };
        // 31 April and friends
        time.to_naive_datetime()?;

        debug!("raw datetime: {:?}", <[u8; 7]>::from(&raw));
        Ok(raw)
    }

    pub(crate) fn into_calendar(self) -> Result<CalendarTime, DS3231DateTimeError> {
        let second = from_bcd(self.seconds.ten_seconds(), self.seconds.seconds(), 0, 59)
            .ok_or(DS3231DateTimeError::InvalidDateTime)?;
        let minute = from_bcd(self.minutes.ten_minutes(), self.minutes.minutes(), 0, 59)
            .ok_or(DS3231DateTimeError::InvalidDateTime)?;
        let hour = decode_hours(self.hours).ok_or(DS3231DateTimeError::InvalidDateTime)?;
        let weekday = match self.day.day() {
            d @ 1..=7 => d - 1,
            _ => return Err(DS3231DateTimeError::InvalidDateTime),
        };
        let day = from_bcd(self.date.ten_date(), self.date.date(), 1, 31)
            .ok_or(DS3231DateTimeError::InvalidDateTime)?;
        let month = from_bcd(self.month.ten_month(), self.month.month(), 1, 12)
            .ok_or(DS3231DateTimeError::InvalidDateTime)?;
        let year = from_bcd(self.year.ten_year(), self.year.year(), 0, 99)
            .ok_or(DS3231DateTimeError::InvalidDateTime)?;

        debug!(
            "raw_hour={} h={} m={} s={}",
            self.hours.0, hour, minute, second
        );

        let time = CalendarTime {
            year: 2000 + u16::from(year),
            month,
            day,
            hour,
            minute,
            second,
            weekday,
        };
        time.to_naive_datetime()?;
        Ok(time)
    }
}

impl From<[u8; 7]> for DS3231DateTime {
    fn from(data: [u8; 7]) -> Self {
        DS3231DateTime {
            seconds: Seconds(data[0]),
            minutes: Minutes(data[1]),
            hours: Hours(data[2]),
            day: Day(data[3]),
            date: Date(data[4]),
            month: Month(data[5]),
            year: Year(data[6]),
        }
    }
}

impl From<&DS3231DateTime> for [u8; 7] {
    fn from(dt: &DS3231DateTime) -> [u8; 7] {
        [
            dt.seconds.0,
            dt.minutes.0,
            dt.hours.0,
            dt.day.0,
            dt.date.0,
            dt.month.0,
            dt.year.0,
        ]
    }
}

/// Decodes the seven timekeeping registers (0x00-0x06, in address order).
///
/// # Errors
///
/// Returns [`DS3231DateTimeError::InvalidDateTime`] if any register holds a
/// non-BCD digit, a value outside its range, or a date that does not exist.
pub fn decode_time(bytes: &[u8; 7]) -> Result<CalendarTime, DS3231DateTimeError> {
    DS3231DateTime::from(*bytes).into_calendar()
}

/// Encodes `time` into the seven timekeeping registers, hours in 24-hour
/// format.
///
/// # Errors
///
/// Returns an error if any field is out of range or the year is outside
/// 2000-2099.
pub fn encode_time(time: &CalendarTime) -> Result<[u8; 7], DS3231DateTimeError> {
    encode_time_with(time, TimeRepresentation::TwentyFourHour)
}

/// Like [`encode_time`], with the hours register in the given format.
///
/// # Errors
///
/// Returns an error if any field is out of range or the year is outside
/// 2000-2099.
pub fn encode_time_with(
    time: &CalendarTime,
    time_representation: TimeRepresentation,
) -> Result<[u8; 7], DS3231DateTimeError> {
    let raw = DS3231DateTime::from_calendar(time, time_representation)?;
    Ok((&raw).into())
}

/// Temperature in degrees Celsius from the MSB (0x11) and LSB (0x12)
/// registers.
#[must_use]
pub fn decode_temperature(msb: u8, lsb: u8) -> f32 {
    let degrees = Temperature(msb).temperature();
    let quarters = TemperatureFraction(lsb).temperature_fraction();
    f32::from(degrees) + f32::from(quarters) * 0.25
}

/// Aging offset register as a signed trim value.
#[must_use]
pub fn decode_aging_offset(byte: u8) -> i8 {
    AgingOffset(byte).aging_offset()
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors that can occur during DS3231 date/time conversion or validation.
pub enum DS3231DateTimeError {
    /// A field is out of range, a register holds invalid BCD, or the date
    /// does not exist
    InvalidDateTime,
    /// The year is before 2000
    YearNotAfter1999,
    /// The year is after 2099
    YearNotBefore2100,
}
