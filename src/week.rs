use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveTime};

/// Monday-to-Sunday range of one calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    /// Monday 00:00:00.000000.
    pub start: DateTime<FixedOffset>,
    /// Sunday 23:59:59.999999.
    pub end: DateTime<FixedOffset>,
}

impl WeekWindow {
    /// Window for the week containing `reference`, keeping its UTC offset.
    pub fn containing(reference: DateTime<FixedOffset>) -> Self {
        let offset = *reference.offset();
        let days_since_monday = reference.weekday().num_days_from_monday() as i64;
        let monday = reference.date_naive() - Duration::days(days_since_monday);

        let start_local = monday.and_time(NaiveTime::MIN);
        let end_local = start_local + Duration::days(7) - Duration::microseconds(1);

        Self {
            start: DateTime::from_naive_utc_and_offset(start_local - offset, offset),
            end: DateTime::from_naive_utc_and_offset(end_local - offset, offset),
        }
    }

    /// Window for the current week in local time.
    pub fn current() -> Self {
        Self::containing(Local::now().fixed_offset())
    }

    /// Window for `reference`, or for the current week when absent.
    pub fn for_reference(reference: Option<DateTime<FixedOffset>>) -> Self {
        reference.map(Self::containing).unwrap_or_else(Self::current)
    }

    /// Natural key of the weekly summary record.
    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }
}
