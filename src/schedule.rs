use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};

use crate::error::ReportError;

/// Snapshot dates for every `anchor` weekday back to `earliest`, newest first.
pub fn status_dates(anchor: Weekday, earliest: NaiveDate) -> Vec<NaiveDate> {
    status_dates_from(Utc::now().date_naive(), anchor, earliest)
}

/// Same as [`status_dates`] with an explicit "today".
///
/// The most recent anchor is never `today` itself: when today falls on the
/// anchor weekday the series starts a full week back.
pub fn status_dates_from(
    today: NaiveDate,
    anchor: Weekday,
    earliest: NaiveDate,
) -> Vec<NaiveDate> {
    let days_back = match (7 + today.weekday().num_days_from_sunday()
        - anchor.num_days_from_sunday())
        % 7
    {
        0 => 7,
        n => n,
    };
    let first = today - Duration::days(i64::from(days_back));

    std::iter::successors(Some(first), |d| d.checked_sub_signed(Duration::weeks(1)))
        .take_while(|d| *d >= earliest)
        .collect()
}

/// Parse a weekday given either as an index (0 = Sunday .. 6 = Saturday) or a name.
pub fn parse_weekday(value: &str) -> Result<Weekday, ReportError> {
    if let Ok(index) = value.parse::<u8>() {
        return weekday_from_index(index);
    }
    value
        .parse::<Weekday>()
        .map_err(|_| ReportError::InvalidWeekday(value.to_string()))
}

pub fn weekday_from_index(index: u8) -> Result<Weekday, ReportError> {
    let day = match index {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        _ => return Err(ReportError::InvalidWeekday(index.to_string())),
    };
    Ok(day)
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ReportError::InvalidDate(value.to_string()))
}
