use chrono::{DateTime, Datelike, Months, Utc};

/// A reset date is expired once it is strictly in the past.
pub fn is_expired(reset_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    reset_date < now
}

pub fn one_month_after(at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    at.checked_add_months(Months::new(1))
}

/// First date after `now` that lies a whole number of calendar months
/// (at least one) after `anchor`.
///
/// Every candidate is computed from the anchor itself, so a day-of-month that
/// had to be clamped in a short month is restored afterwards
/// (Jan 31 -> Feb 29 -> Mar 31). Returns `None` on calendar overflow.
pub fn next_renewal_date(anchor: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let elapsed = (now.year() - anchor.year()) * 12 + now.month() as i32 - anchor.month() as i32;

    // anchor + (elapsed - 1) months always lands in the month before `now`,
    // so the loop settles in at most two iterations.
    let mut months = u32::try_from(elapsed).unwrap_or(0).max(1);

    loop {
        let candidate = anchor.checked_add_months(Months::new(months))?;
        if candidate > now {
            return Some(candidate);
        }
        months = months.checked_add(1)?;
    }
}
