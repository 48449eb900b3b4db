use calamine::Data;
use chrono::{NaiveDate, NaiveTime};

/// Date of a spreadsheet cell: native date cells as-is, text parsed
/// day-first. Anything else is `None`.
pub fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|d| d.date()),
        Data::DateTimeIso(s) | Data::String(s) => parse_day_first(s),
        _ => None,
    }
}

/// Parse `"DD/MM/YYYY"` (also `-` or `.` separated, 2-digit years, optional
/// time part) into a date. A leading 4-digit year switches to `Y-M-D`.
/// When the day-first reading is impossible (`"02/13/2024"`) the month-first
/// one is tried.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let (date_part, time_part) = match s.find(|c: char| c == ' ' || c == 'T') {
        Some(i) => (&s[..i], Some(s[i + 1..].trim())),
        None => (s, None),
    };
    if let Some(t) = time_part {
        if !t.is_empty() && !valid_time(t) {
            return None;
        }
    }

    let parts: Vec<&str> = date_part.split(['/', '-', '.']).collect();
    let numeric = |p: &&str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if parts.len() != 3 || !parts.iter().all(numeric) {
        return None;
    }

    if parts[0].len() == 4 {
        let y: i32 = parts[0].parse().ok()?;
        let m: u32 = parts[1].parse().ok()?;
        let d: u32 = parts[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    let first: u32 = parts[0].parse().ok()?;
    let second: u32 = parts[1].parse().ok()?;
    let year = expand_year(parts[2])?;
    NaiveDate::from_ymd_opt(year, second, first)
        .or_else(|| NaiveDate::from_ymd_opt(year, first, second))
}

fn expand_year(raw: &str) -> Option<i32> {
    let y: i32 = raw.parse().ok()?;
    match raw.len() {
        4 => Some(y),
        // POSIX %y pivot
        2 if y < 69 => Some(2000 + y),
        2 => Some(1900 + y),
        _ => None,
    }
}

fn valid_time(t: &str) -> bool {
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .any(|f| NaiveTime::parse_from_str(t, f).is_ok())
}

/// ISO `YYYY-MM-DD`.
pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
