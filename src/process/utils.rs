use calamine::Data;

/// Cell holds nothing worth keeping (no value, or only whitespace).
pub fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Numeric reading of a cell. Text must be a plain decimal or exponent
/// number; thousands separators (`1,234.5`) are not accepted. Non-finite
/// values count as unparsable.
pub fn cell_number(cell: &Data) -> Option<f64> {
    let v = match cell {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::Bool(b) => f64::from(u8::from(*b)),
        Data::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Integer reading of a cell; fractional values truncate toward zero.
pub fn cell_integer(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::String(s) => match s.trim().parse::<i64>() {
            Ok(i) => Some(i),
            Err(_) => cell_number(cell).map(|f| f.trunc() as i64),
        },
        other => cell_number(other).map(|f| f.trunc() as i64),
    }
}

/// Text rendering of any cell. Whole floats drop their `.0` so numeric
/// identifiers read back the way they were typed.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => naive.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::Error(e) => e.to_string(),
    }
}

/// Replace each line break character with a single space.
pub fn scrub_newlines(raw: &str) -> String {
    raw.replace(['\n', '\r'], " ")
}
