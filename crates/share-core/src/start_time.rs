use serde::Serialize;

/// Seconds into the video at which playback should begin.
///
/// Derived from the `time` query parameter on every render. An absent,
/// unparsable, negative or zero value resolves to 0, so an explicit `time=0`
/// cannot be told apart from no parameter at all.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct StartTimeOffset(f64);

impl StartTimeOffset {
    pub fn from_query(raw: Option<&str>) -> Self {
        let secs = raw.and_then(parse_float_prefix).unwrap_or(0.0);
        if secs.is_finite() && secs > 0.0 {
            Self(secs)
        } else {
            Self(0.0)
        }
    }

    pub fn seconds(self) -> f64 {
        self.0
    }
}

/// Parse the longest leading float literal, ignoring trailing garbage
/// (`"12.5s"` gives 12.5).
fn parse_float_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}
