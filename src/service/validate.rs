//! Request checks that run before any engine work.
//!
//! Positions are UTF-16 offsets and may sit anywhere in `0..=len`.

use super::error::{ServiceError, ServiceResult};

/// Length of `code` in UTF-16 code units.
pub fn utf16_len(code: &str) -> usize {
    code.encode_utf16().count()
}

pub fn position(position: i64, code: &str) -> ServiceResult<usize> {
    let len = utf16_len(code);
    if position < 0 {
        return Err(ServiceError::validation(format!("position {position} is negative")));
    }
    match usize::try_from(position) {
        Ok(p) if p <= len => Ok(p),
        _ => Err(ServiceError::validation(format!(
            "position {position} is past the end of the code (length {len})"
        ))),
    }
}

/// The formatting range, or `None` for the whole document. A range only
/// applies when either end is positive.
pub fn format_span(start: i64, end: i64, code: &str) -> ServiceResult<Option<(usize, usize)>> {
    if start <= 0 && end <= 0 {
        return Ok(None);
    }
    let len = utf16_len(code);
    let in_bounds = 0 <= start && start <= end && usize::try_from(end).is_ok_and(|e| e <= len);
    if !in_bounds {
        return Err(ServiceError::validation(format!(
            "format range {start}..{end} is invalid for code of length {len}"
        )));
    }
    Ok(Some((start as usize, end as usize)))
}

pub fn new_name(name: &str) -> ServiceResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("new name is empty"));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions() {
        assert_eq!(position(0, "").unwrap(), 0);
        assert_eq!(position(3, "abc").unwrap(), 3);
        assert!(position(-1, "abc").is_err());
        assert!(position(4, "abc").is_err());
    }

    #[test]
    fn positions_count_utf16_units() {
        // One astral char is two units.
        assert_eq!(position(2, "😀").unwrap(), 2);
        assert!(position(3, "😀").is_err());
    }

    #[test]
    fn format_span_rules() {
        assert_eq!(format_span(0, 0, "abc").unwrap(), None);
        assert_eq!(format_span(-4, 0, "abc").unwrap(), None);
        assert_eq!(format_span(1, 3, "abc").unwrap(), Some((1, 3)));
        assert_eq!(format_span(0, 2, "abc").unwrap(), Some((0, 2)));
        assert!(format_span(2, 1, "abc").is_err());
        assert!(format_span(1, 4, "abc").is_err());
        assert!(format_span(-1, 2, "abc").is_err());
    }

    #[test]
    fn new_names() {
        assert_eq!(new_name(" total ").unwrap(), "total");
        assert!(new_name("   ").is_err());
    }
}
