use crate::tle::TleError;

/// Split line-delimited text into `(name, line1, line2)`.
///
/// Blank lines are skipped and trailing whitespace is dropped from every line.
/// Anything after the third non-blank line is ignored, so a multi-object feed
/// yields its first entry.
pub fn parse_tle_lines(text: &str) -> Result<(String, String, String), TleError> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end())
        .filter(|l| !l.trim().is_empty())
        .take(3)
        .collect();

    match lines.as_slice() {
        [name, line1, line2] => Ok((
            name.trim().to_string(),
            line1.to_string(),
            line2.to_string(),
        )),
        other => Err(TleError::InvalidFormat(other.len())),
    }
}
