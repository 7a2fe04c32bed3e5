//! Filesystem-safe download names derived from article titles.

/// Default maximum length for a sanitized filename stem.
pub const MAX_FILENAME_LEN: usize = 80;

/// Derives a filesystem-safe base name from a title.
///
/// Keeps alphanumerics, spaces, hyphens, and underscores; every other
/// character becomes `_`, one for one. Truncated to [`MAX_FILENAME_LEN`]
/// characters. Never fails, even on empty input.
pub fn safe_filename(title: &str) -> String {
    safe_filename_truncated(title, MAX_FILENAME_LEN)
}

/// [`safe_filename`] with an explicit length limit.
pub fn safe_filename_truncated(title: &str, max_len: usize) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') { c } else { '_' })
        .take(max_len)
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("C++: A History?", "C___ A History_")]
    #[case("Plain Title", "Plain Title")]
    #[case("Ä/B", "Ä_B")]
    #[case("snake_case-name", "snake_case-name")]
    #[case("", "")]
    fn test_safe_filename(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(safe_filename(input), expected);
    }

    #[test]
    fn test_safe_filename_truncates() {
        let long = "x".repeat(200);
        assert_eq!(safe_filename(&long).chars().count(), MAX_FILENAME_LEN);
        assert_eq!(safe_filename_truncated(&long, 10).chars().count(), 10);
    }
}
