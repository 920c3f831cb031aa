//! Slug derivation for display names.

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, turns spaces into hyphens, and strips everything that is
/// not a word character or hyphen. Deterministic for a given name.
///
/// ```
/// use bolster_commerce::slug::slugify;
/// assert_eq!(slugify("Egyptian Cotton Sheets (400TC)"), "egyptian-cotton-sheets-400tc");
/// ```
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c == ' ' { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slug() {
        assert_eq!(slugify("Queen Duvet Cover"), "queen-duvet-cover");
    }

    #[test]
    fn test_strips_punctuation() {
        assert_eq!(slugify("Silk & Satin Pillowcase!"), "silk--satin-pillowcase");
    }

    #[test]
    fn test_preserves_digits_and_underscores() {
        assert_eq!(slugify("300 Thread_Count"), "300-thread_count");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(slugify("Linen Throw"), slugify("Linen Throw"));
    }
}
