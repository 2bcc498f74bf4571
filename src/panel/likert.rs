use crate::domain::Rating;

/// Decode a free-text answer from the five-point acceptability vocabulary
/// into its 1-5 rating.
///
/// The scale: completely unacceptable -> 1, unacceptable -> 2,
/// neutral -> 3, acceptable -> 4, completely acceptable -> 5.
/// Matching is case- and whitespace-insensitive; "neutral" wins over the
/// acceptability words when both appear. Unrecognized text yields `None`,
/// never a default value.
pub fn decode_likert(text: &str) -> Option<Rating> {
    let normalized = text.to_lowercase().replace(' ', "");

    // "unacceptable" must be checked first since it contains "acceptable".
    let mut rating = if normalized.contains("unacceptable") {
        Some(if normalized.contains("completely") { 1 } else { 2 })
    } else if normalized.contains("acceptable") {
        Some(if normalized.contains("completely") { 5 } else { 4 })
    } else {
        None
    };

    if normalized.contains("neutral") {
        rating = Some(3);
    }

    rating
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_vocabulary() {
        assert_eq!(decode_likert("Completely unacceptable"), Some(1));
        assert_eq!(decode_likert("Somewhat unacceptable"), Some(2));
        assert_eq!(decode_likert("Neutral"), Some(3));
        assert_eq!(decode_likert("Somewhat acceptable"), Some(4));
        assert_eq!(decode_likert("Completely acceptable"), Some(5));
    }

    #[test]
    fn ignores_case_and_spacing() {
        assert_eq!(decode_likert("  COMPLETELY   ACCEPTABLE "), Some(5));
        assert_eq!(decode_likert("un acceptable"), Some(2));
    }

    #[test]
    fn neutral_wins_over_acceptability_words() {
        assert_eq!(decode_likert("Neutral (neither acceptable nor not)"), Some(3));
    }

    #[test]
    fn unrecognized_text_is_none() {
        assert_eq!(decode_likert(""), None);
        assert_eq!(decode_likert("-99"), None);
        assert_eq!(decode_likert("prefer not to say"), None);
    }
}
