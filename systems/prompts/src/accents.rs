//! Accent-insensitive comparison of Spanish answers.

/// Bonus awarded for a correct answer typed with its accents.
pub const ACCENT_BONUS: u32 = 10;

fn base_letter(c: char) -> Option<char> {
    let base = match c {
        'á' => 'a',
        'é' => 'e',
        'í' => 'i',
        'ó' => 'o',
        'ú' | 'ü' => 'u',
        'ñ' => 'n',
        'Á' => 'A',
        'É' => 'E',
        'Í' => 'I',
        'Ó' => 'O',
        'Ú' | 'Ü' => 'U',
        'Ñ' => 'N',
        _ => return None,
    };
    Some(base)
}

/// Replaces Spanish accented letters with their unaccented base letter.
#[must_use]
pub fn strip_accents(text: &str) -> String {
    text.chars().map(|c| base_letter(c).unwrap_or(c)).collect()
}

/// Reports whether the text contains any Spanish accented letter.
#[must_use]
pub fn has_accents(text: &str) -> bool {
    text.chars().any(|c| base_letter(c).is_some())
}

/// Compares two strings ignoring case, accents and surrounding whitespace.
#[must_use]
pub fn compare_ignoring_accents(left: &str, right: &str) -> bool {
    strip_accents(&left.trim().to_lowercase()) == strip_accents(&right.trim().to_lowercase())
}

/// Bonus earned by `input` against `correct`.
///
/// Any answer that is correct once accents are ignored and that was typed
/// with at least one accent earns the bonus.
#[must_use]
pub fn accent_bonus(input: &str, correct: &str) -> u32 {
    if compare_ignoring_accents(input, correct) && has_accents(input) {
        ACCENT_BONUS
    } else {
        0
    }
}
