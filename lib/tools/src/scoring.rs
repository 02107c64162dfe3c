//! BANT lead-quality scoring.

/// Awarded for reaching scoring at all.
const BASE: u8 = 20;
/// Awarded for a known budget or timeline.
const KNOWN: u8 = 25;
/// Awarded for a strong budget or urgent timeline.
const STRONG: u8 = 15;

const URGENT_WORDS: [&str; 5] = ["immediate", "urgent", "soon", "week", "month"];

fn known(value: Option<&str>) -> Option<String> {
    value
        .map(str::to_lowercase)
        .filter(|v| !v.is_empty() && v != "unknown" && v != "none")
}

/// Scores a lead from 20 to 100.
///
/// A known budget adds 25, plus 15 if it mentions "high" or contains a
/// digit. A known timeline adds 25, plus 15 if it sounds urgent.
#[must_use]
pub fn bant_score(budget: Option<&str>, timeline: Option<&str>) -> u8 {
    let mut score = BASE;

    if let Some(budget) = known(budget) {
        score += KNOWN;
        if budget.contains("high") || budget.chars().any(|c| c.is_ascii_digit()) {
            score += STRONG;
        }
    }

    if let Some(timeline) = known(timeline) {
        score += KNOWN;
        if URGENT_WORDS.iter().any(|word| timeline.contains(word)) {
            score += STRONG;
        }
    }

    score.min(100)
}
