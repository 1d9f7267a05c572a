//! Heuristic scan of recognized text for plausible grade values, and
//! the reduction of those values to a single rounded average.
//!
//! Naive "any digit" scanning over an attestation would pick up row
//! numbers, term numbers, and dates, so lines are first gated by a
//! subject vocabulary and by qualitative-grade keyword stems. The stems
//! include several known ways the engine corrupts the Cyrillic words
//! for "satisfactory", "good", and "excellent" on noisy scans.

use once_cell::sync::Lazy;
use regex::Regex;

/// Admissible grade range on the five-point scale.
pub const GRADE_MIN: u8 = 2;
pub const GRADE_MAX: u8 = 5;

/// Subject names that mark a line as a grade row, including common
/// misrecognition variants ("о5ж" for "обж").
const SUBJECTS: &[&str] = &[
    "русский язык",
    "литература",
    "алгебра",
    "геометрия",
    "математика",
    "информатика",
    "история",
    "обществознание",
    "география",
    "биология",
    "физика",
    "химия",
    "физкультура",
    "музыка",
    "изобразительное искусство",
    "технология",
    "обж",
    "о5ж",
    "искусство",
    "иностранный язык",
    "английский язык",
    "живопись",
    "опд",
    "проектная деятельность",
];

/// Stems of qualitative grade words plus their known corrupted forms.
const QUALITATIVE_STEMS: &[&str] = &[
    "удовл", "хорош", "отлич", "баова", "оронко", "удова", "хороше", "бдовь", "отлично",
];

/// Standalone single digit in the admissible range. `\b` is
/// Unicode-aware, so a digit glued to a Cyrillic letter or embedded in
/// a longer number does not match.
static GRADE_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([2-5])\b").expect("grade digit pattern compiles"));

/// A recognized grade digit together with the line it came from.
/// Ephemeral: lives only for the duration of one job execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeToken {
    pub value: u8,
    pub line: String,
}

/// Scan recognized text for grade tokens, in reading order.
pub fn extract_tokens(text: &str) -> Vec<GradeToken> {
    let mut tokens = Vec::new();

    for line in text.lines() {
        let lowered = line.to_lowercase();
        let eligible = SUBJECTS.iter().any(|subject| lowered.contains(subject))
            || QUALITATIVE_STEMS.iter().any(|stem| lowered.contains(stem));
        if !eligible {
            continue;
        }

        // Digits before the first letter are row/item numbers, not
        // grades; only the remainder of the line is scanned.
        let Some((start, _)) = line.char_indices().find(|(_, c)| c.is_alphabetic()) else {
            continue;
        };
        let tail = line[start..].to_lowercase();

        for capture in GRADE_DIGIT.captures_iter(&tail) {
            let Ok(value) = capture[1].parse::<u8>() else {
                continue;
            };
            tracing::debug!(grade = value, line = %line.trim(), "grade token found");
            tokens.push(GradeToken {
                value,
                line: line.trim().to_string(),
            });
        }
    }

    tokens
}

/// Arithmetic mean of the token values rounded to one decimal place,
/// or `None` when nothing was extracted. The empty case is a content
/// outcome, not an execution error.
pub fn average(tokens: &[GradeToken]) -> Option<f64> {
    if tokens.is_empty() {
        return None;
    }

    let sum: u32 = tokens.iter().map(|token| u32::from(token.value)).sum();
    let mean = f64::from(sum) / tokens.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}
