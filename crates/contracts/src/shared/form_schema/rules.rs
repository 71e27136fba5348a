use serde::{Deserialize, Serialize};

/// Fixed-format matchers for text fields, checked by character class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    /// Exactly N ASCII digits (e.g. 12 for an Aadhaar number)
    Digits(usize),
    /// PAN: 5 uppercase letters, 4 digits, 1 uppercase letter
    Pan,
    /// IFSC: 4 uppercase letters, a zero, 6 alphanumerics (11 chars)
    Ifsc,
    /// Monetary amount: digits with an optional 1-2 digit fraction
    Amount,
}

impl PatternKind {
    /// Check a trimmed, non-empty value against the pattern
    pub fn matches(&self, value: &str) -> bool {
        match self {
            PatternKind::Digits(n) => {
                value.len() == *n && value.chars().all(|c| c.is_ascii_digit())
            }
            PatternKind::Pan => {
                let chars: Vec<char> = value.chars().collect();
                chars.len() == 10
                    && chars[0..5].iter().all(|c| c.is_ascii_uppercase())
                    && chars[5..9].iter().all(|c| c.is_ascii_digit())
                    && chars[9].is_ascii_uppercase()
            }
            PatternKind::Ifsc => {
                let chars: Vec<char> = value.chars().collect();
                chars.len() == 11
                    && chars[0..4].iter().all(|c| c.is_ascii_uppercase())
                    && chars[4] == '0'
                    && chars[5..11]
                        .iter()
                        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            }
            PatternKind::Amount => match value.split_once('.') {
                Some((int, frac)) => {
                    !int.is_empty()
                        && int.chars().all(|c| c.is_ascii_digit())
                        && (1..=2).contains(&frac.len())
                        && frac.chars().all(|c| c.is_ascii_digit())
                }
                None => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
            },
        }
    }

    /// Human-readable format description for error messages
    pub fn describe(&self) -> String {
        match self {
            PatternKind::Digits(n) => format!("must contain exactly {} digits", n),
            PatternKind::Pan => "must match the PAN format (AAAAA9999A)".to_string(),
            PatternKind::Ifsc => "must be a valid 11-character IFSC code".to_string(),
            PatternKind::Amount => "must be an amount like 12500 or 12500.50".to_string(),
        }
    }
}

/// Semantic role of a date field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRole {
    /// Date of birth: must lie at least `min_age_years` before today
    BirthDate { min_age_years: u32 },
    /// Date of joining: not after today and, when `birth_field` is set,
    /// not before the date of birth (error keyed to the joining field)
    Joining { birth_field: Option<String> },
}

/// Validation rule kinds, evaluated in declared order per field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    /// Trimmed value must be non-empty
    RequiredText,
    /// Trimmed value must fully match the pattern; empty values pass
    /// unless the rule is marked required
    Pattern(PatternKind),
    /// Date constraints per the field's semantic role
    DateRule(DateRole),
    /// A required attachment slot must be occupied
    FilePresence { slot: String },
}

/// One validation rule bound to a field (or slot, for file presence)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Field name the error is keyed to; for `FilePresence` this is the
    /// slot name
    pub field: String,
    pub kind: RuleKind,
    /// Required-and-checked vs checked-if-present. The same field can be
    /// required in one schema and optional in another.
    pub required: bool,
}

impl FieldRule {
    pub fn required_text(field: &str) -> Self {
        Self {
            field: field.to_string(),
            kind: RuleKind::RequiredText,
            required: true,
        }
    }

    /// Format-checked only when a value is present
    pub fn pattern(field: &str, kind: PatternKind) -> Self {
        Self {
            field: field.to_string(),
            kind: RuleKind::Pattern(kind),
            required: false,
        }
    }

    /// Required and format-checked
    pub fn required_pattern(field: &str, kind: PatternKind) -> Self {
        Self {
            field: field.to_string(),
            kind: RuleKind::Pattern(kind),
            required: true,
        }
    }

    pub fn birth_date(field: &str, min_age_years: u32) -> Self {
        Self {
            field: field.to_string(),
            kind: RuleKind::DateRule(DateRole::BirthDate { min_age_years }),
            required: true,
        }
    }

    pub fn joining_date(field: &str, birth_field: &str) -> Self {
        Self {
            field: field.to_string(),
            kind: RuleKind::DateRule(DateRole::Joining {
                birth_field: Some(birth_field.to_string()),
            }),
            required: true,
        }
    }

    pub fn file_required(slot: &str) -> Self {
        Self {
            field: slot.to_string(),
            kind: RuleKind::FilePresence {
                slot: slot.to_string(),
            },
            required: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_pattern() {
        assert!(PatternKind::Digits(12).matches("123456789012"));
        assert!(!PatternKind::Digits(12).matches("12345678901"));
        assert!(!PatternKind::Digits(12).matches("12345678901a"));
    }

    #[test]
    fn test_pan_pattern() {
        assert!(PatternKind::Pan.matches("ABCDE1234F"));
        assert!(!PatternKind::Pan.matches("abcde1234f"));
        assert!(!PatternKind::Pan.matches("ABCD12345F"));
        assert!(!PatternKind::Pan.matches("ABCDE1234"));
    }

    #[test]
    fn test_ifsc_pattern() {
        assert!(PatternKind::Ifsc.matches("SBIN0001234"));
        assert!(!PatternKind::Ifsc.matches("SBIN1001234"));
        assert!(!PatternKind::Ifsc.matches("SBIN000123"));
    }

    #[test]
    fn test_amount_pattern() {
        assert!(PatternKind::Amount.matches("12500"));
        assert!(PatternKind::Amount.matches("12500.5"));
        assert!(PatternKind::Amount.matches("12500.50"));
        assert!(!PatternKind::Amount.matches("12500.505"));
        assert!(!PatternKind::Amount.matches("12,500"));
        assert!(!PatternKind::Amount.matches(".50"));
        assert!(!PatternKind::Amount.matches("12500."));
    }
}
