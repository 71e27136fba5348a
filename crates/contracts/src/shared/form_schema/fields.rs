use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of a scalar form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Flag,
    Date,
}

/// Current value of a scalar form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Date(Option<NaiveDate>),
}

impl FieldValue {
    /// Empty value for a field kind (create-mode initial state)
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Flag => FieldValue::Flag(false),
            FieldKind::Date => FieldValue::Date(None),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Flag(_) => FieldKind::Flag,
            FieldValue::Date(_) => FieldKind::Date,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(v) => *v,
            _ => None,
        }
    }

    /// Wire representation used in submission payloads and fetched records
    pub fn to_wire(&self) -> String {
        match self {
            FieldValue::Text(v) => v.clone(),
            FieldValue::Flag(v) => if *v { "true" } else { "false" }.to_string(),
            FieldValue::Date(Some(d)) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Date(None) => String::new(),
        }
    }

    /// Parse a wire string back into a typed value
    ///
    /// An unparseable date becomes `Date(None)` rather than an error: the
    /// validator reports the absence, the form stays openable.
    pub fn from_wire(kind: FieldKind, raw: &str) -> Self {
        match kind {
            FieldKind::Text => FieldValue::Text(raw.to_string()),
            FieldKind::Flag => FieldValue::Flag(matches!(raw.trim(), "true" | "1")),
            FieldKind::Date => {
                FieldValue::Date(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
            }
        }
    }
}

/// Mapping field name -> current value
pub type FieldSet = HashMap<String, FieldValue>;

/// Definition of a scalar form field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Technical field name (payload key)
    pub name: String,
    /// Data kind
    pub kind: FieldKind,
    /// Human-readable label for error messages
    pub label: String,
}

impl FieldDef {
    pub fn text(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
            label: label.to_string(),
        }
    }

    pub fn flag(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Flag,
            label: label.to_string(),
        }
    }

    pub fn date(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Date,
            label: label.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_round_trip_date() {
        let v = FieldValue::from_wire(FieldKind::Date, "1990-06-01");
        assert_eq!(v.as_date(), NaiveDate::from_ymd_opt(1990, 6, 1));
        assert_eq!(v.to_wire(), "1990-06-01");
    }

    #[test]
    fn test_wire_bad_date_is_absent() {
        let v = FieldValue::from_wire(FieldKind::Date, "01/06/1990");
        assert_eq!(v, FieldValue::Date(None));
        assert_eq!(v.to_wire(), "");
    }

    #[test]
    fn test_wire_flag() {
        assert_eq!(
            FieldValue::from_wire(FieldKind::Flag, "true"),
            FieldValue::Flag(true)
        );
        assert_eq!(
            FieldValue::from_wire(FieldKind::Flag, "no"),
            FieldValue::Flag(false)
        );
        assert_eq!(FieldValue::Flag(false).to_wire(), "false");
    }
}
