//! Field validation
//!
//! Pure over its inputs: the same field set, attachments and `today`
//! always produce the same result map. Rules run in declared order per
//! field and the first failing rule wins; collection items are checked
//! with the same rule engine scoped to the item, their errors keyed
//! `<collection>:<localId>:<field>`.

use std::collections::HashMap;

use chrono::NaiveDate;

use contracts::shared::form_schema::{
    DateRole, FieldRule, FieldSet, FormSchema, RuleKind,
};

use crate::attachment::AttachmentPipeline;
use crate::collection::CollectionController;

/// Mapping error key -> message; empty means the form is submittable
pub type ValidationResult = HashMap<String, String>;

/// Error key for a collection-item field
pub fn item_error_key(collection: &str, local_id: uuid::Uuid, field: &str) -> String {
    format!("{collection}:{local_id}:{field}")
}

/// Validate the whole form state against its schema
pub fn validate(
    schema: &FormSchema,
    fields: &FieldSet,
    attachments: &AttachmentPipeline,
    collection: &CollectionController,
    today: NaiveDate,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    for rule in &schema.rules {
        if result.contains_key(&rule.field) {
            continue;
        }
        if let Some(message) =
            check_rule(rule, fields, attachments, &|n| schema.label_of(n), today)
        {
            result.insert(rule.field.clone(), message);
        }
    }

    if let Some(item_schema) = collection.schema() {
        for item in collection.items() {
            for rule in &item_schema.rules {
                let key = item_error_key(&item_schema.name, item.local_id, &rule.field);
                if result.contains_key(&key) {
                    continue;
                }
                if let Some(message) = check_rule(
                    rule,
                    &item.fields,
                    &item.attachments,
                    &|n| item_schema.label_of(n),
                    today,
                ) {
                    result.insert(key, message);
                }
            }
        }
    }

    result
}

fn check_rule(
    rule: &FieldRule,
    fields: &FieldSet,
    attachments: &AttachmentPipeline,
    label_of: &dyn Fn(&str) -> String,
    today: NaiveDate,
) -> Option<String> {
    let label = label_of(&rule.field);
    match &rule.kind {
        RuleKind::RequiredText => {
            let value = fields.get(&rule.field).and_then(|v| v.as_text());
            match value {
                Some(v) if !v.trim().is_empty() => None,
                _ => Some(format!("{label} is required")),
            }
        }
        RuleKind::Pattern(pattern) => {
            let value = fields
                .get(&rule.field)
                .and_then(|v| v.as_text())
                .map(str::trim)
                .unwrap_or("");
            if value.is_empty() {
                return rule.required.then(|| format!("{label} is required"));
            }
            if pattern.matches(value) {
                None
            } else {
                Some(format!("{label} {}", pattern.describe()))
            }
        }
        RuleKind::DateRule(role) => {
            let Some(date) = fields.get(&rule.field).and_then(|v| v.as_date()) else {
                return rule.required.then(|| format!("{label} is required"));
            };
            check_date(role, date, &label, fields, label_of, today)
        }
        RuleKind::FilePresence { slot } => {
            if attachments.is_occupied(slot) {
                None
            } else {
                Some(format!("{label} is required"))
            }
        }
    }
}

fn check_date(
    role: &DateRole,
    date: NaiveDate,
    label: &str,
    fields: &FieldSet,
    label_of: &dyn Fn(&str) -> String,
    today: NaiveDate,
) -> Option<String> {
    match role {
        DateRole::BirthDate { min_age_years } => match today.years_since(date) {
            None => Some(format!("{label} cannot be in the future")),
            Some(age) if age < *min_age_years => Some(format!(
                "{label} must denote an age of at least {min_age_years} years"
            )),
            Some(_) => None,
        },
        DateRole::Joining { birth_field } => {
            if date > today {
                return Some(format!("{label} cannot be in the future"));
            }
            if let Some(birth_name) = birth_field {
                if let Some(birth) = fields.get(birth_name).and_then(|v| v.as_date()) {
                    if date < birth {
                        return Some(format!(
                            "{label} cannot precede {}",
                            label_of(birth_name)
                        ));
                    }
                }
            }
            None
        }
    }
}
