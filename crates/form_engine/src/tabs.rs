//! Error-to-tab projection
//!
//! Given a validation result, decide which tab must be shown and which
//! input must receive focus: the lowest tab ordinal wins, ties broken by
//! the field declaration order inside the tab. Collection-scoped error
//! keys project to the tab that owns the collection.

use log::warn;
use uuid::Uuid;

use contracts::shared::form_schema::FormSchema;

use crate::validator::{item_error_key, ValidationResult};

/// Where the user gets redirected after a failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFocus {
    pub tab_id: String,
    /// Exact error key whose input should be focused and scrolled to
    pub field_key: String,
}

/// Pick the tab to activate and the field to focus
///
/// `item_order` is the current collection item order; among several
/// failing items the earliest one wins, then the collection's rule
/// declaration order within the item.
pub fn project(
    result: &ValidationResult,
    schema: &FormSchema,
    item_order: &[Uuid],
) -> Option<ErrorFocus> {
    if result.is_empty() {
        return None;
    }

    for tab in schema.ordered_tabs() {
        for name in &tab.fields {
            // Scalar field or slot error, keyed directly
            if result.contains_key(name) {
                return Some(ErrorFocus {
                    tab_id: tab.id.clone(),
                    field_key: name.clone(),
                });
            }

            // Collection owned by this tab: scan items in display order
            let Some(item_schema) = schema.collection.as_ref().filter(|c| &c.name == name)
            else {
                continue;
            };
            for local_id in item_order {
                for rule in &item_schema.rules {
                    let key = item_error_key(&item_schema.name, *local_id, &rule.field);
                    if result.contains_key(&key) {
                        return Some(ErrorFocus {
                            tab_id: tab.id.clone(),
                            field_key: key,
                        });
                    }
                }
            }
        }
    }

    // Should not happen while the schema invariant holds (every validated
    // name owned by a tab); fall back to the first tab
    warn!("validation errors did not map to any tab: {:?}", result.keys());
    let mut keys: Vec<&String> = result.keys().collect();
    keys.sort();
    Some(ErrorFocus {
        tab_id: schema.first_tab_id()?,
        field_key: keys[0].clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::form_schema::{
        CollectionSchema, FieldDef, FieldRule, FormSchema, TabDef,
    };
    use std::collections::HashMap;

    fn schema() -> FormSchema {
        FormSchema {
            record_type: "test".to_string(),
            fields: vec![
                FieldDef::text("a", "A"),
                FieldDef::text("b", "B"),
                FieldDef::text("c", "C"),
            ],
            tabs: vec![
                // Declared out of ordinal order on purpose
                TabDef::new("second", 1, &["c", "family"]),
                TabDef::new("first", 0, &["a", "b"]),
            ],
            rules: vec![
                FieldRule::required_text("a"),
                FieldRule::required_text("b"),
                FieldRule::required_text("c"),
            ],
            slots: vec![],
            collection: Some(CollectionSchema {
                name: "family".to_string(),
                label: "Family".to_string(),
                fields: vec![FieldDef::text("name", "Name")],
                rules: vec![FieldRule::required_text("name")],
                slots: vec![],
            }),
        }
    }

    fn errors(keys: &[&str]) -> ValidationResult {
        keys.iter()
            .map(|k| (k.to_string(), "err".to_string()))
            .collect()
    }

    #[test]
    fn test_lowest_ordinal_wins() {
        let focus = project(&errors(&["c", "b"]), &schema(), &[]).unwrap();
        assert_eq!(focus.tab_id, "first");
        assert_eq!(focus.field_key, "b");
    }

    #[test]
    fn test_tie_broken_by_declaration_order() {
        let focus = project(&errors(&["b", "a"]), &schema(), &[]).unwrap();
        assert_eq!(focus.field_key, "a");
    }

    #[test]
    fn test_collection_error_projects_to_owning_tab() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let key = item_error_key("family", second, "name");
        let result: ValidationResult =
            HashMap::from([(key.clone(), "err".to_string())]);
        let focus = project(&result, &schema(), &[first, second]).unwrap();
        assert_eq!(focus.tab_id, "second");
        assert_eq!(focus.field_key, key);
    }

    #[test]
    fn test_earliest_failing_item_wins() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let result = errors(&[
            &item_error_key("family", second, "name"),
            &item_error_key("family", first, "name"),
        ]);
        let focus = project(&result, &schema(), &[first, second]).unwrap();
        assert_eq!(focus.field_key, item_error_key("family", first, "name"));
    }

    #[test]
    fn test_no_errors_projects_nothing() {
        assert_eq!(project(&ValidationResult::new(), &schema(), &[]), None);
    }

    #[test]
    fn test_unmapped_key_falls_back_to_first_tab() {
        let focus = project(&errors(&["ghost"]), &schema(), &[]).unwrap();
        assert_eq!(focus.tab_id, "first");
        assert_eq!(focus.field_key, "ghost");
    }
}
