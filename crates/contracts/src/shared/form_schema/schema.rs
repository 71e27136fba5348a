use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::fields::{FieldDef, FieldSet, FieldValue};
use super::rules::{DateRole, FieldRule, RuleKind};

/// Size/type constraints for an attachment slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentConstraints {
    pub max_bytes: usize,
    pub allowed_mime_types: Vec<String>,
}

impl AttachmentConstraints {
    /// JPEG/PNG images up to `max_bytes`
    pub fn image(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            allowed_mime_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        }
    }
}

/// A named place holding at most one attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDef {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub constraints: AttachmentConstraints,
}

impl SlotDef {
    pub fn new(name: &str, label: &str, required: bool, constraints: AttachmentConstraints) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            required,
            constraints,
        }
    }
}

/// A labeled subdivision of the form owning a disjoint set of fields
///
/// `fields` may name scalar fields, attachment slots or the nested
/// collection; its order is the tie-break order for error projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabDef {
    pub id: String,
    pub ordinal: u32,
    pub fields: Vec<String>,
}

impl TabDef {
    pub fn new(id: &str, ordinal: u32, fields: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            ordinal,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Schema of one element of the variable-length nested record list
/// (e.g. one family member)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Collection name; owned by exactly one tab, prefixes item error keys
    pub name: String,
    pub label: String,
    pub fields: Vec<FieldDef>,
    pub rules: Vec<FieldRule>,
    pub slots: Vec<SlotDef>,
}

impl CollectionSchema {
    /// Empty field set for a freshly added item
    pub fn initial_field_set(&self) -> FieldSet {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), FieldValue::empty(f.kind)))
            .collect()
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn slot_def(&self, name: &str) -> Option<&SlotDef> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Label for a field or slot, for error messages
    pub fn label_of(&self, name: &str) -> String {
        self.field_def(name)
            .map(|f| f.label.clone())
            .or_else(|| self.slot_def(name).map(|s| s.label.clone()))
            .unwrap_or_else(|| name.to_string())
    }
}

/// Complete declarative description of one multi-tab form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSchema {
    /// Record type code (e.g. "pf_filing"), passed to the gateway
    pub record_type: String,
    pub fields: Vec<FieldDef>,
    pub tabs: Vec<TabDef>,
    pub rules: Vec<FieldRule>,
    pub slots: Vec<SlotDef>,
    pub collection: Option<CollectionSchema>,
}

impl FormSchema {
    /// Empty field set for create mode
    pub fn initial_field_set(&self) -> FieldSet {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), FieldValue::empty(f.kind)))
            .collect()
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn slot_def(&self, name: &str) -> Option<&SlotDef> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Label for a field or slot, for error messages
    pub fn label_of(&self, name: &str) -> String {
        self.field_def(name)
            .map(|f| f.label.clone())
            .or_else(|| self.slot_def(name).map(|s| s.label.clone()))
            .unwrap_or_else(|| name.to_string())
    }

    /// Tabs sorted by ordinal
    pub fn ordered_tabs(&self) -> Vec<&TabDef> {
        let mut tabs: Vec<&TabDef> = self.tabs.iter().collect();
        tabs.sort_by_key(|t| t.ordinal);
        tabs
    }

    /// Id of the tab with the lowest ordinal
    pub fn first_tab_id(&self) -> Option<String> {
        self.ordered_tabs().first().map(|t| t.id.clone())
    }

    /// Tab owning the given field, slot or collection name
    pub fn tab_owning(&self, name: &str) -> Option<&TabDef> {
        self.tabs.iter().find(|t| t.fields.iter().any(|f| f == name))
    }

    /// Check the structural invariants of the schema definition
    ///
    /// Every rule must reference a declared field or slot, every
    /// validated name must be owned by exactly one tab, tab ids and
    /// ordinals must be unique. A schema failing this check is a
    /// programming error in the catalog, not user input.
    pub fn validate_definition(&self) -> Result<(), String> {
        if self.tabs.is_empty() {
            return Err("Schema must declare at least one tab".into());
        }

        let mut tab_ids = HashSet::new();
        let mut ordinals = HashSet::new();
        for tab in &self.tabs {
            if !tab_ids.insert(tab.id.as_str()) {
                return Err(format!("Duplicate tab id: {}", tab.id));
            }
            if !ordinals.insert(tab.ordinal) {
                return Err(format!("Duplicate tab ordinal: {}", tab.ordinal));
            }
        }

        let mut field_names = HashSet::new();
        for field in &self.fields {
            if !field_names.insert(field.name.as_str()) {
                return Err(format!("Duplicate field: {}", field.name));
            }
        }
        let mut slot_names = HashSet::new();
        for slot in &self.slots {
            if !slot_names.insert(slot.name.as_str()) {
                return Err(format!("Duplicate slot: {}", slot.name));
            }
            if field_names.contains(slot.name.as_str()) {
                return Err(format!("Slot name clashes with a field: {}", slot.name));
            }
        }

        // Tab ownership: declared names only, each owned at most once
        let mut owned = HashSet::new();
        for tab in &self.tabs {
            for name in &tab.fields {
                let is_collection = self
                    .collection
                    .as_ref()
                    .map(|c| &c.name == name)
                    .unwrap_or(false);
                if !field_names.contains(name.as_str())
                    && !slot_names.contains(name.as_str())
                    && !is_collection
                {
                    return Err(format!("Tab '{}' owns undeclared name: {}", tab.id, name));
                }
                if !owned.insert(name.as_str()) {
                    return Err(format!("Name owned by more than one tab: {}", name));
                }
            }
        }

        // Rules: no orphans, and every validated name projectable to a tab
        for rule in &self.rules {
            check_rule(rule, &field_names, &slot_names)?;
            if !owned.contains(rule.field.as_str()) {
                return Err(format!("Validated name not owned by any tab: {}", rule.field));
            }
        }

        if let Some(collection) = &self.collection {
            if !owned.contains(collection.name.as_str()) {
                return Err(format!(
                    "Collection '{}' not owned by any tab",
                    collection.name
                ));
            }
            let item_fields: HashSet<&str> =
                collection.fields.iter().map(|f| f.name.as_str()).collect();
            let item_slots: HashSet<&str> =
                collection.slots.iter().map(|s| s.name.as_str()).collect();
            for rule in &collection.rules {
                check_rule(rule, &item_fields, &item_slots).map_err(|e| {
                    format!("Collection '{}': {}", collection.name, e)
                })?;
            }
        }

        Ok(())
    }
}

fn check_rule(
    rule: &FieldRule,
    field_names: &HashSet<&str>,
    slot_names: &HashSet<&str>,
) -> Result<(), String> {
    match &rule.kind {
        RuleKind::FilePresence { slot } => {
            if !slot_names.contains(slot.as_str()) {
                return Err(format!("File rule references unknown slot: {}", slot));
            }
            if rule.field != *slot {
                return Err(format!(
                    "File rule for slot '{}' must be keyed to the slot name",
                    slot
                ));
            }
        }
        RuleKind::DateRule(DateRole::Joining {
            birth_field: Some(birth),
        }) => {
            if !field_names.contains(rule.field.as_str()) {
                return Err(format!("Rule references unknown field: {}", rule.field));
            }
            if !field_names.contains(birth.as_str()) {
                return Err(format!("Date rule references unknown field: {}", birth));
            }
        }
        _ => {
            if !field_names.contains(rule.field.as_str()) {
                return Err(format!("Rule references unknown field: {}", rule.field));
            }
        }
    }
    Ok(())
}
