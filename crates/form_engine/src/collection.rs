//! Variable-length nested record list (family members, nominees)
//!
//! Each item carries its own field set and its own attachment pipeline.
//! Local ids are fresh v4 UUIDs and are never reused within a session,
//! so a stale async callback resolving after the list was mutated can
//! only miss, never hit an unrelated item. Server-side deletion of
//! persisted items is orchestrated by the engine; here `discard` is the
//! pure local removal applied once the server has confirmed (or for
//! items that were never persisted).

use std::rc::Rc;

use log::warn;
use uuid::Uuid;

use contracts::shared::form_schema::{CollectionSchema, FieldSet, FieldValue};
use contracts::shared::submission::FetchedItem;

use crate::attachment::{AttachmentPipeline, AttachmentRejected, PreviewHost, RawBlob};

/// One element of the nested record list
pub struct CollectionItem {
    pub local_id: Uuid,
    /// Present only for items that already exist on the server
    pub server_id: Option<String>,
    pub fields: FieldSet,
    pub attachments: AttachmentPipeline,
}

/// Ordered list of sub-records with add/remove and per-item attachments
pub struct CollectionController {
    schema: Option<CollectionSchema>,
    previews: Rc<dyn PreviewHost>,
    items: Vec<CollectionItem>,
}

impl CollectionController {
    pub fn new(schema: Option<CollectionSchema>, previews: Rc<dyn PreviewHost>) -> Self {
        Self {
            schema,
            previews,
            items: Vec::new(),
        }
    }

    /// Rebuild the list from a fetched record (edit mode); attachments
    /// come back as server originals with their encoded cache populated
    pub fn from_fetched(
        schema: Option<CollectionSchema>,
        previews: Rc<dyn PreviewHost>,
        fetched: &[FetchedItem],
    ) -> Self {
        let mut controller = Self::new(schema, previews);
        let Some(item_schema) = controller.schema.clone() else {
            return controller;
        };
        for fetched_item in fetched {
            let mut fields = item_schema.initial_field_set();
            for def in &item_schema.fields {
                if let Some(raw) = fetched_item.fields.get(&def.name) {
                    fields.insert(def.name.clone(), FieldValue::from_wire(def.kind, raw));
                }
            }
            let mut attachments = AttachmentPipeline::new(controller.previews.clone());
            for slot in &item_schema.slots {
                if let Some(stored) = fetched_item.attachments.get(&slot.name) {
                    attachments.from_server(
                        &slot.name,
                        stored.encoded.clone(),
                        stored.file_name.clone(),
                        stored.mime_type.clone(),
                    );
                }
            }
            controller.items.push(CollectionItem {
                local_id: Uuid::new_v4(),
                server_id: Some(fetched_item.server_id.clone()),
                fields,
                attachments,
            });
        }
        controller
    }

    pub fn schema(&self) -> Option<&CollectionSchema> {
        self.schema.as_ref()
    }

    /// Append a new item, overlaying `defaults` onto the schema's empty
    /// field set; returns the fresh local id
    pub fn add(&mut self, defaults: FieldSet) -> Result<Uuid, String> {
        let item_schema = self
            .schema
            .as_ref()
            .ok_or_else(|| "Form has no nested collection".to_string())?;

        let mut fields = item_schema.initial_field_set();
        for (name, value) in defaults {
            match item_schema.field_def(&name) {
                Some(def) if def.kind == value.kind() => {
                    fields.insert(name, value);
                }
                Some(def) => {
                    return Err(format!(
                        "Default for '{}' has wrong kind (expected {:?})",
                        name, def.kind
                    ))
                }
                None => return Err(format!("Unknown collection field: {}", name)),
            }
        }

        let local_id = Uuid::new_v4();
        self.items.push(CollectionItem {
            local_id,
            server_id: None,
            fields,
            attachments: AttachmentPipeline::new(self.previews.clone()),
        });
        Ok(local_id)
    }

    /// Local removal; releases the item's preview handles. Returns false
    /// for an id that no longer exists (stale callback).
    pub fn discard(&mut self, local_id: Uuid) -> bool {
        match self.items.iter().position(|i| i.local_id == local_id) {
            Some(index) => {
                let mut item = self.items.remove(index);
                item.attachments.release_all();
                true
            }
            None => {
                warn!("discard for unknown collection item {local_id}");
                false
            }
        }
    }

    pub fn update_field(
        &mut self,
        local_id: Uuid,
        field: &str,
        value: FieldValue,
    ) -> Result<(), String> {
        let item_schema = self
            .schema
            .as_ref()
            .ok_or_else(|| "Form has no nested collection".to_string())?;
        let def = item_schema
            .field_def(field)
            .ok_or_else(|| format!("Unknown collection field: {}", field))?;
        if def.kind != value.kind() {
            return Err(format!("Wrong value kind for '{}'", field));
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.local_id == local_id)
            .ok_or_else(|| format!("Unknown collection item: {}", local_id))?;
        item.fields.insert(field.to_string(), value);
        Ok(())
    }

    /// Attach a file to an item slot; a stale local id is ignored
    pub fn attach(
        &mut self,
        local_id: Uuid,
        slot: &str,
        raw: RawBlob,
    ) -> Result<(), AttachmentRejected> {
        let Some(constraints) = self
            .schema
            .as_ref()
            .and_then(|s| s.slot_def(slot))
            .map(|s| s.constraints.clone())
        else {
            warn!("attach to unknown collection slot '{slot}'");
            return Ok(());
        };
        match self.items.iter_mut().find(|i| i.local_id == local_id) {
            Some(item) => item.attachments.accept(slot, raw, &constraints),
            None => {
                warn!("attach for unknown collection item {local_id}");
                Ok(())
            }
        }
    }

    pub fn detach(&mut self, local_id: Uuid, slot: &str) {
        if let Some(item) = self.items.iter_mut().find(|i| i.local_id == local_id) {
            item.attachments.remove(slot);
        }
    }

    pub fn items(&self) -> &[CollectionItem] {
        &self.items
    }

    pub fn get(&self, local_id: Uuid) -> Option<&CollectionItem> {
        self.items.iter().find(|i| i.local_id == local_id)
    }

    pub fn server_id_of(&self, local_id: Uuid) -> Option<String> {
        self.get(local_id).and_then(|i| i.server_id.clone())
    }

    pub fn local_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|i| i.local_id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Release every item's preview handles (form close)
    pub fn release_all(&mut self) {
        for item in &mut self.items {
            item.attachments.release_all();
        }
    }
}
