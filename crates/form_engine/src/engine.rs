//! Form-wizard orchestration
//!
//! The engine owns the full form state (scalar fields, attachment slots,
//! nested collection, active tab) and the submit path: validate, project
//! errors onto a tab, assemble the payload, call the gateway. Handles
//! are `Clone` and share state through `Rc<RefCell<_>>`, the same shape
//! as the page view-models that consume them; async gateway calls never
//! hold a borrow across an await point.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, warn};
use thiserror::Error;
use uuid::Uuid;

use contracts::shared::form_schema::{FieldSet, FieldValue, FormSchema};
use contracts::shared::submission::{
    FetchedRecord, ItemPayload, OperatorContext, SaveResponse, SubmissionPayload,
};

use crate::attachment::{Attachment, AttachmentPipeline, AttachmentRejected, RawBlob};
use crate::collection::CollectionController;
use crate::gateway::{ConfirmationPort, GatewayError, NotificationPort, RecordGateway};
use crate::tabs::{self, ErrorFocus};
use crate::validator::{self, ValidationResult};
use crate::PreviewHost;

/// Create a new record vs edit an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { record_id: String },
}

/// Failure of a persisted collection-item deletion; the in-memory list
/// is untouched in every failure case
#[derive(Debug, Error)]
pub enum DeleteError {
    /// The user declined the confirmation prompt
    #[error("Deletion cancelled")]
    Cancelled,

    #[error("Server refused the deletion: {0}")]
    Backend(#[from] GatewayError),
}

/// Discriminated result of a submit attempt
#[derive(Debug)]
pub enum SubmitOutcome {
    Succeeded(SaveResponse),
    /// Validation failed locally; the network was never contacted and
    /// the engine already switched to the offending tab
    ValidationFailed {
        errors: ValidationResult,
        focus: Option<ErrorFocus>,
    },
    Failed(GatewayError),
    /// A previous submit is still in flight; this call was ignored
    AlreadyInFlight,
}

/// External collaborators handed to the engine at construction
#[derive(Clone)]
pub struct EnginePorts {
    pub gateway: Rc<dyn RecordGateway>,
    pub confirm: Rc<dyn ConfirmationPort>,
    pub notify: Rc<dyn NotificationPort>,
    pub previews: Rc<dyn PreviewHost>,
}

struct EngineState {
    schema: FormSchema,
    mode: FormMode,
    fields: FieldSet,
    attachments: AttachmentPipeline,
    collection: CollectionController,
    active_tab: String,
    focus_field: Option<String>,
}

/// Generic multi-tab form controller, parameterized by a [`FormSchema`]
#[derive(Clone)]
pub struct FormWizardEngine {
    state: Rc<RefCell<EngineState>>,
    submitting: Rc<Cell<bool>>,
    ports: EnginePorts,
    context: OperatorContext,
}

impl FormWizardEngine {
    /// Open an empty form in create mode
    pub fn open_create(
        schema: FormSchema,
        ports: EnginePorts,
        context: OperatorContext,
    ) -> Result<Self, String> {
        schema.validate_definition()?;
        let active_tab = schema
            .first_tab_id()
            .ok_or_else(|| "Schema has no tabs".to_string())?;
        let fields = schema.initial_field_set();
        let attachments = AttachmentPipeline::new(ports.previews.clone());
        let collection =
            CollectionController::new(schema.collection.clone(), ports.previews.clone());
        Ok(Self {
            state: Rc::new(RefCell::new(EngineState {
                schema,
                mode: FormMode::Create,
                fields,
                attachments,
                collection,
                active_tab,
                focus_field: None,
            })),
            submitting: Rc::new(Cell::new(false)),
            ports,
            context,
        })
    }

    /// Open a fetched record in edit mode
    ///
    /// Attachments are rebuilt as server originals straight from the
    /// fetched encoded values: no network round-trip, no blob
    /// conversion, and an unchanged submit re-sends the cache.
    pub fn open_edit(
        schema: FormSchema,
        record: FetchedRecord,
        ports: EnginePorts,
        context: OperatorContext,
    ) -> Result<Self, String> {
        schema.validate_definition()?;
        let active_tab = schema
            .first_tab_id()
            .ok_or_else(|| "Schema has no tabs".to_string())?;

        let mut fields = schema.initial_field_set();
        for def in &schema.fields {
            if let Some(raw) = record.fields.get(&def.name) {
                fields.insert(def.name.clone(), FieldValue::from_wire(def.kind, raw));
            }
        }

        let mut attachments = AttachmentPipeline::new(ports.previews.clone());
        for slot in &schema.slots {
            if let Some(stored) = record.attachments.get(&slot.name) {
                attachments.from_server(
                    &slot.name,
                    stored.encoded.clone(),
                    stored.file_name.clone(),
                    stored.mime_type.clone(),
                );
            }
        }

        let collection = CollectionController::from_fetched(
            schema.collection.clone(),
            ports.previews.clone(),
            &record.items,
        );

        Ok(Self {
            state: Rc::new(RefCell::new(EngineState {
                schema,
                mode: FormMode::Edit {
                    record_id: record.id,
                },
                fields,
                attachments,
                collection,
                active_tab,
                focus_field: None,
            })),
            submitting: Rc::new(Cell::new(false)),
            ports,
            context,
        })
    }

    // === State accessors ===

    pub fn mode(&self) -> FormMode {
        self.state.borrow().mode.clone()
    }

    pub fn active_tab(&self) -> String {
        self.state.borrow().active_tab.clone()
    }

    /// Error key whose input should currently hold focus, set by the
    /// last failed submit
    pub fn focus_field(&self) -> Option<String> {
        self.state.borrow().focus_field.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.get()
    }

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.state.borrow().fields.get(name).cloned()
    }

    pub fn attachment(&self, slot: &str) -> Option<Attachment> {
        self.state.borrow().attachments.get(slot).cloned()
    }

    /// Binary encodes performed so far, across the form and all items
    pub fn encodes_performed(&self) -> usize {
        let st = self.state.borrow();
        st.attachments.encodes_performed()
            + st.collection
                .items()
                .iter()
                .map(|i| i.attachments.encodes_performed())
                .sum::<usize>()
    }

    // === Field mutation ===

    pub fn set_field(&self, name: &str, value: FieldValue) -> Result<(), String> {
        let mut st = self.state.borrow_mut();
        let def = st
            .schema
            .field_def(name)
            .ok_or_else(|| format!("Unknown field: {name}"))?;
        if def.kind != value.kind() {
            return Err(format!("Wrong value kind for '{name}'"));
        }
        st.fields.insert(name.to_string(), value);
        Ok(())
    }

    // === Attachments ===

    pub fn attach(&self, slot: &str, raw: RawBlob) -> Result<(), AttachmentRejected> {
        let mut st = self.state.borrow_mut();
        let Some(constraints) = st.schema.slot_def(slot).map(|s| s.constraints.clone()) else {
            warn!("attach to unknown slot '{slot}'");
            return Ok(());
        };
        st.attachments.accept(slot, raw, &constraints)
    }

    pub fn detach(&self, slot: &str) {
        self.state.borrow_mut().attachments.remove(slot);
    }

    // === Collection ===

    pub fn add_item(&self, defaults: FieldSet) -> Result<Uuid, String> {
        self.state.borrow_mut().collection.add(defaults)
    }

    pub fn update_item_field(
        &self,
        local_id: Uuid,
        field: &str,
        value: FieldValue,
    ) -> Result<(), String> {
        self.state
            .borrow_mut()
            .collection
            .update_field(local_id, field, value)
    }

    pub fn attach_item(
        &self,
        local_id: Uuid,
        slot: &str,
        raw: RawBlob,
    ) -> Result<(), AttachmentRejected> {
        self.state.borrow_mut().collection.attach(local_id, slot, raw)
    }

    pub fn detach_item(&self, local_id: Uuid, slot: &str) {
        self.state.borrow_mut().collection.detach(local_id, slot);
    }

    pub fn item_ids(&self) -> Vec<Uuid> {
        self.state.borrow().collection.local_ids()
    }

    pub fn item_count(&self) -> usize {
        self.state.borrow().collection.len()
    }

    pub fn item_field(&self, local_id: Uuid, field: &str) -> Option<FieldValue> {
        self.state
            .borrow()
            .collection
            .get(local_id)
            .and_then(|i| i.fields.get(field).cloned())
    }

    /// Remove a collection item
    ///
    /// Items already on the server need user confirmation and a
    /// confirmed server-side delete first; only then does the item leave
    /// the in-memory list. A declined prompt or a failed delete leaves
    /// state untouched. Unpersisted items are discarded locally.
    pub async fn remove_item(&self, local_id: Uuid) -> Result<(), DeleteError> {
        let (server_id, record_type, label) = {
            let st = self.state.borrow();
            let Some(item) = st.collection.get(local_id) else {
                // Stale callback: the id is gone and ids are never reused
                warn!("remove_item for unknown collection item {local_id}");
                return Ok(());
            };
            (
                item.server_id.clone(),
                st.schema.record_type.clone(),
                st.collection
                    .schema()
                    .map(|c| c.label.clone())
                    .unwrap_or_default(),
            )
        };

        let Some(server_id) = server_id else {
            self.state.borrow_mut().collection.discard(local_id);
            return Ok(());
        };

        let message = format!("Delete this {label} entry? This cannot be undone.");
        if !self.ports.confirm.confirm(&message) {
            return Err(DeleteError::Cancelled);
        }

        self.ports
            .gateway
            .delete_collection_item(&record_type, &server_id)
            .await?;

        self.state.borrow_mut().collection.discard(local_id);
        self.ports.notify.success("Entry deleted");
        Ok(())
    }

    // === Tab navigation ===

    pub fn next(&self) {
        self.step(1);
    }

    pub fn previous(&self) {
        self.step(-1);
    }

    pub fn jump_to(&self, tab_id: &str) -> bool {
        let mut st = self.state.borrow_mut();
        if st.schema.tabs.iter().any(|t| t.id == tab_id) {
            st.active_tab = tab_id.to_string();
            st.focus_field = None;
            true
        } else {
            warn!("jump_to unknown tab '{tab_id}'");
            false
        }
    }

    fn step(&self, delta: isize) {
        let mut st = self.state.borrow_mut();
        let ordered: Vec<String> = st
            .schema
            .ordered_tabs()
            .iter()
            .map(|t| t.id.clone())
            .collect();
        let Some(position) = ordered.iter().position(|t| *t == st.active_tab) else {
            return;
        };
        let target = position as isize + delta;
        if (0..ordered.len() as isize).contains(&target) {
            st.active_tab = ordered[target as usize].clone();
            st.focus_field = None;
        }
    }

    // === Submit ===

    /// Validate and, if clean, send the assembled payload to the gateway
    ///
    /// Validation always completes before any network call. While a
    /// submit is in flight further calls are ignored; the guard is
    /// released when the attempt finishes either way. Entered data is
    /// never cleared on failure.
    pub async fn submit(&self) -> SubmitOutcome {
        if self.submitting.replace(true) {
            warn!("submit ignored: another submit is in flight");
            return SubmitOutcome::AlreadyInFlight;
        }
        let outcome = self.run_submit().await;
        self.submitting.set(false);
        outcome
    }

    async fn run_submit(&self) -> SubmitOutcome {
        let (payload, is_edit) = {
            let mut st = self.state.borrow_mut();
            let today = Utc::now().date_naive();
            let errors = validator::validate(
                &st.schema,
                &st.fields,
                &st.attachments,
                &st.collection,
                today,
            );
            if !errors.is_empty() {
                let focus = tabs::project(&errors, &st.schema, &st.collection.local_ids());
                if let Some(focus) = &focus {
                    st.active_tab = focus.tab_id.clone();
                    st.focus_field = Some(focus.field_key.clone());
                }
                debug!("submit blocked by {} validation error(s)", errors.len());
                return SubmitOutcome::ValidationFailed { errors, focus };
            }
            (
                assemble_payload(&st, &self.context),
                matches!(st.mode, FormMode::Edit { .. }),
            )
        };

        let result = if is_edit {
            self.ports.gateway.update(payload).await
        } else {
            self.ports.gateway.create(payload).await
        };

        match result {
            Ok(response) => {
                self.ports
                    .notify
                    .success(response.message.as_deref().unwrap_or("Saved"));
                SubmitOutcome::Succeeded(response)
            }
            Err(error) => {
                self.ports.notify.error(&error.to_string());
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Release all preview handles; call when the form closes
    pub fn close(&self) {
        let mut st = self.state.borrow_mut();
        st.attachments.release_all();
        st.collection.release_all();
    }
}

fn assemble_payload(st: &EngineState, context: &OperatorContext) -> SubmissionPayload {
    let mut fields = HashMap::new();
    for def in &st.schema.fields {
        if let Some(value) = st.fields.get(&def.name) {
            fields.insert(def.name.clone(), value.to_wire());
        }
    }

    // Touched slots only; "" tells the backend to clear the field
    let mut attachments = HashMap::new();
    for slot in &st.schema.slots {
        if let Some(encoded) = st.attachments.materialize_for_submit(&slot.name) {
            attachments.insert(slot.name.clone(), encoded);
        }
    }

    let mut items = Vec::new();
    if let Some(item_schema) = st.collection.schema() {
        for (position, item) in st.collection.items().iter().enumerate() {
            let mut item_fields = HashMap::new();
            for def in &item_schema.fields {
                if let Some(value) = item.fields.get(&def.name) {
                    item_fields.insert(def.name.clone(), value.to_wire());
                }
            }
            let mut item_attachments = HashMap::new();
            for slot in &item_schema.slots {
                if let Some(encoded) = item.attachments.materialize_for_submit(&slot.name) {
                    item_attachments.insert(slot.name.clone(), encoded);
                }
            }
            items.push(ItemPayload {
                server_id: item.server_id.clone(),
                position,
                fields: item_fields,
                attachments: item_attachments,
            });
        }
    }

    SubmissionPayload {
        id: match &st.mode {
            FormMode::Edit { record_id } => Some(record_id.clone()),
            FormMode::Create => None,
        },
        record_type: st.schema.record_type.clone(),
        fields,
        attachments,
        items,
        submitted_by: context.user_id.clone(),
    }
}
