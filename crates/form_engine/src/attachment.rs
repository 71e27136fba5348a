//! Attachment lifecycle
//!
//! Each named slot holds at most one attachment. An attachment is either
//! freshly selected (`New`), already stored on the server and untouched
//! (`ServerOriginal`), or explicitly removed (`Removed`). Submission
//! needs all three apart: an unchanged server value is re-sent from its
//! cached encoded form without re-encoding, a new file is encoded once,
//! and a removed previously-stored value turns into an explicit clear
//! sentinel so the backend wipes the field instead of leaving it as-is.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;
use uuid::Uuid;

use contracts::shared::form_schema::AttachmentConstraints;

/// Raw binary selected by the user
#[derive(Debug, Clone)]
pub struct RawBlob {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Why an attachment was refused; existing slot state is untouched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentRejected {
    #[error("File is too large: {actual} bytes (limit {limit})")]
    TooLarge { actual: usize, limit: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
}

/// Produces display-ready preview values for raw blobs
///
/// The page layer typically wraps object URLs here; every handle created
/// must be released when the attachment is replaced, removed or the form
/// closes, otherwise handles accumulate over a long-lived form session.
pub trait PreviewHost {
    fn create_preview(&self, blob: &RawBlob) -> String;
    fn release_preview(&self, handle: &str);
}

/// Preview host that produces nothing; for headless use and tests
#[derive(Debug, Default)]
pub struct NoPreview;

impl PreviewHost for NoPreview {
    fn create_preview(&self, _blob: &RawBlob) -> String {
        String::new()
    }

    fn release_preview(&self, _handle: &str) {}
}

/// Origin of the value currently occupying a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Selected in this session; holds the raw bytes until submit
    New { bytes: Vec<u8> },
    /// Stored on the server, unchanged; encoded form cached from fetch
    ServerOriginal { encoded: String },
    /// Explicitly removed. `was_persisted` decides whether submission
    /// must tell the backend to clear the field.
    Removed { was_persisted: bool },
}

/// In-memory attachment handle for one slot
#[derive(Debug, Clone)]
pub struct Attachment {
    pub id: Uuid,
    pub source: AttachmentSource,
    pub display_name: String,
    pub byte_size: usize,
    pub mime_type: String,
    /// Display-ready preview handle, present for `New` attachments only
    pub preview: Option<String>,
}

impl Attachment {
    /// A slot counts as occupied unless its value was removed
    pub fn is_present(&self) -> bool {
        !matches!(self.source, AttachmentSource::Removed { .. })
    }
}

/// Per-form (or per-collection-item) set of attachment slots
pub struct AttachmentPipeline {
    previews: Rc<dyn PreviewHost>,
    slots: HashMap<String, Attachment>,
    /// Slots that held a server value at form-open time; once a slot is
    /// in here it stays, so replace-then-remove still clears server-side
    persisted: HashSet<String>,
    encodes: Cell<usize>,
}

impl AttachmentPipeline {
    pub fn new(previews: Rc<dyn PreviewHost>) -> Self {
        Self {
            previews,
            slots: HashMap::new(),
            persisted: HashSet::new(),
            encodes: Cell::new(0),
        }
    }

    /// Rebuild a server-origin attachment from its fetched encoded value.
    /// No network, no decoding: an unchanged submit re-sends the cache.
    pub fn from_server(
        &mut self,
        slot: &str,
        encoded: String,
        display_name: Option<String>,
        mime_type: Option<String>,
    ) {
        // base64 expands by 4/3; good enough for a size badge
        let byte_size = encoded.len() * 3 / 4;
        self.persisted.insert(slot.to_string());
        self.slots.insert(
            slot.to_string(),
            Attachment {
                id: Uuid::new_v4(),
                source: AttachmentSource::ServerOriginal { encoded },
                display_name: display_name.unwrap_or_else(|| slot.to_string()),
                byte_size,
                mime_type: mime_type.unwrap_or_else(|| "application/octet-stream".to_string()),
                preview: None,
            },
        );
    }

    /// Validate and take a freshly selected file into a slot
    ///
    /// On success the previous occupant (if any) is replaced and its
    /// preview handle released immediately. On rejection nothing changes.
    pub fn accept(
        &mut self,
        slot: &str,
        raw: RawBlob,
        constraints: &AttachmentConstraints,
    ) -> Result<(), AttachmentRejected> {
        if raw.bytes.len() > constraints.max_bytes {
            return Err(AttachmentRejected::TooLarge {
                actual: raw.bytes.len(),
                limit: constraints.max_bytes,
            });
        }
        if !constraints
            .allowed_mime_types
            .iter()
            .any(|m| m == &raw.mime_type)
        {
            return Err(AttachmentRejected::UnsupportedType(raw.mime_type));
        }

        self.release_slot_preview(slot);

        let preview = self.previews.create_preview(&raw);
        let attachment = Attachment {
            id: Uuid::new_v4(),
            source: AttachmentSource::New {
                bytes: raw.bytes.clone(),
            },
            display_name: raw.name,
            byte_size: raw.bytes.len(),
            mime_type: raw.mime_type,
            preview: Some(preview),
        };
        self.slots.insert(slot.to_string(), attachment);
        Ok(())
    }

    /// Remove whatever occupies the slot, releasing its preview
    ///
    /// If the slot ever held a server value, the removal is recorded so
    /// submission emits the clear sentinel. Removing an empty slot is a
    /// no-op.
    pub fn remove(&mut self, slot: &str) {
        if !self.slots.contains_key(slot) {
            return;
        }
        self.release_slot_preview(slot);
        let was_persisted = self.persisted.contains(slot);
        self.slots.insert(
            slot.to_string(),
            Attachment {
                id: Uuid::new_v4(),
                source: AttachmentSource::Removed { was_persisted },
                display_name: String::new(),
                byte_size: 0,
                mime_type: String::new(),
                preview: None,
            },
        );
    }

    pub fn get(&self, slot: &str) -> Option<&Attachment> {
        self.slots.get(slot)
    }

    /// Whether the slot currently holds a usable attachment
    pub fn is_occupied(&self, slot: &str) -> bool {
        self.slots.get(slot).map(|a| a.is_present()).unwrap_or(false)
    }

    /// Transport-encoded value for the slot at submit time
    ///
    /// - `New` -> encodes the raw bytes (counted)
    /// - `ServerOriginal` -> returns the cached encoded form, no encode
    /// - `Removed` of a persisted value -> `Some("")`, the clear sentinel
    /// - otherwise -> `None`, slot omitted from the payload
    pub fn materialize_for_submit(&self, slot: &str) -> Option<String> {
        match self.slots.get(slot).map(|a| &a.source) {
            Some(AttachmentSource::New { bytes }) => {
                self.encodes.set(self.encodes.get() + 1);
                Some(BASE64.encode(bytes))
            }
            Some(AttachmentSource::ServerOriginal { encoded }) => Some(encoded.clone()),
            Some(AttachmentSource::Removed { was_persisted: true }) => Some(String::new()),
            Some(AttachmentSource::Removed { was_persisted: false }) | None => None,
        }
    }

    /// How many binary encodes this pipeline has performed
    pub fn encodes_performed(&self) -> usize {
        self.encodes.get()
    }

    /// Release every outstanding preview handle (form close)
    pub fn release_all(&mut self) {
        let slots: Vec<String> = self.slots.keys().cloned().collect();
        for slot in slots {
            self.release_slot_preview(&slot);
        }
    }

    fn release_slot_preview(&mut self, slot: &str) {
        if let Some(existing) = self.slots.get_mut(slot) {
            if let Some(handle) = existing.preview.take() {
                self.previews.release_preview(&handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Counts created/released handles so leak behavior is observable
    #[derive(Default)]
    struct CountingPreviews {
        created: Cell<usize>,
        released: RefCell<Vec<String>>,
    }

    impl PreviewHost for CountingPreviews {
        fn create_preview(&self, _blob: &RawBlob) -> String {
            let n = self.created.get();
            self.created.set(n + 1);
            format!("preview-{n}")
        }

        fn release_preview(&self, handle: &str) {
            self.released.borrow_mut().push(handle.to_string());
        }
    }

    fn jpeg(bytes: usize) -> RawBlob {
        RawBlob {
            name: "photo.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            bytes: vec![0xFF; bytes],
        }
    }

    fn constraints() -> AttachmentConstraints {
        AttachmentConstraints::image(200 * 1024)
    }

    #[test]
    fn test_accept_then_remove_is_removed_not_server_original() {
        let mut pipeline = AttachmentPipeline::new(Rc::new(NoPreview));
        pipeline.accept("photo", jpeg(100), &constraints()).unwrap();
        pipeline.remove("photo");
        assert_eq!(
            pipeline.get("photo").unwrap().source,
            AttachmentSource::Removed { was_persisted: false }
        );
        assert_eq!(pipeline.materialize_for_submit("photo"), None);
    }

    #[test]
    fn test_server_original_remove_then_accept_is_new() {
        let mut pipeline = AttachmentPipeline::new(Rc::new(NoPreview));
        pipeline.from_server("photo", "c3RvcmVk".to_string(), None, None);
        pipeline.remove("photo");
        pipeline.accept("photo", jpeg(100), &constraints()).unwrap();
        assert!(matches!(
            pipeline.get("photo").unwrap().source,
            AttachmentSource::New { .. }
        ));
    }

    #[test]
    fn test_removed_persisted_emits_clear_sentinel() {
        let mut pipeline = AttachmentPipeline::new(Rc::new(NoPreview));
        pipeline.from_server("photo", "c3RvcmVk".to_string(), None, None);
        pipeline.remove("photo");
        assert_eq!(pipeline.materialize_for_submit("photo"), Some(String::new()));
    }

    #[test]
    fn test_replace_then_remove_still_clears_server_value() {
        let mut pipeline = AttachmentPipeline::new(Rc::new(NoPreview));
        pipeline.from_server("photo", "c3RvcmVk".to_string(), None, None);
        pipeline.accept("photo", jpeg(100), &constraints()).unwrap();
        pipeline.remove("photo");
        assert_eq!(pipeline.materialize_for_submit("photo"), Some(String::new()));
    }

    #[test]
    fn test_server_original_materializes_cache_without_encode() {
        let mut pipeline = AttachmentPipeline::new(Rc::new(NoPreview));
        pipeline.from_server("photo", "c3RvcmVk".to_string(), None, None);
        assert_eq!(
            pipeline.materialize_for_submit("photo"),
            Some("c3RvcmVk".to_string())
        );
        assert_eq!(pipeline.encodes_performed(), 0);
    }

    #[test]
    fn test_new_attachment_encodes_once() {
        let mut pipeline = AttachmentPipeline::new(Rc::new(NoPreview));
        pipeline.accept("photo", jpeg(3), &constraints()).unwrap();
        let encoded = pipeline.materialize_for_submit("photo").unwrap();
        assert!(!encoded.is_empty());
        assert_eq!(pipeline.encodes_performed(), 1);
    }

    #[test]
    fn test_untouched_slot_is_omitted() {
        let pipeline = AttachmentPipeline::new(Rc::new(NoPreview));
        assert_eq!(pipeline.materialize_for_submit("id_proof"), None);
    }

    #[test]
    fn test_too_large_rejected_without_state_change() {
        let mut pipeline = AttachmentPipeline::new(Rc::new(NoPreview));
        pipeline.accept("photo", jpeg(100), &constraints()).unwrap();
        let err = pipeline
            .accept("photo", jpeg(300 * 1024), &constraints())
            .unwrap_err();
        assert!(matches!(err, AttachmentRejected::TooLarge { .. }));
        // Previous occupant survived
        assert_eq!(pipeline.get("photo").unwrap().byte_size, 100);
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let mut pipeline = AttachmentPipeline::new(Rc::new(NoPreview));
        let blob = RawBlob {
            name: "notes.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![0; 10],
        };
        let err = pipeline.accept("photo", blob, &constraints()).unwrap_err();
        assert_eq!(
            err,
            AttachmentRejected::UnsupportedType("application/pdf".to_string())
        );
        assert!(pipeline.get("photo").is_none());
    }

    #[test]
    fn test_replace_releases_previous_preview_eagerly() {
        let previews = Rc::new(CountingPreviews::default());
        let mut pipeline = AttachmentPipeline::new(previews.clone());
        pipeline.accept("photo", jpeg(10), &constraints()).unwrap();
        pipeline.accept("photo", jpeg(20), &constraints()).unwrap();
        assert_eq!(previews.created.get(), 2);
        assert_eq!(*previews.released.borrow(), vec!["preview-0".to_string()]);
        pipeline.remove("photo");
        assert_eq!(
            *previews.released.borrow(),
            vec!["preview-0".to_string(), "preview-1".to_string()]
        );
    }

    #[test]
    fn test_release_all_on_close() {
        let previews = Rc::new(CountingPreviews::default());
        let mut pipeline = AttachmentPipeline::new(previews.clone());
        pipeline.accept("photo", jpeg(10), &constraints()).unwrap();
        pipeline.accept("id_proof", jpeg(10), &constraints()).unwrap();
        pipeline.release_all();
        assert_eq!(previews.released.borrow().len(), 2);
    }
}
