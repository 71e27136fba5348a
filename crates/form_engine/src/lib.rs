//! Form-Wizard Engine
//!
//! One generalized multi-tab form controller replacing the four
//! near-identical create/edit screens for statutory filings. The engine
//! is parameterized by a declarative [`contracts::shared::form_schema::FormSchema`]:
//! it tracks the scalar field set plus a nested collection, validates on
//! submit, projects failures onto the tab that must be shown, manages
//! binary attachments through their keep/replace/clear lifecycle and
//! assembles the submission payload for the record gateway.
//!
//! Single-threaded, event-driven: handles are `Clone` over `Rc`, async
//! work (gateway calls) runs on non-Send futures, the way the rest of
//! the frontend does.

pub mod attachment;
pub mod collection;
pub mod engine;
pub mod gateway;
pub mod tabs;
pub mod validator;

// Re-exports
pub use attachment::{
    Attachment, AttachmentPipeline, AttachmentRejected, AttachmentSource, NoPreview,
    PreviewHost, RawBlob,
};
pub use collection::{CollectionController, CollectionItem};
pub use engine::{DeleteError, EnginePorts, FormMode, FormWizardEngine, SubmitOutcome};
pub use gateway::{ConfirmationPort, GatewayError, NotificationPort, RecordGateway};
pub use tabs::ErrorFocus;
pub use validator::ValidationResult;
