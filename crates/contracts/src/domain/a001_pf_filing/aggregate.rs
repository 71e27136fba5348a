use once_cell::sync::Lazy;

use crate::shared::form_schema::{
    AttachmentConstraints, CollectionSchema, FieldDef, FieldRule, FormSchema, PatternKind,
    SlotDef, TabDef,
};

/// Record type code used by the gateway routes
pub const RECORD_TYPE: &str = "pf_filing";

/// Photo and document uploads are capped at 200 KiB
const MAX_DOCUMENT_BYTES: usize = 200 * 1024;

static SCHEMA: Lazy<FormSchema> = Lazy::new(|| FormSchema {
    record_type: RECORD_TYPE.to_string(),
    fields: vec![
        FieldDef::text("full_name", "Full name"),
        FieldDef::text("father_name", "Father's name"),
        FieldDef::date("date_of_birth", "Date of birth"),
        FieldDef::date("date_of_joining", "Date of joining"),
        FieldDef::flag("is_international_worker", "International worker"),
        FieldDef::text("aadhaar_number", "Aadhaar number"),
        FieldDef::text("pan_number", "PAN"),
        FieldDef::text("uan_number", "UAN"),
        FieldDef::text("bank_ifsc", "Bank IFSC"),
        FieldDef::text("monthly_wage", "Monthly wage"),
    ],
    tabs: vec![
        TabDef::new(
            "employee",
            0,
            &[
                "full_name",
                "father_name",
                "date_of_birth",
                "date_of_joining",
                "is_international_worker",
            ],
        ),
        TabDef::new(
            "statutory",
            1,
            &[
                "aadhaar_number",
                "pan_number",
                "uan_number",
                "bank_ifsc",
                "monthly_wage",
            ],
        ),
        TabDef::new("documents", 2, &["photo", "id_proof", "family_members"]),
    ],
    rules: vec![
        FieldRule::required_text("full_name"),
        FieldRule::birth_date("date_of_birth", 18),
        FieldRule::joining_date("date_of_joining", "date_of_birth"),
        FieldRule::required_pattern("aadhaar_number", PatternKind::Digits(12)),
        FieldRule::pattern("pan_number", PatternKind::Pan),
        FieldRule::pattern("uan_number", PatternKind::Digits(12)),
        FieldRule::required_pattern("bank_ifsc", PatternKind::Ifsc),
        FieldRule::required_pattern("monthly_wage", PatternKind::Amount),
        FieldRule::file_required("photo"),
    ],
    slots: vec![
        SlotDef::new(
            "photo",
            "Employee photo",
            true,
            AttachmentConstraints::image(MAX_DOCUMENT_BYTES),
        ),
        SlotDef::new(
            "id_proof",
            "Identity proof",
            false,
            AttachmentConstraints::image(MAX_DOCUMENT_BYTES),
        ),
    ],
    collection: Some(CollectionSchema {
        name: "family_members".to_string(),
        label: "Family members".to_string(),
        fields: vec![
            FieldDef::text("member_name", "Member name"),
            FieldDef::text("relation", "Relation"),
            FieldDef::date("member_birth_date", "Member date of birth"),
            FieldDef::text("member_aadhaar", "Member Aadhaar"),
        ],
        rules: vec![
            FieldRule::required_text("member_name"),
            FieldRule::required_text("relation"),
            FieldRule::birth_date("member_birth_date", 0),
            FieldRule::pattern("member_aadhaar", PatternKind::Digits(12)),
        ],
        slots: vec![SlotDef::new(
            "member_photo",
            "Member photo",
            false,
            AttachmentConstraints::image(MAX_DOCUMENT_BYTES),
        )],
    }),
});

/// Form schema for Provident Fund employee filings
pub fn schema() -> FormSchema {
    SCHEMA.clone()
}
