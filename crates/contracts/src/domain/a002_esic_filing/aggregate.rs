use once_cell::sync::Lazy;

use crate::shared::form_schema::{
    AttachmentConstraints, CollectionSchema, FieldDef, FieldRule, FormSchema, PatternKind,
    SlotDef, TabDef,
};

/// Record type code used by the gateway routes
pub const RECORD_TYPE: &str = "esic_filing";

const MAX_DOCUMENT_BYTES: usize = 200 * 1024;

static SCHEMA: Lazy<FormSchema> = Lazy::new(|| FormSchema {
    record_type: RECORD_TYPE.to_string(),
    fields: vec![
        FieldDef::text("full_name", "Full name"),
        FieldDef::date("date_of_birth", "Date of birth"),
        FieldDef::date("date_of_joining", "Date of joining"),
        FieldDef::text("insurance_number", "Insurance number"),
        FieldDef::text("dispensary", "Dispensary"),
        FieldDef::text("monthly_wage", "Monthly wage"),
        FieldDef::text("bank_ifsc", "Bank IFSC"),
        FieldDef::flag("has_disability", "Has disability"),
    ],
    tabs: vec![
        TabDef::new(
            "employee",
            0,
            &["full_name", "date_of_birth", "date_of_joining", "has_disability"],
        ),
        TabDef::new(
            "insurance",
            1,
            &["insurance_number", "dispensary", "monthly_wage", "bank_ifsc"],
        ),
        TabDef::new("documents", 2, &["photo", "nominees"]),
    ],
    rules: vec![
        FieldRule::required_text("full_name"),
        FieldRule::birth_date("date_of_birth", 18),
        FieldRule::joining_date("date_of_joining", "date_of_birth"),
        FieldRule::required_pattern("insurance_number", PatternKind::Digits(10)),
        FieldRule::required_text("dispensary"),
        FieldRule::required_pattern("monthly_wage", PatternKind::Amount),
        FieldRule::pattern("bank_ifsc", PatternKind::Ifsc),
        FieldRule::file_required("photo"),
    ],
    slots: vec![SlotDef::new(
        "photo",
        "Employee photo",
        true,
        AttachmentConstraints::image(MAX_DOCUMENT_BYTES),
    )],
    collection: Some(CollectionSchema {
        name: "nominees".to_string(),
        label: "Nominees".to_string(),
        fields: vec![
            FieldDef::text("nominee_name", "Nominee name"),
            FieldDef::text("relation", "Relation"),
            FieldDef::date("nominee_birth_date", "Nominee date of birth"),
            FieldDef::text("share_percent", "Share percent"),
        ],
        rules: vec![
            FieldRule::required_text("nominee_name"),
            FieldRule::required_text("relation"),
            FieldRule::birth_date("nominee_birth_date", 0),
            FieldRule::required_pattern("share_percent", PatternKind::Amount),
        ],
        slots: vec![],
    }),
});

/// Form schema for ESIC employee filings
pub fn schema() -> FormSchema {
    SCHEMA.clone()
}
