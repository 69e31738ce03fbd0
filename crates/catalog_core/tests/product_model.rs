use catalog_core::{
    FieldViolation, PriceInput, Product, ProductDraft, ProductField, ProductPatch, UpdateOptions,
};
use uuid::Uuid;

#[test]
fn product_serialization_uses_expected_wire_fields() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let product = Product {
        id,
        name: "iPhone 14".to_string(),
        price: 999.0,
        description: "Latest Apple smartphone".to_string(),
        category: "Phones".to_string(),
        created_at: 1_700_000_000_000,
        updated_at: 1_700_000_360_000,
    };

    let json = serde_json::to_value(&product).unwrap();
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["name"], "iPhone 14");
    assert_eq!(json["price"], 999.0);
    assert_eq!(json["category"], "Phones");
    assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
    assert_eq!(json["updatedAt"], 1_700_000_360_000_i64);
    assert!(json.get("created_at").is_none());

    let decoded: Product = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, product);
}

#[test]
fn draft_accepts_numeric_text_price() {
    let draft: ProductDraft = serde_json::from_value(serde_json::json!({
        "name": "Cable",
        "price": "12.50",
        "description": "USB-C cable",
        "category": "Accessories"
    }))
    .unwrap();

    assert_eq!(draft.price, Some(PriceInput::Text("12.50".to_string())));
    let valid = draft.validate().unwrap();
    assert_eq!(valid.price, 12.5);
}

#[test]
fn draft_accepts_negative_price() {
    let valid = ProductDraft::new("Refund", -10.0, "Store credit", "Misc")
        .validate()
        .unwrap();
    assert_eq!(valid.price, -10.0);
}

#[test]
fn draft_trims_text_fields() {
    let valid = ProductDraft::new("  Mouse ", 25.0, " Wireless mouse\n", " Accessories ")
        .validate()
        .unwrap();
    assert_eq!(valid.name, "Mouse");
    assert_eq!(valid.description, "Wireless mouse");
    assert_eq!(valid.category, "Accessories");
}

#[test]
fn missing_category_is_attributed_to_category() {
    let draft: ProductDraft = serde_json::from_value(serde_json::json!({
        "name": "Headphones",
        "price": 199,
        "description": "Noise cancelling"
    }))
    .unwrap();

    let err = draft.validate().unwrap_err();
    assert_eq!(err.fields(), vec![ProductField::Category]);
    assert_eq!(
        err.violation(ProductField::Category),
        Some(&FieldViolation::Missing)
    );
}

#[test]
fn missing_name_is_attributed_to_name() {
    let draft = ProductDraft {
        name: None,
        ..ProductDraft::new("unused", 5.0, "Pocket notebook", "Stationery")
    };

    let err = draft.validate().unwrap_err();
    assert!(err.has_violation(ProductField::Name));
    assert_eq!(err.violation_by_name("name"), Some(&FieldViolation::Missing));
    assert!(!err.has_violation(ProductField::Description));
}

#[test]
fn non_numeric_price_is_attributed_to_price() {
    let err = ProductDraft::new("Lamp", "twelve", "Desk lamp", "Home")
        .validate()
        .unwrap_err();
    assert_eq!(
        err.violation(ProductField::Price),
        Some(&FieldViolation::NotANumber {
            value: "twelve".to_string()
        })
    );
}

#[test]
fn empty_draft_reports_every_required_field() {
    let err = ProductDraft::default().validate().unwrap_err();
    assert_eq!(err.fields(), ProductField::REQUIRED.to_vec());
    assert!(err
        .violations()
        .all(|(_, violation)| *violation == FieldViolation::Missing));
}

#[test]
fn patch_deserializes_partial_fields() {
    let patch: ProductPatch =
        serde_json::from_value(serde_json::json!({ "category": "Gadgets", "price": 5 })).unwrap();

    assert_eq!(patch.category.as_deref(), Some("Gadgets"));
    assert_eq!(patch.price, Some(PriceInput::Number(5.0)));
    assert_eq!(
        patch.touched_fields(),
        vec![ProductField::Price, ProductField::Category]
    );
    assert!(!patch.is_empty());
    assert!(ProductPatch::default().is_empty());
}

#[test]
fn update_options_default_to_no_validation() {
    assert!(!UpdateOptions::default().run_validators);
    assert!(UpdateOptions::validated().run_validators);
}
