//! Field declarations for every entity type the recall API exposes.
//!
//! Embedded types are declared before the types that embed them, so
//! [`register_all`] can be run against an empty registry in one pass.
//!
//! | Entity | Path | Embeds |
//! |--------|------|--------|
//! | `product` | `products` | |
//! | `remedy` | `remedies` | |
//! | `manufacturer` | `manufacturers` | |
//! | `recall` | `recalls` | one `remedy`, many `product` |
//! | `subscription` | `subscriptions` | |

use std::sync::Arc;

use recallwire::{
    EntityDeclaration, FieldSpec, FieldType, ScalarKind, SchemaError, SchemaRegistry,
};

pub const PRODUCT: &str = "product";
pub const REMEDY: &str = "remedy";
pub const MANUFACTURER: &str = "manufacturer";
pub const RECALL: &str = "recall";
pub const SUBSCRIPTION: &str = "subscription";

const STRING_LIST: FieldType = FieldType::List(ScalarKind::String);
const NUMBER: FieldType = FieldType::Scalar(ScalarKind::Number);
const BOOLEAN: FieldType = FieldType::Scalar(ScalarKind::Boolean);
const TIMESTAMP: FieldType = FieldType::Scalar(ScalarKind::Timestamp);
const IDENTIFIER: FieldType = FieldType::Scalar(ScalarKind::Identifier);

pub fn product() -> EntityDeclaration {
    EntityDeclaration::new(PRODUCT).fields([
        FieldSpec::field("name").inbound(),
        FieldSpec::field("model_number").inbound(),
        FieldSpec::field("upc").alias("upcs").of(STRING_LIST).inbound(),
        FieldSpec::field("units_affected").of(NUMBER).inbound(),
        FieldSpec::field("sold_from").of(TIMESTAMP).inbound(),
        FieldSpec::field("sold_until").of(TIMESTAMP).inbound(),
    ])
}

pub fn remedy() -> EntityDeclaration {
    EntityDeclaration::new(REMEDY)
        .plural("remedies")
        .path("remedies")
        .fields([
            FieldSpec::field("kind").inbound(),
            FieldSpec::field("instructions").inbound(),
            FieldSpec::field("available_at").of(TIMESTAMP).inbound(),
        ])
}

pub fn manufacturer() -> EntityDeclaration {
    EntityDeclaration::new(MANUFACTURER).fields([
        FieldSpec::field("name").inbound(),
        FieldSpec::field("country").inbound(),
        FieldSpec::field("website").inbound(),
        FieldSpec::field("recall_count").of(NUMBER).default_value(0_i64).outbound(),
        FieldSpec::field("created_at").of(TIMESTAMP).outbound(),
        FieldSpec::field("import_batch").internal(),
    ])
}

/// The recall notice itself.
///
/// `affected_units` is recomputed from the embedded products on every write
/// and `revision` counts writes; neither is accepted from clients.
pub fn recall() -> EntityDeclaration {
    EntityDeclaration::new(RECALL).fields([
        FieldSpec::field("title").inbound(),
        FieldSpec::field("description").inbound(),
        FieldSpec::field("hazard").inbound(),
        FieldSpec::field("category").inbound(),
        FieldSpec::field("status").default_value("open").inbound(),
        FieldSpec::field("published_at").of(TIMESTAMP).inbound(),
        FieldSpec::field("manufacturer_id").inbound(),
        FieldSpec::field("tags").of(STRING_LIST).inbound(),
        FieldSpec::field("external_id").of(IDENTIFIER),
        FieldSpec::embeds_one("remedy", REMEDY).inbound(),
        FieldSpec::embeds_many("products", PRODUCT).inbound(),
        FieldSpec::field("affected_units").of(NUMBER).default_value(0_i64).outbound(),
        FieldSpec::field("created_at").of(TIMESTAMP).outbound(),
        FieldSpec::field("updated_at").of(TIMESTAMP).outbound(),
        FieldSpec::field("revision").of(NUMBER).default_value(0_i64).meta(),
        FieldSpec::field("internal_notes").internal(),
    ])
}

pub fn subscription() -> EntityDeclaration {
    EntityDeclaration::new(SUBSCRIPTION).fields([
        FieldSpec::field("email").wire_name("emailAddress").inbound(),
        FieldSpec::field("categories").of(STRING_LIST).inbound(),
        FieldSpec::field("delivery").alias("channel").default_value("email").inbound(),
        FieldSpec::field("confirmation_code").write_only(),
        FieldSpec::field("confirmed").of(BOOLEAN).default_value(false).outbound(),
        FieldSpec::field("unsubscribe_token").internal(),
    ])
}

/// Declare every entity type on `registry`.
pub fn register_all(registry: &mut SchemaRegistry) -> Result<(), SchemaError> {
    for decl in [product(), remedy(), manufacturer(), recall(), subscription()] {
        registry.declare(decl)?;
    }
    Ok(())
}

/// A frozen registry holding every entity type.
pub fn registry() -> Result<Arc<SchemaRegistry>, SchemaError> {
    let mut registry = SchemaRegistry::new();
    register_all(&mut registry)?;
    Ok(Arc::new(registry))
}
