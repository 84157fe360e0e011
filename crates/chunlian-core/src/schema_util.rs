//! Helpers for turning Rust type information into JSON Schema that can be
//! shipped alongside a prompt. The JSON is produced with [`schemars`] and is
//! forwarded to providers that support structured responses
//! (`response_format = json_schema`).

use schemars::{
    JsonSchema,
    r#gen::{SchemaGenerator, SchemaSettings},
};
use serde_json::{self, Value, json};

/// Generate a JSON Schema for the given `T` **inline**, i.e. without
/// `$ref` pointers to external definitions.
///
/// # Example
///
/// ```
/// use chunlian_core::schema_util::derive_response_schema;
/// use schemars::JsonSchema;
///
/// #[derive(JsonSchema)]
/// struct Foo { bar: String }
///
/// let schema = derive_response_schema::<Foo>();
/// assert_eq!(schema["type"], "object");
/// ```
pub fn derive_response_schema<T>() -> Value
where
    T: JsonSchema + 'static,
{
    // Inline everything; some providers do not resolve `$ref`s.
    let mut settings = SchemaSettings::draft07();
    settings.inline_subschemas = true;

    let generator = SchemaGenerator::new(settings);
    let root = generator.into_root_schema_for::<T>();

    serde_json::to_value(root).unwrap_or(Value::Null)
}

/// Wrap the schema of `T` into an OpenAI `response_format` object.
pub fn json_schema_response_format<T>(name: &str) -> Value
where
    T: JsonSchema + 'static,
{
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": name,
            "schema": derive_response_schema::<T>(),
        }
    })
}
