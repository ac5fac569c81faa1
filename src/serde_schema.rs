use crate::{Rule, RuleSet, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON representation of schemas, compatible with `serde_json`.
///
/// The outer object maps field names to rule sets; each rule set maps rule
/// names to parameters. Both levels keep their declaration order.
///
/// To convert this into a [`Schema`][`crate::Schema`], see
/// [`Schema::from_serde_schema`][`crate::Schema::from_serde_schema`].
///
/// ```
/// use schemata::SerdeSchema;
/// use serde_json::json;
///
/// let serde_schema: SerdeSchema = serde_json::from_value(json!({
///     "age": { "type": "Integer", "min": 0 },
/// }))
/// .unwrap();
///
/// assert_eq!(json!({ "type": "Integer", "min": 0 }), serde_schema.0["age"]);
/// ```
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct SerdeSchema(pub Map<String, Value>);

impl From<Schema> for SerdeSchema {
    fn from(schema: Schema) -> Self {
        SerdeSchema(fields_to_map(&schema))
    }
}

fn fields_to_map(schema: &Schema) -> Map<String, Value> {
    schema
        .fields()
        .iter()
        .map(|(name, rules)| (name.clone(), Value::Object(rules_to_map(rules))))
        .collect()
}

fn rules_to_map(rules: &RuleSet) -> Map<String, Value> {
    let mut out = Map::new();

    for rule in rules.rules() {
        let param = match rule {
            Rule::Type(tag) => Value::String(tag.name().to_owned()),
            Rule::Required(required) => Value::Bool(*required),
            Rule::Min(n) | Rule::Max(n) => Value::Number(n.clone()),
            Rule::MinLength(n) | Rule::MaxLength(n) => Value::from(*n),
            Rule::Nested(schema) => Value::Object(fields_to_map(schema)),
            Rule::Array(items) => Value::Object(rules_to_map(items)),
        };

        out.insert(rule.name().to_owned(), param);
    }

    out
}
