use crate::{Rule, RuleSet, SerdeSchema, TypeTag};
use serde_json::{Map, Value};
use std::convert::TryFrom;
use thiserror::Error;
use tracing::debug;

/// An ordered mapping from field name to the rules for that field.
///
/// Fields are visited in the order they were declared, which is also the
/// order their findings appear in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    fields: Vec<(String, RuleSet)>,
}

/// Errors that may arise from [`Schema::from_serde_schema`].
///
/// `path` is the dotted location of the offending rule set within the
/// serialized schema, e.g. `address.nested.zip` or `hobbies.array`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FromSerdeSchemaError {
    #[error("rules for {path} must be an object")]
    InvalidRuleSet { path: String },

    #[error("unknown type {type_:?} for {path}")]
    UnknownType { path: String, type_: String },

    #[error("rule {rule:?} for {path} must be {expected}")]
    InvalidParameter {
        path: String,
        rule: String,
        expected: &'static str,
    },
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Later fields are visited after earlier ones; a field
    /// that is already declared keeps its position and takes the new rules.
    pub fn field(mut self, name: impl Into<String>, rules: RuleSet) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = rules,
            None => self.fields.push((name, rules)),
        }
        self
    }

    pub fn fields(&self) -> &[(String, RuleSet)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts the serde representation of a schema into a [`Schema`].
    ///
    /// Unknown rule names are skipped. Unknown type names and parameters of
    /// the wrong kind are rejected, so a schema that converts successfully
    /// never contains a rule that silently matches nothing.
    ///
    /// ```
    /// use schemata::{Schema, SerdeSchema};
    /// use serde_json::json;
    ///
    /// let serde_schema: SerdeSchema = serde_json::from_value(json!({
    ///     "name": { "type": "String", "min_length": 2 },
    /// }))
    /// .unwrap();
    ///
    /// let schema = Schema::from_serde_schema(serde_schema).unwrap();
    /// assert_eq!(1, schema.len());
    /// ```
    pub fn from_serde_schema(serde_schema: SerdeSchema) -> Result<Self, FromSerdeSchemaError> {
        from_fields(serde_schema.0, &[])
    }
}

fn from_fields(fields: Map<String, Value>, path: &[String]) -> Result<Schema, FromSerdeSchemaError> {
    let mut schema = Schema::new();

    for (name, rules) in fields {
        let mut field_path = path.to_vec();
        field_path.push(name.clone());

        let rules = from_rules(rules, &field_path)?;
        schema = schema.field(name, rules);
    }

    Ok(schema)
}

fn from_rules(rules: Value, path: &[String]) -> Result<RuleSet, FromSerdeSchemaError> {
    let rules = match rules {
        Value::Object(rules) => rules,
        _ => {
            return Err(FromSerdeSchemaError::InvalidRuleSet {
                path: path.join("."),
            })
        }
    };

    let mut out = RuleSet::new();
    for (name, param) in rules {
        let invalid = |expected| FromSerdeSchemaError::InvalidParameter {
            path: path.join("."),
            rule: name.clone(),
            expected,
        };

        let rule = match name.as_str() {
            "type" => {
                let type_ = param.as_str().ok_or_else(|| invalid("a string"))?;
                let tag = type_
                    .parse::<TypeTag>()
                    .map_err(|_| FromSerdeSchemaError::UnknownType {
                        path: path.join("."),
                        type_: type_.to_owned(),
                    })?;

                Rule::Type(tag)
            }
            "required" => Rule::Required(param.as_bool().ok_or_else(|| invalid("a boolean"))?),
            "min" => Rule::Min(as_number(param).ok_or_else(|| invalid("a number"))?),
            "max" => Rule::Max(as_number(param).ok_or_else(|| invalid("a number"))?),
            "min_length" => {
                Rule::MinLength(as_length(&param).ok_or_else(|| invalid("a non-negative integer"))?)
            }
            "max_length" => {
                Rule::MaxLength(as_length(&param).ok_or_else(|| invalid("a non-negative integer"))?)
            }
            "nested" => match param {
                Value::Object(fields) => {
                    let mut nested_path = path.to_vec();
                    nested_path.push("nested".to_owned());
                    Rule::Nested(from_fields(fields, &nested_path)?)
                }
                _ => return Err(invalid("an object of field rules")),
            },
            "array" => {
                let mut items_path = path.to_vec();
                items_path.push("array".to_owned());
                Rule::Array(from_rules(param, &items_path)?)
            }
            _ => {
                debug!(path = %path.join("."), rule = %name, "ignoring unknown rule");
                continue;
            }
        };

        out = out.rule(rule);
    }

    Ok(out)
}

fn as_number(value: Value) -> Option<serde_json::Number> {
    match value {
        Value::Number(n) => Some(n),
        _ => None,
    }
}

fn as_length(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|n| usize::try_from(n).ok())
}
