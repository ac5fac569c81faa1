#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use schemata::{Rule, RuleSet, Schema, TypeTag, ValidateOptions, Validator};
use serde_json::{Map, Number, Value};

#[derive(Arbitrary, Debug)]
enum FuzzRule {
    Type(TypeTag),
    Required(bool),
    Min(i64),
    Max(f64),
    MinLength(u8),
    MaxLength(u8),
    Nested(Vec<(String, Vec<FuzzRule>)>),
    Array(Vec<FuzzRule>),
}

#[derive(Arbitrary, Debug)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<FuzzValue>),
    Object(Vec<(String, FuzzValue)>),
}

fn to_schema(fields: Vec<(String, Vec<FuzzRule>)>) -> Schema {
    fields
        .into_iter()
        .fold(Schema::new(), |schema, (name, rules)| schema.field(name, to_rules(rules)))
}

fn to_rules(rules: Vec<FuzzRule>) -> RuleSet {
    rules.into_iter().fold(RuleSet::new(), |out, rule| {
        out.rule(match rule {
            FuzzRule::Type(tag) => Rule::Type(tag),
            FuzzRule::Required(required) => Rule::Required(required),
            FuzzRule::Min(n) => Rule::Min(n.into()),
            FuzzRule::Max(n) => Rule::Max(Number::from_f64(n).unwrap_or_else(|| 0.into())),
            FuzzRule::MinLength(n) => Rule::MinLength(n.into()),
            FuzzRule::MaxLength(n) => Rule::MaxLength(n.into()),
            FuzzRule::Nested(fields) => Rule::Nested(to_schema(fields)),
            FuzzRule::Array(items) => Rule::Array(to_rules(items)),
        })
    })
}

fn to_value(value: FuzzValue) -> Value {
    match value {
        FuzzValue::Null => Value::Null,
        FuzzValue::Bool(b) => Value::Bool(b),
        FuzzValue::Int(n) => n.into(),
        FuzzValue::Float(n) => Number::from_f64(n).map_or(Value::Null, Value::Number),
        FuzzValue::String(s) => Value::String(s),
        FuzzValue::Array(items) => Value::Array(items.into_iter().map(to_value).collect()),
        FuzzValue::Object(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k, to_value(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}

fuzz_target!(|input: (
    Vec<(String, Vec<FuzzRule>)>,
    FuzzValue,
    ValidateOptions
)| {
    let (fields, instance, options) = input;
    let validator = Validator::with_options(to_schema(fields), options);
    let _ = validator.validate_value(&to_value(instance));
});
