use crate::{Rule, RuleSet, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, trace};

/// The key array items are validated under, so that an item at index `1` of
/// `hobbies` is reported as `hobbies.1.item`.
const ITEM: &str = "item";

static NULL: Value = Value::Null;

/// Limits applied while validating.
///
/// A limit of zero means "no limit", which is the default. Options can be
/// built in code or deserialized from configuration:
///
/// ```
/// use schemata::ValidateOptions;
/// use serde_json::json;
///
/// let options: ValidateOptions = serde_json::from_value(json!({ "maxDepth": 8 })).unwrap();
/// assert_eq!(ValidateOptions::new().with_max_depth(8), options);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct ValidateOptions {
    max_depth: usize,
    max_errors: usize,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds how many `nested` or `array` descents may be stacked. A field
    /// whose descent would go past the bound gets a single finding instead.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Stops validation once this many findings have been collected.
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_errors(&self) -> usize {
        self.max_errors
    }
}

/// Validates data against a [`Schema`].
///
/// A `Validator` is immutable; one instance may be shared between threads
/// and used for any number of concurrent validations.
///
/// ```
/// use schemata::{RuleSet, Schema, TypeTag, Validator};
/// use serde_json::json;
///
/// let validator = Validator::new(
///     Schema::new().field("name", RuleSet::new().type_(TypeTag::String).min_length(2)),
/// );
///
/// assert_eq!(
///     vec!["name must be at least 2 characters long"],
///     validator.validate_value(&json!({ "name": "J" }))
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Validator {
    schema: Schema,
    options: ValidateOptions,
}

impl Validator {
    pub fn new(schema: Schema) -> Self {
        Self::with_options(schema, ValidateOptions::default())
    }

    pub fn with_options(schema: Schema, options: ValidateOptions) -> Self {
        Self { schema, options }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> ValidateOptions {
        self.options
    }

    /// Returns every violation found in `data`, in schema order. An empty
    /// list means `data` satisfies the schema.
    pub fn validate(&self, data: &Map<String, Value>) -> Vec<String> {
        self.validate_at::<&str>(data, &[])
    }

    /// Like [`validate`][`Validator::validate`], but prefixes every finding
    /// with `path`, as if `data` were located there in a larger document.
    pub fn validate_at<S: AsRef<str>>(&self, data: &Map<String, Value>, path: &[S]) -> Vec<String> {
        let mut vm = Vm {
            max_depth: self.options.max_depth,
            max_errors: self.options.max_errors,
            depth: 0,
            instance_tokens: path.iter().map(|s| s.as_ref().to_owned()).collect(),
            errors: vec![],
        };

        trace!(
            fields = self.schema.len(),
            path = %vm.instance_tokens.join("."),
            "validating"
        );

        match vm.validate_fields(&self.schema, data) {
            Ok(()) => {}
            Err(VmValidateError::MaxErrorsReached) => {
                debug!(max_errors = vm.max_errors, "error limit reached, stopping");
            }
        }

        debug!(errors = vm.errors.len(), "validated");
        vm.errors
    }

    /// Validates any JSON value. A value that is not an object has no
    /// fields, so every field in the schema is treated as absent.
    pub fn validate_value(&self, data: &Value) -> Vec<String> {
        match data.as_object() {
            Some(obj) => self.validate(obj),
            None => self.validate(&Map::new()),
        }
    }
}

struct Vm {
    max_depth: usize,
    max_errors: usize,
    depth: usize,
    instance_tokens: Vec<String>,
    errors: Vec<String>,
}

enum VmValidateError {
    MaxErrorsReached,
}

impl Vm {
    fn validate_fields(
        &mut self,
        schema: &Schema,
        data: &Map<String, Value>,
    ) -> Result<(), VmValidateError> {
        for (name, rules) in schema.fields() {
            let value = data.get(name).unwrap_or(&NULL);
            self.validate_field(name, rules, value)?;
        }

        Ok(())
    }

    fn validate_field(
        &mut self,
        name: &str,
        rules: &RuleSet,
        value: &Value,
    ) -> Result<(), VmValidateError> {
        self.push_instance_token(name);

        for rule in rules.rules() {
            match rule {
                Rule::Type(tag) => {
                    if !tag.matches(value) {
                        self.push_error(format_args!("must be a {}", tag))?;
                    }
                }
                Rule::Required(required) => {
                    if *required && value.is_null() {
                        self.push_error("is required")?;
                    }
                }
                Rule::Min(min) => {
                    if compare(value, min) == Some(Ordering::Less) {
                        self.push_error(format_args!("must be at least {}", min))?;
                    }
                }
                Rule::Max(max) => {
                    if compare(value, max) == Some(Ordering::Greater) {
                        self.push_error(format_args!("must be at most {}", max))?;
                    }
                }
                Rule::MinLength(min_length) => {
                    if let Some(s) = value.as_str() {
                        if s.chars().count() < *min_length {
                            self.push_error(format_args!(
                                "must be at least {} characters long",
                                min_length
                            ))?;
                        }
                    }
                }
                Rule::MaxLength(max_length) => {
                    if let Some(s) = value.as_str() {
                        if s.chars().count() > *max_length {
                            self.push_error(format_args!(
                                "must be at most {} characters long",
                                max_length
                            ))?;
                        }
                    }
                }
                Rule::Nested(schema) => {
                    if let Some(obj) = value.as_object() {
                        if self.enter()? {
                            self.validate_fields(schema, obj)?;
                            self.leave();
                        }
                    } else {
                        self.push_error("must be a Hash for nested validation")?;
                    }
                }
                Rule::Array(items) => {
                    if let Some(arr) = value.as_array() {
                        if self.enter()? {
                            for (i, item) in arr.iter().enumerate() {
                                self.push_instance_token(&i.to_string());
                                self.validate_field(ITEM, items, item)?;
                                self.pop_instance_token();
                            }
                            self.leave();
                        }
                    } else {
                        self.push_error("must be an Array")?;
                    }
                }
            }
        }

        self.pop_instance_token();
        Ok(())
    }

    /// Starts a nested descent. Returns `false`, after recording a finding,
    /// if the descent would go past the configured depth.
    fn enter(&mut self) -> Result<bool, VmValidateError> {
        if self.max_depth != 0 && self.depth == self.max_depth {
            debug!(
                path = %self.instance_tokens.join("."),
                max_depth = self.max_depth,
                "max depth exceeded"
            );

            let max_depth = self.max_depth;
            self.push_error(format_args!(
                "exceeds the maximum nesting depth of {}",
                max_depth
            ))?;

            return Ok(false);
        }

        self.depth += 1;
        Ok(true)
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn push_error(&mut self, message: impl fmt::Display) -> Result<(), VmValidateError> {
        self.errors
            .push(format!("{} {}", self.instance_tokens.join("."), message));

        if self.max_errors == self.errors.len() {
            Err(VmValidateError::MaxErrorsReached)
        } else {
            Ok(())
        }
    }

    fn push_instance_token(&mut self, token: &str) {
        self.instance_tokens.push(token.to_owned());
    }

    fn pop_instance_token(&mut self) {
        self.instance_tokens.pop();
    }
}

/// Orders a numeric `value` against a bound. Non-numbers are unordered, so
/// `min` and `max` skip them. Integers compare exactly; anything involving a
/// float compares as `f64`.
fn compare(value: &Value, bound: &Number) -> Option<Ordering> {
    let value = match value {
        Value::Number(n) => n,
        _ => return None,
    };

    match (as_i128(value), as_i128(bound)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => value.as_f64()?.partial_cmp(&bound.as_f64()?),
    }
}

fn as_i128(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SerdeSchema, TypeTag};
    use serde_json::json;

    fn validator(schema: Value) -> Validator {
        let serde_schema: SerdeSchema = serde_json::from_value(schema).unwrap();
        Validator::new(Schema::from_serde_schema(serde_schema).unwrap())
    }

    fn person_schema() -> Validator {
        validator(json!({
            "name": { "type": "String", "required": true, "min_length": 2, "max_length": 50 },
            "age": { "type": "Integer", "required": true, "min": 0, "max": 120 },
            "email": { "type": "String", "required": true },
            "address": {
                "type": "Hash",
                "required": true,
                "nested": {
                    "street": { "type": "String", "required": true },
                    "city": { "type": "String", "required": true },
                    "zip": { "type": "String", "required": true, "min_length": 5, "max_length": 10 },
                },
            },
            "hobbies": {
                "type": "Array",
                "array": { "type": "String", "min_length": 2 },
            },
        }))
    }

    fn valid_person() -> Value {
        json!({
            "name": "John Doe",
            "age": 30,
            "email": "john@example.com",
            "address": {
                "street": "123 Main St",
                "city": "Anytown",
                "zip": "12345",
            },
            "hobbies": ["reading", "cycling", "photography"],
        })
    }

    #[test]
    fn empty_schema_accepts_anything() {
        let validator = Validator::new(Schema::new());

        assert!(validator.validate_value(&json!({})).is_empty());
        assert!(validator.validate_value(&json!({ "a": [1, { "b": null }] })).is_empty());
        assert!(validator.validate_value(&json!("not an object")).is_empty());
    }

    #[test]
    fn valid_data() {
        assert!(person_schema().validate_value(&valid_person()).is_empty());
    }

    #[test]
    fn invalid_data() {
        let errors = person_schema().validate_value(&json!({
            "name": "J",
            "age": 150,
            "email": null,
            "address": {
                "street": "456 Elm St",
                "city": "Somewhere",
            },
            "hobbies": ["reading", "x"],
        }));

        assert_eq!(
            vec![
                "name must be at least 2 characters long",
                "age must be at most 120",
                "email must be a String",
                "email is required",
                "address.zip must be a String",
                "address.zip is required",
                "hobbies.1.item must be at least 2 characters long",
            ],
            errors
        );
    }

    #[test]
    fn single_rule_violation() {
        let validator = validator(json!({
            "name": { "type": "String", "min_length": 2 },
        }));

        assert_eq!(
            vec!["name must be at least 2 characters long"],
            validator.validate_value(&json!({ "name": "J" }))
        );
    }

    #[test]
    fn nested_object_validation() {
        let mut data = valid_person();
        data["address"]["zip"] = json!("1234");

        assert_eq!(
            vec!["address.zip must be at least 5 characters long"],
            person_schema().validate_value(&data)
        );
    }

    #[test]
    fn missing_required_nested_field() {
        let mut data = valid_person();
        data["address"].as_object_mut().unwrap().remove("city");

        assert_eq!(
            vec!["address.city must be a String", "address.city is required"],
            person_schema().validate_value(&data)
        );
    }

    #[test]
    fn array_validation() {
        let mut data = valid_person();
        data["hobbies"] = json!(["a", "reading", ""]);

        assert_eq!(
            vec![
                "hobbies.0.item must be at least 2 characters long",
                "hobbies.2.item must be at least 2 characters long",
            ],
            person_schema().validate_value(&data)
        );
    }

    #[test]
    fn invalid_type() {
        let mut data = valid_person();
        data["age"] = json!("thirty");

        assert_eq!(
            vec!["age must be a Integer"],
            person_schema().validate_value(&data)
        );
    }

    #[test]
    fn findings_follow_rule_declaration_order() {
        let required_first = Validator::new(
            Schema::new().field("email", RuleSet::new().required(true).type_(TypeTag::String)),
        );
        let type_first = Validator::new(
            Schema::new().field("email", RuleSet::new().type_(TypeTag::String).required(true)),
        );

        assert_eq!(
            vec!["email is required", "email must be a String"],
            required_first.validate_value(&json!({}))
        );
        assert_eq!(
            vec!["email must be a String", "email is required"],
            type_first.validate_value(&json!({}))
        );
    }

    #[test]
    fn nested_and_type_failures_both_reported() {
        let validator = validator(json!({
            "address": { "type": "Hash", "nested": { "zip": { "required": true } } },
        }));

        assert_eq!(
            vec![
                "address must be a Hash",
                "address must be a Hash for nested validation",
            ],
            validator.validate_value(&json!({ "address": "123 Main St" }))
        );
    }

    #[test]
    fn array_rule_on_non_array() {
        let validator = validator(json!({
            "tags": { "array": { "type": "String" } },
        }));

        assert_eq!(
            vec!["tags must be an Array"],
            validator.validate_value(&json!({ "tags": "a,b" }))
        );
        assert_eq!(
            vec!["tags must be an Array"],
            validator.validate_value(&json!({}))
        );
    }

    #[test]
    fn bounds_skip_values_of_other_kinds() {
        let validator = validator(json!({
            "n": { "min": 1, "max": 2 },
            "s": { "min_length": 3, "max_length": 4 },
        }));

        assert!(validator
            .validate_value(&json!({ "n": "zero", "s": 12345 }))
            .is_empty());
        assert!(validator.validate_value(&json!({})).is_empty());
    }

    #[test]
    fn numeric_bounds() {
        let validator = validator(json!({
            "ratio": { "min": 0.5, "max": 1 },
            "big": { "max": 9007199254740993u64 },
        }));

        assert_eq!(
            vec!["ratio must be at least 0.5", "big must be at most 9007199254740993"],
            validator.validate_value(&json!({
                "ratio": 0.25,
                "big": 9007199254740994u64,
            }))
        );
        assert_eq!(
            vec!["ratio must be at most 1"],
            validator.validate_value(&json!({ "ratio": 1.5, "big": 9007199254740993u64 }))
        );
        assert!(validator
            .validate_value(&json!({ "ratio": 1, "big": -1 }))
            .is_empty());
    }

    #[test]
    fn lengths_count_characters() {
        let validator = validator(json!({
            "city": { "min_length": 3, "max_length": 4 },
        }));

        assert!(validator.validate_value(&json!({ "city": "Köln" })).is_empty());
        assert_eq!(
            vec!["city must be at most 4 characters long"],
            validator.validate_value(&json!({ "city": "Zürich" }))
        );
    }

    #[test]
    fn array_of_objects() {
        let validator = validator(json!({
            "people": {
                "array": {
                    "type": "Hash",
                    "nested": { "name": { "type": "String", "required": true } },
                },
            },
        }));

        assert_eq!(
            vec![
                "people.1.item.name must be a String",
                "people.1.item.name is required",
                "people.2.item must be a Hash",
                "people.2.item must be a Hash for nested validation",
            ],
            validator.validate_value(&json!({
                "people": [{ "name": "Ada" }, {}, 7],
            }))
        );
    }

    #[test]
    fn validate_at_prefixes_path() {
        let validator = validator(json!({
            "zip": { "required": true },
        }));

        assert_eq!(
            vec!["order.shipping.zip is required"],
            validator.validate_at(&Map::new(), &["order", "shipping"])
        );
    }

    #[test]
    fn non_object_instance_has_no_fields() {
        let validator = validator(json!({
            "name": { "required": true },
        }));

        assert_eq!(
            vec!["name is required"],
            validator.validate_value(&json!(["name"]))
        );
    }

    #[test]
    fn idempotent() {
        let validator = person_schema();
        let data = json!({ "name": 5, "hobbies": [1, "x"], "address": [] });

        assert_eq!(validator.validate_value(&data), validator.validate_value(&data));
    }

    #[test]
    fn max_depth() {
        let options = ValidateOptions::new().with_max_depth(1);
        let schema = Schema::new().field(
            "a",
            RuleSet::new().nested(Schema::new().field(
                "b",
                RuleSet::new().nested(Schema::new().field("c", RuleSet::new().required(true))),
            )),
        );

        let validator = Validator::with_options(schema.clone(), options);
        assert_eq!(
            vec!["a.b exceeds the maximum nesting depth of 1"],
            validator.validate_value(&json!({ "a": { "b": {} } }))
        );

        let validator = Validator::with_options(schema, options.with_max_depth(2));
        assert_eq!(
            vec!["a.b.c is required"],
            validator.validate_value(&json!({ "a": { "b": {} } }))
        );
    }

    #[test]
    fn max_depth_counts_array_descents() {
        let validator = Validator::with_options(
            Schema::new().field(
                "matrix",
                RuleSet::new().array(RuleSet::new().array(RuleSet::new().type_(TypeTag::Integer))),
            ),
            ValidateOptions::new().with_max_depth(1),
        );

        assert_eq!(
            vec![
                "matrix.0.item exceeds the maximum nesting depth of 1",
                "matrix.1.item must be an Array",
            ],
            validator.validate_value(&json!({ "matrix": [["x"], 5] }))
        );
    }

    #[test]
    fn max_errors() {
        let validator = Validator::with_options(
            Schema::new().field("list", RuleSet::new().array(RuleSet::new().type_(TypeTag::String))),
            ValidateOptions::new().with_max_errors(3),
        );

        assert_eq!(
            vec![
                "list.0.item must be a String",
                "list.1.item must be a String",
                "list.2.item must be a String",
            ],
            validator.validate_value(&json!({ "list": [null, null, null, null, null] }))
        );
    }

    #[test]
    fn options_from_config() {
        assert_eq!(
            ValidateOptions::new().with_max_depth(16).with_max_errors(100),
            serde_json::from_value(json!({ "maxDepth": 16, "maxErrors": 100 })).unwrap()
        );
        assert_eq!(
            ValidateOptions::default(),
            serde_json::from_value(json!({})).unwrap()
        );
    }

    #[test]
    fn concurrent_validation() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Validator>();

        let validator = person_schema();
        let valid = valid_person();
        let mut invalid = valid_person();
        invalid["age"] = json!(-1);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let validator = &validator;
                    let data = if i % 2 == 0 { &valid } else { &invalid };
                    s.spawn(move || validator.validate_value(data))
                })
                .collect();

            for (i, handle) in handles.into_iter().enumerate() {
                let errors = handle.join().unwrap();
                if i % 2 == 0 {
                    assert!(errors.is_empty());
                } else {
                    assert_eq!(vec!["age must be at least 0"], errors);
                }
            }
        });
    }

    #[test]
    fn validation_suite() {
        use std::collections::BTreeMap;

        #[derive(serde::Deserialize)]
        struct TestCase {
            schema: SerdeSchema,
            instance: Value,
            errors: Vec<String>,
        }

        let test_cases: BTreeMap<String, TestCase> =
            serde_json::from_str(include_str!("../schema-suite/validation.json"))
                .expect("parse validation.json");

        for (test_case_name, test_case) in test_cases {
            let schema = Schema::from_serde_schema(test_case.schema).expect(&test_case_name);

            assert_eq!(
                test_case.errors,
                Validator::new(schema).validate_value(&test_case.instance),
                "wrong validation errors returned: {}",
                &test_case_name
            );
        }
    }
}
