use crate::Schema;
use chrono::DateTime;
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of type names a `type` rule may refer to.
///
/// Names are case-sensitive and spelled the way they appear in error
/// messages, e.g. `"String"` or `"Hash"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum TypeTag {
    String,
    /// A number stored as `i64` or `u64`. `serde_json` parses integer
    /// literals outside that range as floats, so those do not match.
    Integer,
    Float,
    Numeric,
    Boolean,
    TrueClass,
    FalseClass,
    Hash,
    Array,
    NilClass,
    Time,
    Object,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown type tag: {0:?}")]
pub struct UnknownTypeTag(pub String);

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Numeric => "Numeric",
            Self::Boolean => "Boolean",
            Self::TrueClass => "TrueClass",
            Self::FalseClass => "FalseClass",
            Self::Hash => "Hash",
            Self::Array => "Array",
            Self::NilClass => "NilClass",
            Self::Time => "Time",
            Self::Object => "Object",
        }
    }

    /// Whether `value` is of this type. Absent values are checked as null.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_f64(),
            Self::Numeric => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::TrueClass => value.as_bool() == Some(true),
            Self::FalseClass => value.as_bool() == Some(false),
            Self::Hash => value.is_object(),
            Self::Array => value.is_array(),
            Self::NilClass => value.is_null(),
            Self::Time => value
                .as_str()
                .map_or(false, |s| DateTime::parse_from_rfc3339(s).is_ok()),
            Self::Object => true,
        }
    }
}

impl FromStr for TypeTag {
    type Err = UnknownTypeTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "String" => Ok(Self::String),
            "Integer" => Ok(Self::Integer),
            "Float" => Ok(Self::Float),
            "Numeric" => Ok(Self::Numeric),
            "Boolean" => Ok(Self::Boolean),
            "TrueClass" => Ok(Self::TrueClass),
            "FalseClass" => Ok(Self::FalseClass),
            "Hash" => Ok(Self::Hash),
            "Array" => Ok(Self::Array),
            "NilClass" => Ok(Self::NilClass),
            "Time" => Ok(Self::Time),
            "Object" => Ok(Self::Object),
            _ => Err(UnknownTypeTag(s.to_owned())),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single rule applied to one field's value.
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    Type(TypeTag),
    Required(bool),
    Min(Number),
    Max(Number),
    MinLength(usize),
    MaxLength(usize),
    Nested(Schema),
    Array(RuleSet),
}

impl Rule {
    /// The rule's name in the serialized form of a schema.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Type(_) => "type",
            Self::Required(_) => "required",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::Nested(_) => "nested",
            Self::Array(_) => "array",
        }
    }
}

/// An ordered list of rules. Rules are evaluated in the order they were
/// added, and every rule runs regardless of whether an earlier one failed.
///
/// A rule set holds at most one rule of each name, like its serialized form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `rule`. A rule of the same name that is already present is
    /// replaced where it stands.
    pub fn rule(mut self, rule: Rule) -> Self {
        match self.rules.iter_mut().find(|r| r.name() == rule.name()) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        self
    }

    pub fn type_(self, tag: TypeTag) -> Self {
        self.rule(Rule::Type(tag))
    }

    pub fn required(self, required: bool) -> Self {
        self.rule(Rule::Required(required))
    }

    pub fn min(self, min: impl Into<Number>) -> Self {
        self.rule(Rule::Min(min.into()))
    }

    pub fn max(self, max: impl Into<Number>) -> Self {
        self.rule(Rule::Max(max.into()))
    }

    pub fn min_length(self, min_length: usize) -> Self {
        self.rule(Rule::MinLength(min_length))
    }

    pub fn max_length(self, max_length: usize) -> Self {
        self.rule(Rule::MaxLength(max_length))
    }

    pub fn nested(self, schema: Schema) -> Self {
        self.rule(Rule::Nested(schema))
    }

    pub fn array(self, items: RuleSet) -> Self {
        self.rule(Rule::Array(items))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        rules.into_iter().fold(Self::new(), Self::rule)
    }
}
