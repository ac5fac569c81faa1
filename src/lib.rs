//! Rule-based validation of untyped nested data.
//!
//! A [`Schema`] maps field names to ordered [`RuleSet`]s. A [`Validator`]
//! walks a JSON instance alongside the schema and returns every violation
//! it finds as a path-qualified message, in schema order:
//!
//! ```
//! use schemata::{Schema, SerdeSchema, Validator};
//! use serde_json::json;
//!
//! let serde_schema: SerdeSchema = serde_json::from_value(json!({
//!     "address": {
//!         "type": "Hash",
//!         "nested": {
//!             "zip": { "type": "String", "required": true, "min_length": 5 },
//!         },
//!     },
//!     "hobbies": {
//!         "type": "Array",
//!         "array": { "type": "String", "min_length": 2 },
//!     },
//! }))
//! .unwrap();
//!
//! let validator = Validator::new(Schema::from_serde_schema(serde_schema).unwrap());
//! let errors = validator.validate_value(&json!({
//!     "address": {},
//!     "hobbies": ["reading", "x"],
//! }));
//!
//! assert_eq!(
//!     vec![
//!         "address.zip must be a String",
//!         "address.zip is required",
//!         "hobbies.1.item must be at least 2 characters long",
//!     ],
//!     errors
//! );
//! ```
//!
//! Invalid data is never an `Err`: findings are returned as data so that
//! callers see all of them at once.

mod rule;
mod schema;
mod serde_schema;
mod validate;

pub use rule::*;
pub use schema::*;
pub use serde_schema::*;
pub use validate::*;
