use serde_json::{Map, Value};

use super::ObjectFactory;
use crate::features::decode::{describe, DecodeError};

/// A description of an object to build: a type name plus the fields to build it from.
#[derive(Clone, PartialEq, Debug)]
pub struct ConstructionSpec {
    pub type_id: String,
    pub fields: Map<String, Value>,
}

impl ConstructionSpec {
    pub fn new(type_id: impl Into<String>, fields: Map<String, Value>) -> ConstructionSpec {
        ConstructionSpec {
            type_id: type_id.into(),
            fields,
        }
    }

    /// Reads a description, failing if `factory` can't build its type.
    ///
    /// Two shapes are accepted: `{ "type": "Spear", "explosive": true }`, and the keyed form
    /// `{ "Spear": { "explosive": true } }` with exactly one key.
    pub fn decode(json: &Value, factory: &ObjectFactory) -> Result<ConstructionSpec, DecodeError> {
        let object = json
            .as_object()
            .ok_or_else(|| DecodeError::wrong_type("an object description", json))?;

        let spec = match object.get("type") {
            Some(Value::String(type_id)) => {
                let mut fields = object.clone();
                fields.remove("type");

                ConstructionSpec::new(type_id.as_str(), fields)
            }

            Some(other) => {
                return Err(DecodeError::Invalid(format!(
                    "object type must be a string, not {}",
                    describe(other)
                )))
            }

            None => {
                let mut entries = object.iter();

                match (entries.next(), entries.next()) {
                    (Some((type_id, fields)), None) => ConstructionSpec::keyed(type_id, fields)?,
                    _ => {
                        return Err(DecodeError::Invalid(
                            "an object description needs a \"type\" key or exactly one type name"
                                .to_string(),
                        ))
                    }
                }
            }
        };

        spec.checked(factory)
    }

    /// Reads a list of descriptions. Either an array of descriptions or an object mapping type
    /// names to their fields is accepted.
    pub fn decode_list(
        json: &Value,
        factory: &ObjectFactory,
    ) -> Result<Vec<ConstructionSpec>, DecodeError> {
        match json {
            Value::Array(items) => items
                .iter()
                .map(|item| ConstructionSpec::decode(item, factory))
                .collect(),

            Value::Object(entries) => entries
                .iter()
                .map(|(type_id, fields)| ConstructionSpec::keyed(type_id, fields)?.checked(factory))
                .collect(),

            _ => Err(DecodeError::wrong_type("a list of object descriptions", json)),
        }
    }

    fn keyed(type_id: &str, fields: &Value) -> Result<ConstructionSpec, DecodeError> {
        match fields {
            Value::Object(fields) => Ok(ConstructionSpec::new(type_id, fields.clone())),
            Value::Null => Ok(ConstructionSpec::new(type_id, Map::new())),
            other => Err(DecodeError::Invalid(format!(
                "fields of '{type_id}' must be an object, not {}",
                describe(other)
            ))),
        }
    }

    fn checked(self, factory: &ObjectFactory) -> Result<ConstructionSpec, DecodeError> {
        factory
            .check(&self.type_id)
            .map_err(|err| DecodeError::Invalid(err.to_string()))?;

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagged_and_keyed_forms_agree() {
        let factory = ObjectFactory::with_builtins();

        let tagged =
            ConstructionSpec::decode(&json!({ "type": "Spear", "explosive": true }), &factory)
                .unwrap();
        let keyed =
            ConstructionSpec::decode(&json!({ "Spear": { "explosive": true } }), &factory).unwrap();

        assert_eq!(tagged, keyed);
        assert_eq!(tagged.type_id, "Spear");
        assert_eq!(tagged.fields.get("explosive"), Some(&json!(true)));
    }

    #[test]
    fn unknown_types_fail_to_decode() {
        let factory = ObjectFactory::with_builtins();

        assert!(ConstructionSpec::decode(&json!({ "type": "NotARealType" }), &factory).is_err());
        assert!(ConstructionSpec::decode(&json!({ "Spear": 3 }), &factory).is_err());
        assert!(
            ConstructionSpec::decode(&json!({ "Spear": {}, "WaterNut": {} }), &factory).is_err()
        );
        assert!(ConstructionSpec::decode(&json!("Spear"), &factory).is_err());
    }

    #[test]
    fn lists_come_in_both_shapes() {
        let factory = ObjectFactory::with_builtins();

        let from_object = ConstructionSpec::decode_list(
            &json!({ "DataPearl": { "dataPearlType": "CC" }, "Spear": {} }),
            &factory,
        )
        .unwrap();

        let from_array = ConstructionSpec::decode_list(
            &json!([{ "DataPearl": { "dataPearlType": "CC" } }, { "type": "Spear" }]),
            &factory,
        )
        .unwrap();

        assert_eq!(from_object.len(), 2);
        assert_eq!(from_object, from_array);
    }
}
