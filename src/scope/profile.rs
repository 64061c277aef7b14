use std::{
    any::Any,
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::Rc,
};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::features::ScopeKind;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("profile document must be a JSON object")]
    NotAnObject,

    #[error("'features' must be a JSON object")]
    FeaturesNotAnObject,
}

/// The raw flag values declared for one scope identity.
///
/// Profiles never change after loading. Decoded values (and decode failures) are remembered per
/// flag so each flag is decoded at most once per profile.
pub struct Profile {
    identity: Option<String>,
    values: Map<String, Value>,
    decoded: RefCell<HashMap<(ScopeKind, String), Option<Rc<dyn Any>>>>,
}

impl Profile {
    /// Creates a profile with no values.
    pub fn empty(identity: Option<String>) -> Profile {
        Profile::with_values(identity, Map::new())
    }

    pub fn with_values(identity: Option<String>, values: Map<String, Value>) -> Profile {
        Profile {
            identity,
            values,
            decoded: RefCell::new(HashMap::new()),
        }
    }

    /// Parses a profile document. Flag values live in the document's `features` object.
    pub fn parse(identity: &str, text: &str) -> Result<Profile, ProfileError> {
        let document: Value = serde_json::from_str(text)?;

        let mut document = match document {
            Value::Object(map) => map,
            _ => return Err(ProfileError::NotAnObject),
        };

        let values = match document.remove("features") {
            Some(Value::Object(features)) => features,
            Some(_) => return Err(ProfileError::FeaturesNotAnObject),
            None => Map::new(),
        };

        Ok(Profile::with_values(Some(identity.to_string()), values))
    }

    /// The identity this profile was loaded for.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Returns the raw value stored under `id`.
    pub fn raw(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the decoded value for a flag, running `decode` the first time it's requested.
    pub(crate) fn decoded<T: Clone + 'static>(
        &self,
        kind: ScopeKind,
        id: &str,
        decode: impl FnOnce(&Value) -> Option<T>,
    ) -> Option<T> {
        let key = (kind, id.to_string());

        if let Some(cached) = self.decoded.borrow().get(&key) {
            match cached {
                None => return None,
                Some(value) => {
                    if let Some(value) = value.downcast_ref::<T>() {
                        return Some(value.clone());
                    }
                }
            }
        }

        let value = decode(self.raw(id)?);

        self.decoded.borrow_mut().insert(
            key,
            value.clone().map(|value| Rc::new(value) as Rc<dyn Any>),
        );

        value
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("identity", &self.identity)
            .field("values", &self.values)
            .finish()
    }
}
