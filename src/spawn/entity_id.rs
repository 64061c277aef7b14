use std::{fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref ENTITY_ID: Regex = Regex::new(r"^ID\.-?\d+\.-?\d+(\.-?\d+)?$").unwrap();
}

/// Identifies an entity in the world. The text form is `ID.<spawner>.<number>` with an optional
/// `.<alt seed>` suffix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EntityId {
    pub spawner: i32,
    pub number: i32,
    pub alt_seed: Option<i32>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not an entity ID")]
pub struct ParseEntityIdError(String);

impl EntityId {
    pub fn new(spawner: i32, number: i32) -> EntityId {
        EntityId {
            spawner,
            number,
            alt_seed: None,
        }
    }

    pub fn with_alt_seed(self, alt_seed: i32) -> EntityId {
        EntityId {
            alt_seed: Some(alt_seed),
            ..self
        }
    }

    /// Returns `true` if `text` has the shape of an entity ID.
    pub fn looks_like(text: &str) -> bool {
        ENTITY_ID.is_match(text)
    }
}

impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let error = || ParseEntityIdError(text.to_string());

        if !EntityId::looks_like(text) {
            return Err(error());
        }

        // The regex guarantees the shape, but the numbers can still overflow.
        let mut parts = text.split('.').skip(1).map(str::parse::<i32>);

        let spawner = parts.next().and_then(Result::ok).ok_or_else(error)?;
        let number = parts.next().and_then(Result::ok).ok_or_else(error)?;

        let id = EntityId::new(spawner, number);

        match parts.next() {
            Some(Ok(alt_seed)) => Ok(id.with_alt_seed(alt_seed)),
            Some(Err(_)) => Err(error()),
            None => Ok(id),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID.{}.{}", self.spawner, self.number)?;

        if let Some(alt_seed) = self.alt_seed {
            write!(f, ".{alt_seed}")?;
        }

        Ok(())
    }
}
