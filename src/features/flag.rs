use std::{fmt, rc::Rc};

use serde_json::Value;
use strum::{Display, EnumIter, IntoStaticStr};

use super::decode::DecodeError;

/// The kind of object a flag is attached to.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Display, EnumIter, IntoStaticStr,
)]
pub enum ScopeKind {
    /// Process-wide values read from the global profile.
    Global,

    /// Values that apply to a whole game session.
    Session,

    /// Values that apply to a single creature.
    Actor,
}

/// Turns a raw profile value into a typed one.
pub type Decoder<T> = Rc<dyn Fn(&Value) -> Result<T, DecodeError>>;

/// A typed flag declaration. Flags are created by `Registry::declare` and are cheap to clone.
pub struct FeatureFlag<T> {
    id: Rc<str>,
    kind: ScopeKind,
    decoder: Decoder<T>,
}

impl<T> FeatureFlag<T> {
    pub(super) fn new(id: &str, kind: ScopeKind, decoder: Decoder<T>) -> FeatureFlag<T> {
        FeatureFlag {
            id: Rc::from(id),
            kind,
            decoder,
        }
    }

    /// The key this flag is read from.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The scope kind the flag is bound to.
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Runs the flag's decoder over `raw`.
    pub fn decode(&self, raw: &Value) -> Result<T, DecodeError> {
        (self.decoder)(raw)
    }
}

impl<T> Clone for FeatureFlag<T> {
    fn clone(&self) -> Self {
        FeatureFlag {
            id: self.id.clone(),
            kind: self.kind,
            decoder: self.decoder.clone(),
        }
    }
}

impl<T> fmt::Debug for FeatureFlag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureFlag")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}
