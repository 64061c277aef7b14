use std::{collections::HashSet, rc::Rc};

use serde_json::Value;
use thiserror::Error;

use super::{
    decode::{excerpt, DecodeError},
    FeatureFlag, Flagged, ScopeKind,
};
use crate::scope::{Scope, ScopeResolver};

/// A flag was declared twice. This is a bug in the code declaring the flags.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("flag '{id}' is already declared for {kind} scopes")]
pub struct DeclarationError {
    pub id: String,
    pub kind: ScopeKind,
}

/// Declares typed flags and resolves them against scopes.
pub struct Registry {
    resolver: Rc<ScopeResolver>,
    declared: HashSet<(ScopeKind, String)>,
}

impl Registry {
    pub fn new(resolver: Rc<ScopeResolver>) -> Registry {
        Registry {
            resolver,
            declared: HashSet::new(),
        }
    }

    /// Declares a flag read from `id` on scopes of `kind`.
    pub fn declare<T>(
        &mut self,
        id: &str,
        kind: ScopeKind,
        decoder: impl Fn(&Value) -> Result<T, DecodeError> + 'static,
    ) -> Result<FeatureFlag<T>, DeclarationError> {
        if !self.declared.insert((kind, id.to_string())) {
            return Err(DeclarationError {
                id: id.to_string(),
                kind,
            });
        }

        Ok(FeatureFlag::new(id, kind, Rc::new(decoder)))
    }

    /// Returns `true` if `id` has been declared for `kind`.
    pub fn is_declared(&self, id: &str, kind: ScopeKind) -> bool {
        self.declared.contains(&(kind, id.to_string()))
    }

    /// The resolver this registry reads profiles through.
    pub fn resolver(&self) -> &Rc<ScopeResolver> {
        &self.resolver
    }

    /// Looks up the value of `flag` for `scope`.
    ///
    /// Returns `None` when the scope has no profile, the profile doesn't mention the flag, the
    /// scope is the wrong kind, or the stored value can't be decoded. Decode failures are logged
    /// once per profile.
    pub fn resolve<T: Clone + 'static>(
        &self,
        flag: &FeatureFlag<T>,
        scope: &dyn Scope,
    ) -> Option<T> {
        if scope.kind() != flag.kind() {
            log::debug!(
                "Flag '{}' is a {} flag but was resolved against a {} scope.",
                flag.id(),
                flag.kind(),
                scope.kind()
            );

            return None;
        }

        let profile = self.resolver.get_profile(scope);

        profile.decoded(flag.kind(), flag.id(), |raw| match flag.decode(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!(
                    "Ignoring flag '{}' in profile '{}': {} (raw value: {}).",
                    flag.id(),
                    profile.identity().unwrap_or("<none>"),
                    err,
                    excerpt(raw),
                );

                None
            }
        })
    }

    /// Returns `true` if the flag resolves to a value that turns the feature on.
    pub fn is_enabled<T: Flagged + Clone + 'static>(
        &self,
        flag: &FeatureFlag<T>,
        scope: &dyn Scope,
    ) -> bool {
        self.resolve(flag, scope)
            .map_or(false, |value| value.is_set())
    }

    /// Returns `true` only if the flag resolves to a value that explicitly turns the feature off.
    /// Absent flags are neither enabled nor disabled.
    pub fn is_disabled<T: Flagged + Clone + 'static>(
        &self,
        flag: &FeatureFlag<T>,
        scope: &dyn Scope,
    ) -> bool {
        self.resolve(flag, scope)
            .map_or(false, |value| !value.is_set())
    }
}
