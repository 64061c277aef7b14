//! Maps live scopes (sessions, creatures) to the profiles that configure them.

mod profile;
mod resolver;
mod source;

pub use profile::{Profile, ProfileError};
pub use resolver::ScopeResolver;
pub use source::{DirectorySource, MemorySource, ProfileSource};

use crate::features::ScopeKind;

/// Something that flags can be resolved against.
pub trait Scope {
    /// The kind of scope this is.
    fn kind(&self) -> ScopeKind;

    /// The stable identity of this scope's profile, usually the character name. `None` means the
    /// scope has no profile at all, like an unmodded character.
    fn profile_id(&self) -> Option<&str>;
}

/// A plain scope value, for hosts that don't want to implement `Scope` on their own types.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ScopeHandle {
    kind: ScopeKind,
    profile: Option<String>,
}

impl ScopeHandle {
    pub fn new(kind: ScopeKind, profile: Option<String>) -> ScopeHandle {
        ScopeHandle { kind, profile }
    }

    pub fn global(profile: impl Into<String>) -> ScopeHandle {
        ScopeHandle::new(ScopeKind::Global, Some(profile.into()))
    }

    pub fn session(character: impl Into<String>) -> ScopeHandle {
        ScopeHandle::new(ScopeKind::Session, Some(character.into()))
    }

    pub fn actor(character: impl Into<String>) -> ScopeHandle {
        ScopeHandle::new(ScopeKind::Actor, Some(character.into()))
    }

    /// A scope of `kind` that has no profile.
    pub fn vanilla(kind: ScopeKind) -> ScopeHandle {
        ScopeHandle::new(kind, None)
    }
}

impl Scope for ScopeHandle {
    fn kind(&self) -> ScopeKind {
        self.kind
    }

    fn profile_id(&self) -> Option<&str> {
        self.profile.as_deref()
    }
}
