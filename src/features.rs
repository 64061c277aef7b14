//! Typed feature flags, declared once and read from profiles.

mod catalog;
pub mod decode;
mod flag;
mod registry;
mod truthy;

pub use catalog::{ExtFeatures, Grabability};
pub use decode::DecodeError;
pub use flag::{Decoder, FeatureFlag, ScopeKind};
pub use registry::{DeclarationError, Registry};
pub use truthy::Flagged;
