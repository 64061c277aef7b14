//! Decides whether a resolved flag value counts as "set".
//!
//! Booleans are set when `true`. Numbers use a negative sentinel: any negative value means
//! "explicitly disabled" and behaves exactly like an absent flag at call sites that only ask
//! whether the feature is on. Lists are set when any element is set.

use std::collections::HashMap;

pub trait Flagged {
    /// Returns `true` if this value turns the feature on.
    fn is_set(&self) -> bool;
}

impl Flagged for bool {
    fn is_set(&self) -> bool {
        *self
    }
}

impl Flagged for i32 {
    fn is_set(&self) -> bool {
        *self >= 0
    }
}

impl Flagged for f32 {
    fn is_set(&self) -> bool {
        *self >= 0.0
    }
}

impl<T: Flagged> Flagged for Vec<T> {
    fn is_set(&self) -> bool {
        self.iter().any(Flagged::is_set)
    }
}

impl Flagged for String {
    fn is_set(&self) -> bool {
        true
    }
}

// Structured values are on whenever they resolve at all.
impl<K, V> Flagged for HashMap<K, V> {
    fn is_set(&self) -> bool {
        true
    }
}
