use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    rc::Rc,
};

use super::{Profile, ProfileSource, Scope};

/// Loads and caches profiles, keyed by scope identity.
///
/// Every identity is parsed at most once. A parse failure is logged and cached as an empty
/// profile, so a broken file costs one parse and one log line for the life of the cache.
pub struct ScopeResolver {
    source: Box<dyn ProfileSource>,
    profiles: RefCell<HashMap<String, Rc<Profile>>>,
    failed: RefCell<HashSet<String>>,
    anonymous: Rc<Profile>,
    parse_failures: Cell<usize>,
}

impl ScopeResolver {
    pub fn new(source: impl ProfileSource + 'static) -> ScopeResolver {
        ScopeResolver {
            source: Box::new(source),
            profiles: RefCell::new(HashMap::new()),
            failed: RefCell::new(HashSet::new()),
            anonymous: Rc::new(Profile::empty(None)),
            parse_failures: Cell::new(0),
        }
    }

    /// Returns the profile for `scope`. Scopes without an identity share one empty profile.
    pub fn get_profile(&self, scope: &dyn Scope) -> Rc<Profile> {
        match scope.profile_id() {
            Some(identity) => self.profile_for(identity),
            None => self.anonymous.clone(),
        }
    }

    /// Returns the profile for `identity`, loading it on first use.
    pub fn profile_for(&self, identity: &str) -> Rc<Profile> {
        if let Some(profile) = self.profiles.borrow().get(identity) {
            return profile.clone();
        }

        let profile = Rc::new(self.load(identity));

        self.profiles
            .borrow_mut()
            .insert(identity.to_string(), profile.clone());

        profile
    }

    fn load(&self, identity: &str) -> Profile {
        let text = match self.source.load(identity) {
            Ok(Some(text)) => text,

            Ok(None) => {
                log::debug!("No profile for '{identity}'.");
                return Profile::empty(Some(identity.to_string()));
            }

            Err(err) => {
                self.record_failure(identity);
                log::error!("Unable to read profile '{identity}': {err:?}");
                return Profile::empty(Some(identity.to_string()));
            }
        };

        match Profile::parse(identity, &text) {
            Ok(profile) => {
                log::info!("Loaded profile '{identity}'.");
                profile
            }

            Err(err) => {
                self.record_failure(identity);
                log::error!(
                    "Unable to parse profile '{identity}': {err}. It will be treated as empty."
                );
                Profile::empty(Some(identity.to_string()))
            }
        }
    }

    fn record_failure(&self, identity: &str) {
        self.parse_failures.set(self.parse_failures.get() + 1);
        self.failed.borrow_mut().insert(identity.to_string());
    }

    /// Drops the cached profile for `identity` so that it is read again next time. Profiles that
    /// failed to load stay cached, so a broken file is only ever read once.
    pub fn forget(&self, identity: &str) -> bool {
        if self.failed.borrow().contains(identity) {
            log::debug!("Keeping the failed profile '{identity}' cached.");
            return false;
        }

        self.profiles.borrow_mut().remove(identity).is_some()
    }

    /// The number of profiles that failed to load.
    pub fn parse_failures(&self) -> usize {
        self.parse_failures.get()
    }

    /// The number of identities currently cached.
    pub fn cached(&self) -> usize {
        self.profiles.borrow().len()
    }
}
