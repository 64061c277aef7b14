//! Extended character features: typed feature flags read from character profiles, objects built
//! from loosely-typed descriptions, and scripted intro sequences.
//!
//! The host creates one [`Plugin`] at startup and calls into it when rooms load and every tick.

pub mod config;
pub mod features;
mod logging;
pub mod scope;
pub mod sequence;
pub mod spawn;
pub mod world;

use std::{collections::HashSet, path::Path, rc::Rc};

use eyre::{Context, Result};

use config::Options;
use features::{ExtFeatures, Registry, ScopeKind};
use scope::{DirectorySource, ProfileSource, Scope, ScopeHandle, ScopeResolver};
use sequence::{SequenceRunner, Sequencer};
use spawn::{ObjectFactory, SpawnContext, SpawnExtension, SpawnedObject};
use world::{Room, Session};

/// Owns every service the crate provides. Nothing is set up until a `Plugin` is created.
pub struct Plugin {
    options: Options,
    resolver: Rc<ScopeResolver>,
    factory: Rc<ObjectFactory>,
    registry: Registry,
    features: ExtFeatures,
    runner: SequenceRunner,

    /// `(session profile, room)` pairs whose intro has already been started.
    played_intros: HashSet<(String, String)>,
}

impl Plugin {
    /// Loads options from `options_path`, starts logging and reads profiles from the configured
    /// directory.
    pub fn load(options_path: impl AsRef<Path>) -> Result<Plugin> {
        let options_path = options_path.as_ref();
        let (options, outcome) = Options::read(options_path);

        // Logging first so that everything after this can log.
        logging::init(&options).wrap_err("starting logger")?;
        outcome.log(options_path);

        log::info!("ext-features {} starting", env!("CARGO_PKG_VERSION"));
        log::info!("Profiles are read from {}", options.profile_dir.display());

        let source = DirectorySource::new(&options.profile_dir);
        Plugin::new(options, source)
    }

    /// Creates a plugin that reads profiles from `source`.
    pub fn new(options: Options, source: impl ProfileSource + 'static) -> Result<Plugin> {
        let resolver = Rc::new(ScopeResolver::new(source));
        let factory = Rc::new(ObjectFactory::with_builtins());

        let mut registry = Registry::new(resolver.clone());
        let features = ExtFeatures::declare(&mut registry, factory.clone())
            .wrap_err("declaring feature flags")?;

        Ok(Plugin {
            options,
            resolver,
            factory,
            registry,
            features,
            runner: SequenceRunner::new(),
            played_intros: HashSet::new(),
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn features(&self) -> &ExtFeatures {
        &self.features
    }

    pub fn factory(&self) -> &ObjectFactory {
        &self.factory
    }

    /// The scope that global flags are resolved against.
    pub fn global_scope(&self) -> ScopeHandle {
        ScopeHandle::global(self.options.global_profile.as_str())
    }

    /// Installs the hook that builds object types the factory doesn't know.
    pub fn set_spawn_extension(&self, extension: Box<dyn SpawnExtension>) {
        self.factory.set_extension(extension);
    }

    /// Returns `true` if `session` is on its first cycle and `room` is one of its start rooms.
    fn is_start<S: Session>(&self, session: &S, room: &str) -> bool {
        if session.cycle() != 0 {
            return false;
        }

        self.registry
            .resolve(&self.features.start_room, session)
            .map_or(false, |rooms| rooms.iter().any(|start| start == room))
    }

    /// Starts the intro for `room` if the session defines one. Each intro is started at most once
    /// per session. Returns `true` if an intro was started.
    pub fn room_loaded<S: Session>(&mut self, session: &S, room: &mut dyn Room) -> bool {
        if !self.is_start(session, room.name()) {
            return false;
        }

        let key = (
            session.profile_id().unwrap_or_default().to_string(),
            room.name().to_string(),
        );

        if self.played_intros.contains(&key) {
            log::debug!("The intro in {} has already been played.", room.name());
            return false;
        }

        let intros = match self
            .registry
            .resolve(&self.features.intro_cutscene, session)
        {
            Some(intros) => intros,
            None => return false,
        };

        let cutscene = match intros.get(room.name()) {
            Some(cutscene) => cutscene,
            None => return false,
        };

        log::info!("Starting the intro in {}.", room.name());

        self.runner
            .add(Sequencer::start(room, cutscene, &self.factory));
        self.played_intros.insert(key);

        true
    }

    /// Advances the intros running in `room`.
    pub fn tick(&mut self, room: &mut dyn Room) {
        self.runner.update(room);
    }

    /// Stops the intros running in `room`.
    pub fn room_unloaded(&mut self, room: &mut dyn Room) {
        self.runner.stop_room(room);
    }

    /// Builds the object a new save starts with in the actor's stomach, if the session asks for
    /// one.
    pub fn spawn_stomach_item<S: Session>(
        &self,
        session: &S,
        ctx: &mut SpawnContext,
    ) -> Option<Box<dyn SpawnedObject>> {
        if !self.is_start(session, session.den()) {
            return None;
        }

        let spec = self
            .registry
            .resolve(&self.features.start_stomach_item, session)?;

        match self.factory.construct_spec(&spec, ctx) {
            Ok(object) => Some(object),
            Err(err) => {
                log::error!("Unable to build the start stomach item: {err}");
                None
            }
        }
    }

    /// Called when the host destroys a scope. Actors come and go within a session and share its
    /// profile, so only the end of a session forgets the profile and the intros it has played.
    pub fn scope_destroyed(&mut self, scope: &dyn Scope) {
        if scope.kind() != ScopeKind::Session {
            return;
        }

        let identity = scope.profile_id().unwrap_or_default();

        self.played_intros.retain(|(session, _)| session != identity);

        if !identity.is_empty() {
            self.resolver.forget(identity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        scope::MemorySource,
        spawn::DataPearl,
        world::testing::{TestRoom, TestSession},
    };

    const HUNTER: &str = r#"{ "features": {
        "start_room": ["SU_C04"],
        "start_stomach_item": { "DataPearl": { "dataPearlType": "CC" } },
        "intro_cutscene": {
            "SU_C04": {
                "inputs": [{ "x": 1, "time": 2 }, { "jump": true }],
                "player_grasps": { "Spear": {} }
            },
            "SB_S01": { "inputs": [{ "x": -1 }] }
        }
    } }"#;

    fn plugin() -> Plugin {
        Plugin::new(
            Options::default(),
            MemorySource::new().with("Hunter", HUNTER),
        )
        .unwrap()
    }

    #[test]
    fn intro_plays_in_start_room() {
        let mut plugin = plugin();
        let session = TestSession::new("Hunter", "SU_C04");
        let mut room = TestRoom::new("SU_C04").with_actor();

        assert!(plugin.room_loaded(&session, &mut room));

        for _ in 0..3 {
            plugin.tick(&mut room);
        }

        assert_eq!(room.actor().inputs.len(), 3);
        assert!(room.actor().inputs[2].jmp);
        assert_eq!(room.entities.len(), 1);
        assert!(!room.actor().controlled);
    }

    #[test]
    fn intro_only_plays_on_a_fresh_save() {
        let mut plugin = plugin();
        let mut session = TestSession::new("Hunter", "SU_C04");
        session.cycle = 1;

        assert!(!plugin.room_loaded(&session, &mut TestRoom::new("SU_C04").with_actor()));
    }

    #[test]
    fn intro_needs_a_start_room() {
        let mut plugin = plugin();
        let session = TestSession::new("Hunter", "SU_C04");

        // Has a cutscene but isn't a start room.
        assert!(!plugin.room_loaded(&session, &mut TestRoom::new("SB_S01").with_actor()));

        let survivor = TestSession::new("Survivor", "SU_C04");
        assert!(!plugin.room_loaded(&survivor, &mut TestRoom::new("SU_C04").with_actor()));
    }

    #[test]
    fn stomach_item_is_built_for_the_den() {
        let plugin = plugin();
        let mut room = TestRoom::new("SU_C04");

        let session = TestSession::new("Hunter", "SU_C04");
        let item = plugin
            .spawn_stomach_item(&session, &mut SpawnContext::new(&mut room))
            .unwrap();
        assert!(item.as_any().downcast_ref::<DataPearl>().is_some());

        let elsewhere = TestSession::new("Hunter", "SB_S01");
        assert!(plugin
            .spawn_stomach_item(&elsewhere, &mut SpawnContext::new(&mut room))
            .is_none());
    }

    #[test]
    fn intros_play_once_per_session() {
        let mut plugin = plugin();
        let session = TestSession::new("Hunter", "SU_C04");
        let mut room = TestRoom::new("SU_C04").with_actor();

        assert!(plugin.room_loaded(&session, &mut room));

        for _ in 0..4 {
            plugin.tick(&mut room);
        }

        plugin.room_unloaded(&mut room);
        assert!(!plugin.room_loaded(&session, &mut room));

        for _ in 0..4 {
            plugin.tick(&mut room);
        }

        assert_eq!(room.actor().inputs.len(), 3);

        // A new session starts from scratch.
        plugin.scope_destroyed(&ScopeHandle::session("Hunter"));
        assert!(plugin.room_loaded(&session, &mut room));
    }

    #[test]
    fn only_sessions_forget_profiles() {
        let mut plugin = plugin();
        let session = TestSession::new("Hunter", "SU_C04");

        assert!(plugin
            .registry()
            .resolve(&plugin.features().start_room, &session)
            .is_some());
        assert_eq!(plugin.resolver.cached(), 1);

        plugin.scope_destroyed(&ScopeHandle::actor("Hunter"));
        assert_eq!(plugin.resolver.cached(), 1);

        plugin.scope_destroyed(&session);
        assert_eq!(plugin.resolver.cached(), 0);
    }

    #[test]
    fn broken_profiles_are_read_once() {
        let mut plugin = Plugin::new(
            Options::default(),
            MemorySource::new().with("Broken", "{ \"features\": "),
        )
        .unwrap();
        let session = TestSession::new("Broken", "SU_C04");

        assert_eq!(
            plugin
                .registry()
                .resolve(&plugin.features().start_room, &session),
            None
        );

        plugin.scope_destroyed(&ScopeHandle::actor("Broken"));
        plugin.scope_destroyed(&session);

        assert_eq!(
            plugin
                .registry()
                .resolve(&plugin.features().start_room, &session),
            None
        );
        assert_eq!(plugin.resolver.parse_failures(), 1);
    }
}
