//! The flags this crate knows about. The ids are the keys used in profile documents.

use std::{collections::HashMap, rc::Rc};

use serde_json::Value;
use strum::{Display, EnumString, EnumVariantNames};

use super::{
    decode::{self, DecodeError},
    DeclarationError, FeatureFlag, Registry, ScopeKind,
};
use crate::{
    sequence::CutsceneSpec,
    spawn::{ConstructionSpec, ObjectFactory},
    world::TilePosition,
};

/// How an actor can pick up an object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, EnumString, EnumVariantNames)]
pub enum Grabability {
    BigOneHand,
    CantGrab,
    Drag,
    OneHand,
    TwoHands,
}

fn grab_overrides(json: &Value) -> Result<HashMap<String, Grabability>, DecodeError> {
    let entries = json
        .as_object()
        .ok_or_else(|| DecodeError::wrong_type("an object of grab classes", json))?;

    entries
        .iter()
        .map(|(object, class)| Ok((object.clone(), decode::enum_ci(class)?)))
        .collect()
}

fn start_positions(json: &Value) -> Result<HashMap<String, TilePosition>, DecodeError> {
    let entries = json
        .as_object()
        .ok_or_else(|| DecodeError::wrong_type("an object of room positions", json))?;

    let mut positions = HashMap::new();
    let mut seen = HashMap::new();

    for (room, position) in entries {
        // Room names aren't case sensitive, so two spellings of one room is a mistake.
        if let Some(previous) = seen.insert(room.to_ascii_uppercase(), room) {
            return Err(DecodeError::Invalid(format!(
                "start position for '{room}' is given twice (also as '{previous}')"
            )));
        }

        let tile = decode::ints(position, 2, 2)?;

        positions.insert(
            room.clone(),
            TilePosition {
                x: tile[0],
                y: tile[1],
            },
        );
    }

    Ok(positions)
}

/// Every declared flag, grouped by the kind of scope it belongs to.
pub struct ExtFeatures {
    // Actor flags.
    pub has_tongue: FeatureFlag<bool>,
    pub grab_overrides: FeatureFlag<HashMap<String, Grabability>>,
    pub bite_lethality_multiplier: FeatureFlag<Vec<f32>>,
    pub pop_held_bubblefruit: FeatureFlag<bool>,
    pub only_tosses_spears: FeatureFlag<bool>,
    pub take_spears_from_wall: FeatureFlag<bool>,
    pub explosive_jump: FeatureFlag<Vec<i32>>,
    pub gill_rows: FeatureFlag<i32>,
    pub spear_specks: FeatureFlag<Vec<i32>>,
    pub arti_eyes: FeatureFlag<bool>,
    pub watcher_blue: FeatureFlag<f32>,
    pub saint_fluff: FeatureFlag<bool>,
    pub craft_explosives_cost: FeatureFlag<i32>,
    pub get_karma_from_scavs: FeatureFlag<bool>,
    pub can_dualwield: FeatureFlag<bool>,
    pub saint_eyes: FeatureFlag<bool>,
    pub can_slam: FeatureFlag<bool>,
    pub cant_swallow_objects: FeatureFlag<bool>,
    pub feeds_from_spears: FeatureFlag<bool>,

    // Session flags.
    pub max_cycle_limit: FeatureFlag<Vec<i32>>,
    pub can_pass_oe_gate: FeatureFlag<Vec<bool>>,
    pub max_slugpup_spawns: FeatureFlag<i32>,
    pub spawn_karma_flowers: FeatureFlag<bool>,
    pub enlightened: FeatureFlag<bool>,
    pub can_access_whitetokens: FeatureFlag<bool>,
    pub reveal_mark_overtime: FeatureFlag<i32>,
    pub start_position: FeatureFlag<HashMap<String, TilePosition>>,
    pub start_stomach_item: FeatureFlag<ConstructionSpec>,
    pub intro_cutscene: FeatureFlag<HashMap<String, CutsceneSpec>>,
    pub start_room: FeatureFlag<Vec<String>>,
}

impl ExtFeatures {
    /// Declares every flag in `registry`. Flags that build objects check their types against
    /// `factory` while decoding.
    pub fn declare(
        registry: &mut Registry,
        factory: Rc<ObjectFactory>,
    ) -> Result<ExtFeatures, DeclarationError> {
        use ScopeKind::{Actor, Session};

        let stomach_factory = factory.clone();
        let intro_factory = factory;

        Ok(ExtFeatures {
            has_tongue: registry.declare("has_tongue", Actor, decode::bool)?,
            grab_overrides: registry.declare("grab_overrides", Actor, grab_overrides)?,

            // The id's spelling is what existing profiles use.
            bite_lethality_multiplier: registry.declare(
                "bite_lethality_mutliplier",
                Actor,
                |json| decode::floats(json, 1, 2),
            )?,

            pop_held_bubblefruit: registry
                .declare("pop_held_bubblefruit", Actor, decode::bool)?,
            only_tosses_spears: registry.declare("only_tosses_spears", Actor, decode::bool)?,
            take_spears_from_wall: registry
                .declare("take_spears_from_wall", Actor, decode::bool)?,
            explosive_jump: registry.declare("explosive_jump", Actor, |json| {
                decode::ints(json, 1, 2)
            })?,
            gill_rows: registry.declare("gill_rows", Actor, decode::int)?,
            spear_specks: registry.declare("spear_specks", Actor, |json| {
                decode::ints(json, 2, 2)
            })?,
            arti_eyes: registry.declare("arti_eyes", Actor, decode::bool)?,
            watcher_blue: registry.declare("watcher_blue", Actor, decode::float)?,
            saint_fluff: registry.declare("saint_fluff", Actor, decode::bool)?,
            craft_explosives_cost: registry
                .declare("craft_explosives_cost", Actor, decode::int)?,
            get_karma_from_scavs: registry
                .declare("get_karma_from_scavs", Actor, decode::bool)?,
            can_dualwield: registry.declare("can_dualwield", Actor, decode::bool)?,
            saint_eyes: registry.declare("saint_eyes", Actor, decode::bool)?,
            can_slam: registry.declare("can_slam", Actor, decode::bool)?,
            cant_swallow_objects: registry
                .declare("cant_swallow_objects", Actor, decode::bool)?,
            feeds_from_spears: registry.declare("feeds_from_spears", Actor, decode::bool)?,

            max_cycle_limit: registry.declare("max_cycle_limit", Session, |json| {
                decode::ints(json, 1, 2)
            })?,
            can_pass_oe_gate: registry.declare("can_pass_OE_gate", Session, |json| {
                decode::bools(json, 1, 2)
            })?,
            max_slugpup_spawns: registry
                .declare("max_slugpup_spawns", Session, decode::int)?,
            spawn_karma_flowers: registry
                .declare("spawn_karma_flowers", Session, decode::bool)?,
            enlightened: registry.declare("enlightened", Session, decode::bool)?,
            can_access_whitetokens: registry
                .declare("can_access_whitetokens", Session, decode::bool)?,
            reveal_mark_overtime: registry
                .declare("reveal_mark_overtime", Session, decode::int)?,
            start_position: registry
                .declare("start_position", Session, start_positions)?,
            start_stomach_item: registry.declare("start_stomach_item", Session, move |json| {
                ConstructionSpec::decode(json, &stomach_factory)
            })?,
            intro_cutscene: registry.declare("intro_cutscene", Session, move |json| {
                CutsceneSpec::decode_rooms(json, &intro_factory)
            })?,
            start_room: registry.declare("start_room", Session, decode::strings)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{MemorySource, ScopeHandle, ScopeResolver};

    fn catalog(document: &str) -> (Registry, ExtFeatures) {
        let source = MemorySource::new().with("Hunter", document);
        let mut registry = Registry::new(Rc::new(ScopeResolver::new(source)));
        let features =
            ExtFeatures::declare(&mut registry, Rc::new(ObjectFactory::with_builtins())).unwrap();

        (registry, features)
    }

    #[test]
    fn declaring_twice_fails() {
        let (mut registry, _) = catalog("{}");

        assert!(ExtFeatures::declare(&mut registry, Rc::new(ObjectFactory::new())).is_err());
    }

    #[test]
    fn actor_flags_resolve() {
        let (registry, features) = catalog(
            r#"{ "features": {
                "grab_overrides": { "AbstractSpear": "twohands", "Rock": "CantGrab" },
                "bite_lethality_mutliplier": 0.5,
                "spear_specks": [2, 3],
                "watcher_blue": -1.0
            } }"#,
        );
        let hunter = ScopeHandle::actor("Hunter");

        let overrides = registry.resolve(&features.grab_overrides, &hunter).unwrap();
        assert_eq!(overrides["AbstractSpear"], Grabability::TwoHands);
        assert_eq!(overrides["Rock"], Grabability::CantGrab);

        assert_eq!(
            registry.resolve(&features.bite_lethality_multiplier, &hunter),
            Some(vec![0.5])
        );
        assert_eq!(
            registry.resolve(&features.spear_specks, &hunter),
            Some(vec![2, 3])
        );
        assert!(!registry.is_enabled(&features.watcher_blue, &hunter));
    }

    #[test]
    fn invalid_grab_class_is_ignored() {
        let (registry, features) =
            catalog(r#"{ "features": { "grab_overrides": { "Rock": "Juggle" } } }"#);

        assert_eq!(
            registry.resolve(&features.grab_overrides, &ScopeHandle::actor("Hunter")),
            None
        );
    }

    #[test]
    fn session_flags_resolve() {
        let (registry, features) = catalog(
            r#"{ "features": {
                "can_pass_OE_gate": true,
                "start_position": { "SU_C04": [12, 30] },
                "start_stomach_item": { "type": "DataPearl", "dataPearlType": "CC" },
                "intro_cutscene": { "SU_C04": { "inputs": [{ "x": 1, "time": 4 }], "food": 2 } },
                "start_room": "SU_C04"
            } }"#,
        );
        let session = ScopeHandle::session("Hunter");

        assert_eq!(
            registry.resolve(&features.can_pass_oe_gate, &session),
            Some(vec![true])
        );
        assert_eq!(
            registry.resolve(&features.start_position, &session).unwrap()["SU_C04"],
            TilePosition { x: 12, y: 30 }
        );
        assert_eq!(
            registry
                .resolve(&features.start_stomach_item, &session)
                .unwrap()
                .type_id,
            "DataPearl"
        );

        let intro = registry.resolve(&features.intro_cutscene, &session).unwrap();
        assert_eq!(intro["SU_C04"].frames[0].hold_ticks, 4);
        assert_eq!(intro["SU_C04"].food, Some(2.0));

        assert_eq!(
            registry.resolve(&features.start_room, &session),
            Some(vec!["SU_C04".to_string()])
        );
    }

    #[test]
    fn repeated_start_rooms_are_rejected() {
        let (registry, features) = catalog(
            r#"{ "features": { "start_position": { "SU_C04": [1, 2], "su_c04": [3, 4] } } }"#,
        );

        assert_eq!(
            registry.resolve(&features.start_position, &ScopeHandle::session("Hunter")),
            None
        );
    }

    #[test]
    fn unknown_stomach_item_is_ignored() {
        let (registry, features) =
            catalog(r#"{ "features": { "start_stomach_item": { "type": "NotARealType" } } }"#);

        assert_eq!(
            registry.resolve(&features.start_stomach_item, &ScopeHandle::session("Hunter")),
            None
        );
    }
}
