//! The services this crate needs from the host game. The host implements these traits for its own
//! rooms and creatures; nothing in here knows how the host stores them.

use vector2d::Vector2D;

use crate::{
    scope::Scope,
    sequence::InputPackage,
    spawn::{EntityId, SpawnedObject},
};

/// An abstract position in the world: a room index plus a tile and node inside it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct WorldCoordinate {
    pub room: i32,
    pub x: i32,
    pub y: i32,
    pub abstract_node: i32,
}

impl WorldCoordinate {
    pub fn new(room: i32, x: i32, y: i32, abstract_node: i32) -> WorldCoordinate {
        WorldCoordinate {
            room,
            x,
            y,
            abstract_node,
        }
    }

    /// The coordinate used for objects that haven't been given a position yet.
    pub fn room_origin(room: i32) -> WorldCoordinate {
        WorldCoordinate::new(room, 0, 0, -1)
    }
}

/// A position measured in room tiles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
}

/// A creature that can be driven by a controller.
pub trait Actor {
    /// The actor's entity ID.
    fn id(&self) -> EntityId;

    /// The actor's current position in room space.
    fn position(&self) -> Vector2D<f32>;

    /// Returns the index of a hand that isn't holding anything.
    fn free_hand(&self) -> Option<usize>;

    /// Makes the actor hold the entity `object` in `hand`.
    fn grab(&mut self, hand: usize, object: EntityId);

    /// Replaces the actor's default controller so that input only comes from `apply_input`.
    fn take_control(&mut self);

    /// Gives input control back to the actor's default controller.
    fn release_control(&mut self);

    /// Feeds one tick of input to the actor.
    fn apply_input(&mut self, input: InputPackage);

    /// Sets the contents of the actor's stomach.
    fn set_food(&mut self, pips: i32, quarter_pips: i32);
}

/// A loaded room.
pub trait Room {
    /// The room's name, e.g. `SU_C04`.
    fn name(&self) -> &str;

    /// The room's index in its world.
    fn index(&self) -> i32;

    /// Allocates a fresh entity ID.
    fn new_entity_id(&mut self) -> EntityId;

    /// Returns the first actor in the room that a player could control.
    fn first_controllable_actor(&self) -> Option<EntityId>;

    /// Looks up an actor by ID. Returns `None` once the actor has left the world.
    fn actor_mut(&mut self, id: EntityId) -> Option<&mut dyn Actor>;

    /// Hands `object` over to the room.
    fn add_entity(&mut self, object: Box<dyn SpawnedObject>);
}

/// A running game session. Session flags are resolved against it.
pub trait Session: Scope {
    /// The number of cycles played on this save. Zero on a fresh save.
    fn cycle(&self) -> i32;

    /// The name of the room the save starts in.
    fn den(&self) -> &str;
}
