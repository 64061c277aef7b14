//! Builds world objects from loosely-typed descriptions.

mod entity_id;
mod factory;
mod objects;
mod spec;
mod value;

use std::{any::Any, fmt::Debug};

use vector2d::Vector2D;

pub use entity_id::{EntityId, ParseEntityIdError};
pub use factory::{
    ConstructionError, Constructor, ConstructorArgs, ObjectFactory, Param, ParamKind,
    ResolutionError, SpawnExtension, Variant,
};
pub use objects::{BubbleGrass, DataPearl, PearlType, Placement, Spear, WaterNut};
pub use spec::ConstructionSpec;
pub use value::{convert, FieldError, FieldKind, FieldValue};

use crate::world::{Room, WorldCoordinate};

/// An object created by the factory.
pub trait SpawnedObject: Debug {
    fn id(&self) -> EntityId;

    /// The name of the type the object was built as.
    fn type_name(&self) -> &'static str;

    /// Where in the world the object lives.
    fn coordinate(&self) -> WorldCoordinate;

    /// Sets a field by name after construction.
    fn assign(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError>;

    /// Gives the object a physical presence at `position`.
    fn realize(&mut self, position: Vector2D<f32>);

    /// The physical position, once the object has been realized.
    fn position(&self) -> Option<Vector2D<f32>>;

    fn as_any(&self) -> &dyn Any;
}

/// The room an object is built for, as seen by constructors.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RoomRef {
    pub name: String,
    pub index: i32,
}

/// Everything the factory can supply to a constructor without reading a field.
pub struct SpawnContext<'r> {
    room: &'r mut dyn Room,
    coordinate: WorldCoordinate,
}

impl<'r> SpawnContext<'r> {
    /// Creates a context for objects placed at the origin of `room`.
    pub fn new(room: &'r mut dyn Room) -> SpawnContext<'r> {
        let coordinate = WorldCoordinate::room_origin(room.index());

        SpawnContext { room, coordinate }
    }

    pub fn at(self, coordinate: WorldCoordinate) -> SpawnContext<'r> {
        SpawnContext { coordinate, ..self }
    }

    pub fn room(&self) -> RoomRef {
        RoomRef {
            name: self.room.name().to_string(),
            index: self.room.index(),
        }
    }

    pub fn coordinate(&self) -> WorldCoordinate {
        self.coordinate
    }

    pub fn new_entity_id(&mut self) -> EntityId {
        self.room.new_entity_id()
    }
}
