use std::{cell::RefCell, collections::HashMap};

use case_insensitive_hashmap::CaseInsensitiveHashMap;
use itertools::Itertools;
use serde_json::{Map, Value};
use thiserror::Error;

use super::{
    convert, objects, ConstructionSpec, EntityId, FieldError, FieldKind, FieldValue, RoomRef,
    SpawnContext, SpawnedObject,
};
use crate::world::WorldCoordinate;

/// Type names often carry this prefix, and descriptions are allowed to leave it out.
const ABSTRACT_PREFIX: &str = "Abstract";

pub type BuildFn = fn(&ConstructorArgs) -> Result<Box<dyn SpawnedObject>, FieldError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("no object type is called '{0}'")]
    Unknown(String),

    #[error("'{name}' could mean any of {}", .candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(
        "no constructor of {type_name} could be used (unmatched fields: [{}]): {}",
        .unmatched.join(", "),
        .attempts.join("; ")
    )]
    NoConstructor {
        type_name: &'static str,
        attempts: Vec<String>,
        unmatched: Vec<String>,
    },

    #[error("unable to set {type_name}.{field}: {source}")]
    Field {
        type_name: &'static str,
        field: String,
        source: FieldError,
    },

    #[error("{0}")]
    Extension(String),
}

/// Something a constructor parameter can be filled from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParamKind {
    /// The room the object is built for.
    Room,

    /// The coordinate from the spawn context.
    Coordinate,

    /// The object's entity ID.
    Identity,

    /// A value read from the description's fields.
    Value(FieldKind),
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: Option<FieldValue>,
}

/// One way of building a variant.
#[derive(Clone)]
pub struct Constructor {
    public: bool,
    params: Vec<Param>,
    build: BuildFn,
}

impl Constructor {
    pub fn public(build: BuildFn) -> Constructor {
        Constructor {
            public: true,
            params: vec![],
            build,
        }
    }

    pub fn private(build: BuildFn) -> Constructor {
        Constructor {
            public: false,
            ..Constructor::public(build)
        }
    }

    fn with(mut self, name: &'static str, kind: ParamKind, default: Option<FieldValue>) -> Self {
        self.params.push(Param {
            name,
            kind,
            default,
        });

        self
    }

    /// Adds the room, coordinate and identity parameters that every world object takes.
    pub fn placed(self) -> Self {
        self.with("room", ParamKind::Room, None)
            .with("pos", ParamKind::Coordinate, None)
            .with("ID", ParamKind::Identity, None)
    }

    pub fn param(self, name: &'static str, kind: FieldKind) -> Self {
        self.with(name, ParamKind::Value(kind), None)
    }

    pub fn param_or(self, name: &'static str, kind: FieldKind, default: FieldValue) -> Self {
        self.with(name, ParamKind::Value(kind), Some(default))
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    fn signature(&self) -> String {
        format!(
            "{}({})",
            if self.public { "" } else { "private " },
            self.params.iter().map(|param| param.name).join(", ")
        )
    }
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.signature())
    }
}

/// A constructible object type.
#[derive(Clone, Debug)]
pub struct Variant {
    name: &'static str,
    qualified: String,
    constructors: Vec<Constructor>,
    fields: Vec<(&'static str, FieldKind)>,
}

impl Variant {
    pub fn new(name: &'static str) -> Variant {
        Variant {
            name,
            qualified: name.to_string(),
            constructors: vec![],
            fields: vec![],
        }
    }

    pub fn qualified(mut self, qualified: impl Into<String>) -> Self {
        self.qualified = qualified.into();
        self
    }

    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Declares fields that can be set after construction.
    pub fn fields(mut self, fields: &[(&'static str, FieldKind)]) -> Self {
        self.fields.extend_from_slice(fields);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified
    }

    /// Constructors in the order they are tried.
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    fn field(&self, name: &str) -> Option<(&'static str, FieldKind)> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(field, _)| field.eq_ignore_ascii_case(name))
            })
            .copied()
    }
}

/// The values a constructor is called with.
#[derive(Debug)]
pub struct ConstructorArgs {
    room: RoomRef,
    coordinate: WorldCoordinate,
    id: EntityId,
    values: HashMap<&'static str, FieldValue>,
}

impl ConstructorArgs {
    pub fn room(&self) -> &RoomRef {
        &self.room
    }

    pub fn coordinate(&self) -> WorldCoordinate {
        self.coordinate
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn value(&self, name: &str) -> Result<&FieldValue, FieldError> {
        self.values
            .get(name)
            .ok_or_else(|| FieldError::Missing(name.to_string()))
    }

    pub fn bool(&self, name: &str) -> Result<bool, FieldError> {
        self.value(name)?.expect_bool(name)
    }

    pub fn int(&self, name: &str) -> Result<i32, FieldError> {
        self.value(name)?.expect_int(name)
    }

    pub fn float(&self, name: &str) -> Result<f32, FieldError> {
        self.value(name)?.expect_float(name)
    }

    pub fn enum_name(&self, name: &str) -> Result<&'static str, FieldError> {
        self.value(name)?.expect_enum(name)
    }
}

/// Builds objects for type names the factory doesn't know. Only one extension can be installed at
/// a time, and it is asked before the factory's own types.
pub trait SpawnExtension {
    /// Returns `true` if this extension builds objects called `type_id`.
    fn handles(&self, type_id: &str) -> bool;

    fn construct(
        &self,
        type_id: &str,
        fields: &Map<String, Value>,
        ctx: &mut SpawnContext,
    ) -> Result<Box<dyn SpawnedObject>, ConstructionError>;
}

/// Builds objects from a type name and a map of named fields.
pub struct ObjectFactory {
    variants: Vec<Variant>,
    by_name: CaseInsensitiveHashMap<Vec<usize>>,
    by_qualified: CaseInsensitiveHashMap<Vec<usize>>,
    by_short_name: CaseInsensitiveHashMap<Vec<usize>>,
    extension: RefCell<Option<Box<dyn SpawnExtension>>>,
}

impl ObjectFactory {
    /// Creates a factory that knows no types.
    pub fn new() -> ObjectFactory {
        ObjectFactory {
            variants: vec![],
            by_name: CaseInsensitiveHashMap::new(),
            by_qualified: CaseInsensitiveHashMap::new(),
            by_short_name: CaseInsensitiveHashMap::new(),
            extension: RefCell::new(None),
        }
    }

    /// Creates a factory that knows the built-in object types.
    pub fn with_builtins() -> ObjectFactory {
        let mut factory = ObjectFactory::new();

        for variant in objects::builtins() {
            factory.register(variant);
        }

        factory
    }

    pub fn register(&mut self, variant: Variant) {
        let index = self.variants.len();

        // Public constructors first, then the ones needing the fewest values.
        let constructors = variant
            .constructors
            .into_iter()
            .sorted_by_key(|constructor| (!constructor.public, constructor.params.len()))
            .collect();

        let variant = Variant {
            constructors,
            ..variant
        };

        self.by_name
            .entry(variant.name.to_string())
            .or_insert_with(Vec::new)
            .push(index);

        self.by_qualified
            .entry(variant.qualified.clone())
            .or_insert_with(Vec::new)
            .push(index);

        if let Some(short_name) = variant.name.strip_prefix(ABSTRACT_PREFIX) {
            if !short_name.is_empty() {
                self.by_short_name
                    .entry(short_name.to_string())
                    .or_insert_with(Vec::new)
                    .push(index);
            }
        }

        log::trace!("Registered object type {}.", variant.qualified);
        self.variants.push(variant);
    }

    /// Installs the extension, returning the one it replaces.
    pub fn set_extension(
        &self,
        extension: Box<dyn SpawnExtension>,
    ) -> Option<Box<dyn SpawnExtension>> {
        let previous = self.extension.borrow_mut().replace(extension);

        if previous.is_some() {
            log::warn!("Replacing the installed spawn extension.");
        }

        previous
    }

    fn extension_handles(&self, type_id: &str) -> bool {
        self.extension
            .borrow()
            .as_ref()
            .map_or(false, |extension| extension.handles(type_id))
    }

    /// Finds the type `type_id` refers to: by exact name, then by qualified name, then by name
    /// without the `Abstract` prefix. Names are compared ignoring case.
    pub fn resolve(&self, type_id: &str) -> Result<&Variant, ResolutionError> {
        let lookups = [&self.by_name, &self.by_qualified, &self.by_short_name];

        for matches in lookups.iter().filter_map(|lookup| lookup.get(type_id)) {
            match matches.as_slice() {
                [] => continue,
                [only] => return Ok(&self.variants[*only]),

                many => {
                    return Err(ResolutionError::Ambiguous {
                        name: type_id.to_string(),
                        candidates: many
                            .iter()
                            .map(|index| self.variants[*index].qualified.clone())
                            .collect(),
                    })
                }
            }
        }

        Err(ResolutionError::Unknown(type_id.to_string()))
    }

    /// Checks that `type_id` names something this factory can build.
    pub fn check(&self, type_id: &str) -> Result<(), ResolutionError> {
        if self.extension_handles(type_id) {
            return Ok(());
        }

        self.resolve(type_id).map(|_| ())
    }

    pub fn construct_spec(
        &self,
        spec: &ConstructionSpec,
        ctx: &mut SpawnContext,
    ) -> Result<Box<dyn SpawnedObject>, ConstructionError> {
        self.construct(&spec.type_id, &spec.fields, ctx)
    }

    /// Builds an object of type `type_id` from `fields`.
    ///
    /// Constructors are tried in order until one can be called. Each value parameter is taken
    /// from the field of the same name, or from its default. Fields left over are assigned
    /// afterwards; fields the type doesn't have are logged and skipped.
    pub fn construct(
        &self,
        type_id: &str,
        fields: &Map<String, Value>,
        ctx: &mut SpawnContext,
    ) -> Result<Box<dyn SpawnedObject>, ConstructionError> {
        if let Some(extension) = self.extension.borrow().as_ref() {
            if extension.handles(type_id) {
                log::debug!("Spawn extension is building '{type_id}'.");
                return extension.construct(type_id, fields, ctx);
            }
        }

        let variant = self.resolve(type_id)?;

        let mut fields = fields.clone();
        let id = match take_entity_id(&mut fields) {
            Some(id) => id,
            None => ctx.new_entity_id(),
        };

        let room = ctx.room();
        let coordinate = ctx.coordinate();

        let mut attempts = vec![];

        for constructor in &variant.constructors {
            let values = match fill_params(constructor, &fields) {
                Ok(values) => values,
                Err(err) => {
                    attempts.push(format!("{}: {err}", constructor.signature()));
                    continue;
                }
            };

            let args = ConstructorArgs {
                room: room.clone(),
                coordinate,
                id,
                values,
            };

            match (constructor.build)(&args) {
                Ok(object) => {
                    let consumed = constructor
                        .params
                        .iter()
                        .map(|param| param.name)
                        .collect_vec();
                    return assign_remaining(variant, object, &fields, &consumed);
                }

                Err(err) => attempts.push(format!("{}: {err}", constructor.signature())),
            }
        }

        let unmatched = fields
            .keys()
            .filter(|key| {
                !variant
                    .constructors
                    .iter()
                    .flat_map(|constructor| constructor.params.iter())
                    .any(|param| param.name == key.as_str())
            })
            .cloned()
            .collect();

        Err(ConstructionError::NoConstructor {
            type_name: variant.name,
            attempts,
            unmatched,
        })
    }
}

impl Default for ObjectFactory {
    fn default() -> Self {
        ObjectFactory::new()
    }
}

/// Removes the first field whose key is an entity ID and returns the ID.
fn take_entity_id(fields: &mut Map<String, Value>) -> Option<EntityId> {
    let key = fields.keys().find(|key| EntityId::looks_like(key))?.clone();
    fields.remove(&key);

    match key.parse() {
        Ok(id) => Some(id),
        Err(err) => {
            log::warn!("{err}; a new ID will be allocated.");
            None
        }
    }
}

fn fill_params(
    constructor: &Constructor,
    fields: &Map<String, Value>,
) -> Result<HashMap<&'static str, FieldValue>, FieldError> {
    let mut values = HashMap::new();

    for param in &constructor.params {
        let kind = match param.kind {
            ParamKind::Value(kind) => kind,

            // Supplied by the context.
            _ => continue,
        };

        let supplied = match fields.get(param.name) {
            Some(raw) => convert(raw, kind).map_err(|source| FieldError::Conversion {
                field: param.name.to_string(),
                source,
            })?,

            None => None,
        };

        let value = supplied
            .or_else(|| param.default.clone())
            .ok_or_else(|| FieldError::Missing(param.name.to_string()))?;

        values.insert(param.name, value);
    }

    Ok(values)
}

fn assign_remaining(
    variant: &Variant,
    mut object: Box<dyn SpawnedObject>,
    fields: &Map<String, Value>,
    consumed: &[&str],
) -> Result<Box<dyn SpawnedObject>, ConstructionError> {
    let field_error = |field: &str, source| ConstructionError::Field {
        type_name: variant.name,
        field: field.to_string(),
        source,
    };

    for (key, raw) in fields.iter().filter(|(key, _)| !consumed.contains(&key.as_str())) {
        let (name, kind) = match variant.field(key) {
            Some(field) => field,
            None => {
                log::warn!("{} has no field '{key}'. Skipping it.", variant.name);
                continue;
            }
        };

        let value = convert(raw, kind).map_err(|source| {
            field_error(
                key,
                FieldError::Conversion {
                    field: name.to_string(),
                    source,
                },
            )
        })?;

        if let Some(value) = value {
            object
                .assign(name, value)
                .map_err(|source| field_error(key, source))?;
        }
    }

    Ok(object)
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use serde_json::json;
    use vector2d::Vector2D;

    use super::*;
    use crate::{
        spawn::{DataPearl, PearlType, Spear, WaterNut},
        world::testing::TestRoom,
    };

    fn fields(json: Value) -> Map<String, Value> {
        match json {
            Value::Object(map) => map,
            _ => panic!("test fields must be an object"),
        }
    }

    fn build(
        factory: &ObjectFactory,
        type_id: &str,
        json: Value,
    ) -> Result<Box<dyn SpawnedObject>, ConstructionError> {
        let mut room = TestRoom::new("SU_C04");
        let mut ctx = SpawnContext::new(&mut room);

        factory.construct(type_id, &fields(json), &mut ctx)
    }

    fn downcast<T: 'static>(object: &dyn SpawnedObject) -> &T {
        object.as_any().downcast_ref::<T>().unwrap()
    }

    #[test]
    fn short_names_resolve_to_abstract_types() {
        let factory = ObjectFactory::with_builtins();

        assert_eq!(factory.resolve("AbstractSpear").unwrap().name(), "AbstractSpear");
        assert_eq!(factory.resolve("spear").unwrap().name(), "AbstractSpear");

        let qualified = factory.resolve("AbstractWaterNut").unwrap().qualified_name().to_string();
        assert_eq!(factory.resolve(&qualified).unwrap().name(), "AbstractWaterNut");
    }

    #[test]
    fn unknown_types_fail_resolution() {
        let factory = ObjectFactory::with_builtins();

        assert_eq!(
            build(&factory, "NotARealType", json!({})).unwrap_err(),
            ConstructionError::Resolution(ResolutionError::Unknown("NotARealType".to_string()))
        );
    }

    #[test]
    fn ambiguous_short_names_are_an_error() {
        fn never(_: &ConstructorArgs) -> Result<Box<dyn SpawnedObject>, FieldError> {
            Err(FieldError::Missing("anything".to_string()))
        }

        let mut factory = ObjectFactory::new();
        factory.register(
            Variant::new("AbstractRock")
                .qualified("world.AbstractRock")
                .constructor(Constructor::public(never)),
        );
        factory.register(
            Variant::new("Rock")
                .qualified("items.Rock")
                .constructor(Constructor::public(never)),
        );
        factory.register(
            Variant::new("AbstractRock")
                .qualified("legacy.AbstractRock")
                .constructor(Constructor::public(never)),
        );

        // An exact match wins over the short name.
        assert_eq!(factory.resolve("Rock").unwrap().qualified_name(), "items.Rock");
        assert_eq!(
            factory.resolve("legacy.AbstractRock").unwrap().qualified_name(),
            "legacy.AbstractRock"
        );

        match factory.resolve("AbstractRock").unwrap_err() {
            ResolutionError::Ambiguous { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn leftover_fields_are_assigned() {
        let factory = ObjectFactory::with_builtins();
        let object = build(&factory, "Spear", json!({ "electricCharge": 3 })).unwrap();

        let spear = downcast::<Spear>(object.as_ref());
        assert_eq!(spear.electric_charge, 3);
        assert!(!spear.explosive);
    }

    #[test]
    fn constructor_parameters_take_matching_fields() {
        let factory = ObjectFactory::with_builtins();
        let object = build(
            &factory,
            "AbstractSpear",
            json!({ "explosive": true, "hue": 0.5, "unknownThing": 1 }),
        )
        .unwrap();

        let spear = downcast::<Spear>(object.as_ref());
        assert!(spear.explosive);
        assert_eq!(spear.hue, 0.5);
    }

    #[test]
    fn defaults_fill_missing_parameters() {
        let factory = ObjectFactory::with_builtins();

        let nut = build(&factory, "WaterNut", json!({})).unwrap();
        assert!(!downcast::<WaterNut>(nut.as_ref()).swollen);

        let nut = build(&factory, "WaterNut", json!({ "swollen": "default" })).unwrap();
        assert!(!downcast::<WaterNut>(nut.as_ref()).swollen);

        let nut = build(&factory, "WaterNut", json!({ "swollen": true })).unwrap();
        assert!(downcast::<WaterNut>(nut.as_ref()).swollen);
    }

    #[test]
    fn enum_fields_ignore_case() {
        let factory = ObjectFactory::with_builtins();
        let pearl = build(&factory, "DataPearl", json!({ "dataPearlType": "si_top" })).unwrap();

        assert_eq!(downcast::<DataPearl>(pearl.as_ref()).pearl_type, PearlType::SI_top);
    }

    #[test]
    fn bad_field_values_fail_construction() {
        let factory = ObjectFactory::with_builtins();

        assert!(matches!(
            build(&factory, "Spear", json!({ "electricCharge": [1, 2] })).unwrap_err(),
            ConstructionError::Field { field, .. } if field == "electricCharge"
        ));
    }

    #[test]
    fn constructions_do_not_share_state() {
        let factory = ObjectFactory::with_builtins();
        let mut room = TestRoom::new("SU_C04");
        let mut ctx = SpawnContext::new(&mut room);

        let first = factory
            .construct(
                "Spear",
                &fields(json!({ "explosive": true, "electricCharge": 3, "hue": 0.75 })),
                &mut ctx,
            )
            .unwrap();
        let second = factory
            .construct("Spear", &fields(json!({})), &mut ctx)
            .unwrap();

        let (first_spear, second_spear) = (
            downcast::<Spear>(first.as_ref()),
            downcast::<Spear>(second.as_ref()),
        );

        assert!(first_spear.explosive);
        assert_eq!(first_spear.electric_charge, 3);
        assert_eq!(first_spear.hue, 0.75);

        assert!(!second_spear.explosive);
        assert_eq!(second_spear.electric_charge, 0);
        assert_eq!(second_spear.hue, 0.0);

        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn entity_id_keys_set_the_id() {
        let factory = ObjectFactory::with_builtins();
        let spear = build(&factory, "Spear", json!({ "ID.-1.4051.3": null })).unwrap();

        assert_eq!(spear.id(), EntityId::new(-1, 4051).with_alt_seed(3));
    }

    #[test]
    fn objects_start_at_the_room_origin() {
        let factory = ObjectFactory::with_builtins();
        let spear = build(&factory, "Spear", json!({})).unwrap();

        assert_eq!(spear.coordinate(), WorldCoordinate::room_origin(7));
        assert_eq!(spear.position(), None);
    }

    #[test]
    fn failed_constructors_are_reported_together() {
        fn needs_colour(args: &ConstructorArgs) -> Result<Box<dyn SpawnedObject>, FieldError> {
            args.int("colour")?;
            unreachable!()
        }

        let mut factory = ObjectFactory::new();
        factory.register(
            Variant::new("Lantern")
                .constructor(
                    Constructor::public(needs_colour)
                        .placed()
                        .param("colour", FieldKind::Int),
                )
                .constructor(
                    Constructor::private(needs_colour)
                        .placed()
                        .param("glow", FieldKind::Float),
                ),
        );

        match build(&factory, "Lantern", json!({ "brightness": 2 })).unwrap_err() {
            ConstructionError::NoConstructor {
                type_name,
                attempts,
                unmatched,
            } => {
                assert_eq!(type_name, "Lantern");
                assert_eq!(attempts.len(), 2);
                assert_eq!(unmatched, vec!["brightness".to_string()]);
            }

            other => panic!("unexpected error {other:?}"),
        }
    }

    #[derive(Debug)]
    struct Pebble {
        id: EntityId,
        coordinate: WorldCoordinate,
    }

    impl SpawnedObject for Pebble {
        fn id(&self) -> EntityId {
            self.id
        }

        fn type_name(&self) -> &'static str {
            "Pebble"
        }

        fn coordinate(&self) -> WorldCoordinate {
            self.coordinate
        }

        fn assign(&mut self, field: &str, _: FieldValue) -> Result<(), FieldError> {
            Err(FieldError::Unknown(field.to_string()))
        }

        fn realize(&mut self, _: Vector2D<f32>) {}

        fn position(&self) -> Option<Vector2D<f32>> {
            None
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Pebbles;

    impl SpawnExtension for Pebbles {
        fn handles(&self, type_id: &str) -> bool {
            type_id == "Pebble" || type_id == "Spear"
        }

        fn construct(
            &self,
            _: &str,
            _: &Map<String, Value>,
            ctx: &mut SpawnContext,
        ) -> Result<Box<dyn SpawnedObject>, ConstructionError> {
            Ok(Box::new(Pebble {
                id: ctx.new_entity_id(),
                coordinate: ctx.coordinate(),
            }))
        }
    }

    #[test]
    fn extension_is_asked_first() {
        let factory = ObjectFactory::with_builtins();
        assert!(factory.check("Pebble").is_err());

        assert!(factory.set_extension(Box::new(Pebbles)).is_none());
        assert!(factory.check("Pebble").is_ok());

        assert_eq!(build(&factory, "Pebble", json!({})).unwrap().type_name(), "Pebble");
        assert_eq!(build(&factory, "Spear", json!({})).unwrap().type_name(), "Pebble");
        assert_eq!(
            build(&factory, "WaterNut", json!({})).unwrap().type_name(),
            "AbstractWaterNut"
        );

        assert!(factory.set_extension(Box::new(Pebbles)).is_some());
    }
}
