//! The object types the factory can build without an extension.

use std::any::Any;

use strum::{Display, EnumString, EnumVariantNames, IntoStaticStr, VariantNames};
use vector2d::Vector2D;

use super::{
    Constructor, ConstructorArgs, EntityId, FieldError, FieldKind, FieldValue, SpawnedObject,
    Variant,
};
use crate::world::WorldCoordinate;

/// The state every world object shares.
#[derive(Clone, Debug)]
pub struct Placement {
    pub id: EntityId,
    pub room: String,
    pub coordinate: WorldCoordinate,
    pub position: Option<Vector2D<f32>>,
}

impl Placement {
    fn from_args(args: &ConstructorArgs) -> Placement {
        Placement {
            id: args.id(),
            room: args.room().name.clone(),
            coordinate: args.coordinate(),
            position: None,
        }
    }
}

/// Implements `SpawnedObject` for a type with a `placement` field and a `set` method.
macro_rules! placed_object {
    ($ty:ty, $name:literal) => {
        impl SpawnedObject for $ty {
            fn id(&self) -> EntityId {
                self.placement.id
            }

            fn type_name(&self) -> &'static str {
                $name
            }

            fn coordinate(&self) -> WorldCoordinate {
                self.placement.coordinate
            }

            fn assign(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
                self.set(field, value)
            }

            fn realize(&mut self, position: Vector2D<f32>) {
                self.placement.position = Some(position);
            }

            fn position(&self) -> Option<Vector2D<f32>> {
                self.placement.position
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

fn qualified(name: &str) -> String {
    format!("{}::{name}", module_path!())
}

#[derive(Clone, Debug)]
pub struct Spear {
    pub placement: Placement,
    pub explosive: bool,
    pub electric: bool,
    pub electric_charge: i32,
    pub needle: bool,
    pub hue: f32,
}

impl Spear {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("explosive", FieldKind::Bool),
        ("electric", FieldKind::Bool),
        ("electricCharge", FieldKind::Int),
        ("needle", FieldKind::Bool),
        ("hue", FieldKind::Float),
    ];

    fn base(args: &ConstructorArgs) -> Spear {
        Spear {
            placement: Placement::from_args(args),
            explosive: false,
            electric: false,
            electric_charge: 0,
            needle: false,
            hue: 0.0,
        }
    }

    fn build_plain(args: &ConstructorArgs) -> Result<Box<dyn SpawnedObject>, FieldError> {
        Ok(Box::new(Spear::base(args)))
    }

    fn build_explosive(args: &ConstructorArgs) -> Result<Box<dyn SpawnedObject>, FieldError> {
        Ok(Box::new(Spear {
            explosive: args.bool("explosive")?,
            ..Spear::base(args)
        }))
    }

    fn build_electric(args: &ConstructorArgs) -> Result<Box<dyn SpawnedObject>, FieldError> {
        Ok(Box::new(Spear {
            explosive: args.bool("explosive")?,
            electric: args.bool("electric")?,
            ..Spear::base(args)
        }))
    }

    fn variant() -> Variant {
        Variant::new("AbstractSpear")
            .qualified(qualified("AbstractSpear"))
            .fields(Spear::FIELDS)
            .constructor(
                Constructor::public(Spear::build_electric)
                    .placed()
                    .param("explosive", FieldKind::Bool)
                    .param("electric", FieldKind::Bool),
            )
            .constructor(
                Constructor::public(Spear::build_explosive)
                    .placed()
                    .param_or("explosive", FieldKind::Bool, FieldValue::Bool(false)),
            )
            .constructor(Constructor::private(Spear::build_plain).placed())
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
        match field {
            "explosive" => self.explosive = value.expect_bool(field)?,
            "electric" => self.electric = value.expect_bool(field)?,
            "electricCharge" => self.electric_charge = value.expect_int(field)?,
            "needle" => self.needle = value.expect_bool(field)?,
            "hue" => self.hue = value.expect_float(field)?,
            _ => return Err(FieldError::Unknown(field.to_string())),
        }

        Ok(())
    }
}

placed_object!(Spear, "AbstractSpear");

/// The kinds of data pearl.
#[allow(non_camel_case_types)]
#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Display, EnumString, EnumVariantNames, IntoStaticStr,
)]
pub enum PearlType {
    Misc,
    Misc2,
    CC,
    SI_west,
    SI_top,
    LF_west,
    LF_bottom,
    HI,
    SH,
    DS,
    SB_filtration,
    SB_ravine,
    GW,
    SL_bridge,
    SL_moon,
    SU,
    UW,
    SL_chimney,
    Red_stomach,
}

#[derive(Clone, Debug)]
pub struct DataPearl {
    pub placement: Placement,
    pub pearl_type: PearlType,
}

impl DataPearl {
    const FIELDS: &'static [(&'static str, FieldKind)] =
        &[("dataPearlType", FieldKind::Enum(PearlType::VARIANTS))];

    fn pearl_type(field: &str, value: &FieldValue) -> Result<PearlType, FieldError> {
        value
            .expect_enum(field)?
            .parse()
            .map_err(|_| FieldError::WrongKind {
                field: field.to_string(),
                expected: "a pearl type",
            })
    }

    fn build(args: &ConstructorArgs) -> Result<Box<dyn SpawnedObject>, FieldError> {
        let field = "dataPearlType";

        Ok(Box::new(DataPearl {
            placement: Placement::from_args(args),
            pearl_type: DataPearl::pearl_type(field, args.value(field)?)?,
        }))
    }

    fn variant() -> Variant {
        Variant::new("AbstractDataPearl")
            .qualified(qualified("AbstractDataPearl"))
            .fields(DataPearl::FIELDS)
            .constructor(Constructor::public(DataPearl::build).placed().param_or(
                "dataPearlType",
                FieldKind::Enum(PearlType::VARIANTS),
                FieldValue::Enum(PearlType::Misc.into()),
            ))
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
        match field {
            "dataPearlType" => self.pearl_type = DataPearl::pearl_type(field, &value)?,
            _ => return Err(FieldError::Unknown(field.to_string())),
        }

        Ok(())
    }
}

placed_object!(DataPearl, "AbstractDataPearl");

#[derive(Clone, Debug)]
pub struct WaterNut {
    pub placement: Placement,
    pub swollen: bool,
}

impl WaterNut {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[("swollen", FieldKind::Bool)];

    fn build(args: &ConstructorArgs) -> Result<Box<dyn SpawnedObject>, FieldError> {
        Ok(Box::new(WaterNut {
            placement: Placement::from_args(args),
            swollen: args.bool("swollen")?,
        }))
    }

    fn variant() -> Variant {
        Variant::new("AbstractWaterNut")
            .qualified(qualified("AbstractWaterNut"))
            .fields(WaterNut::FIELDS)
            .constructor(Constructor::public(WaterNut::build).placed().param_or(
                "swollen",
                FieldKind::Bool,
                FieldValue::Bool(false),
            ))
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
        match field {
            "swollen" => self.swollen = value.expect_bool(field)?,
            _ => return Err(FieldError::Unknown(field.to_string())),
        }

        Ok(())
    }
}

placed_object!(WaterNut, "AbstractWaterNut");

#[derive(Clone, Debug)]
pub struct BubbleGrass {
    pub placement: Placement,
    pub oxygen_left: f32,
}

impl BubbleGrass {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[("oxygenLeft", FieldKind::Float)];

    fn build(args: &ConstructorArgs) -> Result<Box<dyn SpawnedObject>, FieldError> {
        Ok(Box::new(BubbleGrass {
            placement: Placement::from_args(args),
            oxygen_left: args.float("oxygenLeft")?.clamp(0.0, 1.0),
        }))
    }

    fn variant() -> Variant {
        Variant::new("AbstractBubbleGrass")
            .qualified(qualified("AbstractBubbleGrass"))
            .fields(BubbleGrass::FIELDS)
            .constructor(Constructor::public(BubbleGrass::build).placed().param_or(
                "oxygenLeft",
                FieldKind::Float,
                FieldValue::Float(1.0),
            ))
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
        match field {
            "oxygenLeft" => self.oxygen_left = value.expect_float(field)?.clamp(0.0, 1.0),
            _ => return Err(FieldError::Unknown(field.to_string())),
        }

        Ok(())
    }
}

placed_object!(BubbleGrass, "AbstractBubbleGrass");

/// Returns the built-in variants.
pub fn builtins() -> Vec<Variant> {
    vec![
        Spear::variant(),
        DataPearl::variant(),
        WaterNut::variant(),
        BubbleGrass::variant(),
    ]
}
