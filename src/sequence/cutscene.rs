use std::collections::HashMap;

use serde_json::Value;

use super::ActionFrame;
use crate::{
    features::decode::{self, DecodeError},
    spawn::{ConstructionSpec, ObjectFactory},
};

/// What happens when an actor first appears in a room: the inputs it plays, the objects it holds
/// and how full its stomach is.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct CutsceneSpec {
    pub frames: Vec<ActionFrame>,
    pub grasps: Vec<ConstructionSpec>,
    pub food: Option<f32>,
}

impl CutsceneSpec {
    pub fn decode(json: &Value, factory: &ObjectFactory) -> Result<CutsceneSpec, DecodeError> {
        let object = json
            .as_object()
            .ok_or_else(|| DecodeError::wrong_type("a cutscene object", json))?;

        let mut spec = CutsceneSpec::default();

        for (key, value) in object {
            match key.as_str() {
                "inputs" => spec.frames = ActionFrame::decode_list(value)?,
                "player_grasps" => spec.grasps = ConstructionSpec::decode_list(value, factory)?,
                "food" => spec.food = Some(decode::float(value)?),

                other => {
                    return Err(DecodeError::Invalid(format!(
                        "'{other}' is not part of a cutscene"
                    )))
                }
            }
        }

        Ok(spec)
    }

    /// Reads an object mapping room names to cutscenes.
    pub fn decode_rooms(
        json: &Value,
        factory: &ObjectFactory,
    ) -> Result<HashMap<String, CutsceneSpec>, DecodeError> {
        let rooms = json
            .as_object()
            .ok_or_else(|| DecodeError::wrong_type("an object of rooms", json))?;

        rooms
            .iter()
            .map(|(room, cutscene)| Ok((room.clone(), CutsceneSpec::decode(cutscene, factory)?)))
            .collect()
    }

    /// Splits the food value into whole pips and quarter pips.
    pub fn food_pips(&self) -> Option<(i32, i32)> {
        let quarters = (self.food? * 4.0).round().max(0.0) as i32;

        Some((quarters / 4, quarters % 4))
    }
}
