use serde_json::Value;

use crate::features::decode::{self, DecodeError};

/// The most times one frame can be repeated.
pub const MAX_REPEAT: usize = 4096;

/// The most frames a single list can expand to.
pub const MAX_FRAMES: usize = 16384;

/// One tick's worth of controller input.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputPackage {
    pub x: i32,
    pub y: i32,
    pub jmp: bool,
    pub thrw: bool,
    pub pckp: bool,
    pub mp: bool,
    pub crouch_toggle: bool,

    /// Set to `x` when holding down and a direction, which makes the actor roll.
    pub down_diagonal: i32,
}

/// An input held for a number of ticks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ActionFrame {
    pub input: InputPackage,
    pub hold_ticks: u32,
}

impl ActionFrame {
    /// Creates a frame. Every frame lasts at least one tick.
    pub fn new(input: InputPackage, hold_ticks: u32) -> ActionFrame {
        ActionFrame {
            input,
            hold_ticks: hold_ticks.max(1),
        }
    }

    /// Reads one frame object, returning it as many times as its `repeat` key asks for.
    pub fn decode(json: &Value) -> Result<Vec<ActionFrame>, DecodeError> {
        let object = json
            .as_object()
            .ok_or_else(|| DecodeError::wrong_type("an input frame object", json))?;

        let mut input = InputPackage::default();
        let mut hold_ticks = 1;
        let mut repeat = 1;

        for (key, value) in object {
            match key.as_str() {
                "x" => input.x = decode::int(value)?,
                "y" => input.y = decode::int(value)?,
                "jump" | "jmp" => input.jmp = decode::bool(value)?,
                "throw" | "thrw" => input.thrw = decode::bool(value)?,
                "grab" | "pckp" => input.pckp = decode::bool(value)?,
                "map" | "mp" => input.mp = decode::bool(value)?,
                "crouch" | "crouchToggle" => input.crouch_toggle = decode::bool(value)?,
                "time" => hold_ticks = decode::int(value)?.max(1) as u32,
                "repeat" => repeat = decode::int(value)?.max(1) as usize,

                // Frames may carry notes for whoever wrote them.
                _ => {}
            }
        }

        if repeat > MAX_REPEAT {
            return Err(DecodeError::Invalid(format!(
                "frame is repeated {repeat} times (at most {MAX_REPEAT} allowed)"
            )));
        }

        if input.x != 0 && input.y == -1 {
            input.down_diagonal = input.x;
        }

        Ok(vec![ActionFrame::new(input, hold_ticks); repeat])
    }

    /// Reads a list of frame objects.
    pub fn decode_list(json: &Value) -> Result<Vec<ActionFrame>, DecodeError> {
        let items = json
            .as_array()
            .ok_or_else(|| DecodeError::wrong_type("a list of input frames", json))?;

        let mut frames = vec![];

        for item in items {
            frames.extend(ActionFrame::decode(item)?);

            if frames.len() > MAX_FRAMES {
                return Err(DecodeError::Invalid(format!(
                    "input list is longer than {MAX_FRAMES} frames"
                )));
            }
        }

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn long_and_short_key_names() {
        let long = ActionFrame::decode(
            &json!({ "jump": true, "throw": true, "grab": true, "map": true, "crouch": true }),
        )
        .unwrap();
        let short = ActionFrame::decode(
            &json!({ "jmp": true, "thrw": true, "pckp": true, "mp": true, "crouchToggle": true }),
        )
        .unwrap();

        assert_eq!(long, short);
        assert!(long[0].input.jmp && long[0].input.crouch_toggle);
    }

    #[test]
    fn time_defaults_to_one_tick() {
        let frames = ActionFrame::decode(&json!({ "x": 1 })).unwrap();
        assert_eq!(frames[0].hold_ticks, 1);

        let frames = ActionFrame::decode(&json!({ "x": 1, "time": 0 })).unwrap();
        assert_eq!(frames[0].hold_ticks, 1);

        let frames = ActionFrame::decode(&json!({ "x": 1, "time": 40 })).unwrap();
        assert_eq!(frames[0].hold_ticks, 40);
    }

    #[test]
    fn repeat_duplicates_the_frame() {
        let frames = ActionFrame::decode_list(&json!([
            { "x": 1, "repeat": 3, "time": 2 },
            { "jump": true }
        ]))
        .unwrap();

        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], frames[2]);
        assert_eq!(frames[2].hold_ticks, 2);
        assert!(frames[3].input.jmp);
    }

    #[test]
    fn down_and_sideways_rolls() {
        let frames = ActionFrame::decode(&json!({ "x": -1, "y": -1 })).unwrap();
        assert_eq!(frames[0].input.down_diagonal, -1);

        let frames = ActionFrame::decode(&json!({ "x": 1, "y": 1 })).unwrap();
        assert_eq!(frames[0].input.down_diagonal, 0);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(ActionFrame::decode(&json!({ "x": "left" })).is_err());
        assert!(ActionFrame::decode(&json!([1, 2])).is_err());
        assert!(ActionFrame::decode_list(&json!({ "x": 1 })).is_err());
    }

    #[test]
    fn huge_repeats_are_rejected() {
        assert!(matches!(
            ActionFrame::decode(&json!({ "x": 1, "repeat": i32::MAX })),
            Err(DecodeError::Invalid(_))
        ));

        let frames = ActionFrame::decode(&json!({ "x": 1, "repeat": MAX_REPEAT })).unwrap();
        assert_eq!(frames.len(), MAX_REPEAT);
    }

    #[test]
    fn long_frame_lists_are_rejected() {
        let chunk = json!({ "x": 1, "repeat": MAX_REPEAT });
        let list = json!(vec![chunk; MAX_FRAMES / MAX_REPEAT + 1]);

        assert!(matches!(ActionFrame::decode_list(&list), Err(DecodeError::Invalid(_))));
    }
}
