use std::collections::HashMap;

use super::{SequenceState, Sequencer};
use crate::world::Room;

/// Keeps the running sequencers of each room and updates them with their room.
#[derive(Debug, Default)]
pub struct SequenceRunner {
    rooms: HashMap<String, Vec<Sequencer>>,
}

impl SequenceRunner {
    pub fn new() -> SequenceRunner {
        SequenceRunner::default()
    }

    pub fn add(&mut self, sequencer: Sequencer) {
        log::debug!("Adding a sequencer to {}.", sequencer.room());

        self.rooms
            .entry(sequencer.room().to_string())
            .or_default()
            .push(sequencer);
    }

    /// Updates each sequencer for `room` in turn and drops the ones that finish. Returns the number
    /// still running.
    pub fn update(&mut self, room: &mut dyn Room) -> usize {
        let sequencers = match self.rooms.get_mut(room.name()) {
            Some(sequencers) => sequencers,
            None => return 0,
        };

        sequencers.retain_mut(|sequencer| sequencer.update(room) != SequenceState::Done);

        let remaining = sequencers.len();

        if remaining == 0 {
            self.rooms.remove(room.name());
        }

        remaining
    }

    /// Stops every sequencer for `room`, e.g. when the room is unloaded.
    pub fn stop_room(&mut self, room: &mut dyn Room) {
        if let Some(mut sequencers) = self.rooms.remove(room.name()) {
            for sequencer in &mut sequencers {
                sequencer.stop(room);
            }
        }
    }

    /// The number of sequencers running in the room called `room_name`.
    pub fn active(&self, room_name: &str) -> usize {
        self.rooms.get(room_name).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
