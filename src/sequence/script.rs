use super::{ActionFrame, CutsceneSpec, InputPackage};
use crate::{
    spawn::{EntityId, ObjectFactory, SpawnContext, SpawnedObject},
    world::Room,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SequenceState {
    /// Waiting for an actor to appear.
    Idle,

    /// Driving an actor.
    Playing,

    /// Finished. A finished sequencer never does anything again.
    Done,
}

/// Plays a list of input frames on the first actor that appears in a room.
#[derive(Debug)]
pub struct Sequencer {
    room: String,
    frames: Vec<ActionFrame>,
    pending: Vec<Box<dyn SpawnedObject>>,
    food: Option<(i32, i32)>,

    state: SequenceState,
    actor: Option<EntityId>,
    index: usize,
    timer: u32,
}

impl Sequencer {
    /// Creates a sequencer that only plays `frames`.
    pub fn new(room: impl Into<String>, frames: Vec<ActionFrame>) -> Sequencer {
        Sequencer {
            room: room.into(),
            frames,
            pending: vec![],
            food: None,
            state: SequenceState::Idle,
            actor: None,
            index: 0,
            timer: 0,
        }
    }

    /// Creates a sequencer for `cutscene` in `room`. The objects the actor will hold are built
    /// straight away; any that can't be built are logged and left out.
    pub fn start(
        room: &mut dyn Room,
        cutscene: &CutsceneSpec,
        factory: &ObjectFactory,
    ) -> Sequencer {
        let mut sequencer = Sequencer::new(room.name(), cutscene.frames.clone());
        sequencer.food = cutscene.food_pips();

        for spec in &cutscene.grasps {
            let mut ctx = SpawnContext::new(room);

            match factory.construct_spec(spec, &mut ctx) {
                Ok(object) => sequencer.pending.push(object),
                Err(err) => log::error!(
                    "Unable to build '{}' for the intro in {}: {err}",
                    spec.type_id,
                    sequencer.room
                ),
            }
        }

        sequencer
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// The actor being driven, once there is one.
    pub fn actor(&self) -> Option<EntityId> {
        self.actor
    }

    /// The input for the current frame, while playing.
    pub fn current_input(&self) -> Option<InputPackage> {
        match self.state {
            SequenceState::Playing => self.frames.get(self.index).map(|frame| frame.input),
            _ => None,
        }
    }

    /// Advances the sequence by one tick.
    ///
    /// The tick an actor is found on is also the first tick its input is played. The sequence
    /// finishes on the tick its last frame runs out.
    pub fn update(&mut self, room: &mut dyn Room) -> SequenceState {
        let state = self.state;

        match state {
            SequenceState::Done => return SequenceState::Done,
            SequenceState::Idle if !self.bind(room) => return SequenceState::Idle,
            _ => (),
        }

        let actor = match self.actor {
            Some(id) => room.actor_mut(id),
            None => None,
        };

        let actor = match actor {
            Some(actor) => actor,
            None => {
                log::info!("The actor playing the intro in {} is gone.", self.room);

                // Nobody to hand control back to.
                self.actor = None;
                self.stop(room);

                return self.state;
            }
        };

        if let Some(frame) = self.frames.get(self.index) {
            actor.apply_input(frame.input);

            self.timer += 1;

            if self.timer >= frame.hold_ticks {
                self.timer = 0;
                self.index += 1;
            }
        }

        if self.index >= self.frames.len() {
            self.stop(room);
        }

        self.state
    }

    /// Looks for an actor to drive. Returns `true` once one has been found.
    fn bind(&mut self, room: &mut dyn Room) -> bool {
        let id = match room.first_controllable_actor() {
            Some(id) => id,
            None => return false,
        };

        let actor = match room.actor_mut(id) {
            Some(actor) => actor,
            None => return false,
        };

        actor.take_control();

        if let Some((pips, quarter_pips)) = self.food {
            actor.set_food(pips, quarter_pips);
        }

        let position = actor.position();

        for mut object in self.pending.drain(..) {
            object.realize(position);

            let object_id = object.id();
            room.add_entity(object);

            if let Some(actor) = room.actor_mut(id) {
                if let Some(hand) = actor.free_hand() {
                    actor.grab(hand, object_id);
                }
            }
        }

        log::info!("Intro in {} is now driving {id}.", self.room);

        self.actor = Some(id);
        self.state = SequenceState::Playing;

        true
    }

    /// Finishes the sequence and gives control back to the actor. Stopping a finished sequence
    /// does nothing.
    pub fn stop(&mut self, room: &mut dyn Room) {
        if self.state == SequenceState::Done {
            return;
        }

        if let Some(id) = self.actor {
            if let Some(actor) = room.actor_mut(id) {
                actor.release_control();
            }
        }

        self.pending.clear();
        self.state = SequenceState::Done;

        log::info!("Intro in {} finished.", self.room);
    }
}
