//! Scripted input sequences that drive an actor for a short time after it appears.

mod cutscene;
mod input;
mod runner;
mod script;

pub use cutscene::CutsceneSpec;
pub use input::{ActionFrame, InputPackage};
pub use runner::SequenceRunner;
pub use script::{SequenceState, Sequencer};
