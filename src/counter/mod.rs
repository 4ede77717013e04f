pub mod machine;
pub mod profile;
pub mod state;

pub use machine::{RepCounter, DEFAULT_SETTLE_COOLDOWN};
pub use profile::{ExerciseKind, ExerciseProfile, ProfileTable};
pub use state::{FormState, RepEvent, RepStage};
