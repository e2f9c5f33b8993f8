mod clock;
mod engine;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Phase, PhaseEngine, PhaseEvent};
