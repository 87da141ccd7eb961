mod events;
mod state;
mod timer;

pub use events::{EventChannels, EventCounts, EventKind, EventObserverHandle, InteractionEvent};
pub use state::{transition_plan, InteractableState, TransitionEffect, TransitionPlan, ALL_STATES};
pub use timer::{TimerHandle, TimerService};
