mod binder;
mod interactable;
mod interactor;
mod scenario;
mod world;

pub use binder::{
    CollisionHandle, HighlightHandle, InteractionKey, NullBinder, ResponseChannel, SceneBinder,
    TypeTag,
};
pub use interactable::{Interactable, InteractableConfig, LifecycleMode};
pub use interactor::{Interactor, InteractorConfig, InteractorState};
pub use scenario::{
    ScenarioDependency, ScenarioError, ScenarioFile, ScenarioInteractable, ScenarioInteractor,
    SpawnedScenario, SCENARIO_VERSION,
};
pub use world::InteractionWorld;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InteractableId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InteractorId(pub u64);

impl std::fmt::Display for InteractableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "interactable#{}", self.0)
    }
}

impl std::fmt::Display for InteractorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "interactor#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }
}
