pub mod machine;
pub mod scene;

pub use machine::{
    transition_plan, EventCounts, EventKind, EventObserverHandle, InteractableState,
    InteractionEvent, TimerHandle, TimerService, TransitionEffect, TransitionPlan,
};
pub use scene::{
    CollisionHandle, HighlightHandle, Interactable, InteractableConfig, InteractableId,
    InteractionKey, InteractionWorld, Interactor, InteractorConfig, InteractorId, InteractorState,
    LifecycleMode, NullBinder, ResponseChannel, ScenarioDependency, ScenarioError, ScenarioFile,
    ScenarioInteractable, ScenarioInteractor, SceneBinder, SpawnedScenario, TypeTag,
    SCENARIO_VERSION,
};
