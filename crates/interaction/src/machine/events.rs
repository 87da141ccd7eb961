use std::collections::BTreeMap;

use crate::machine::InteractableState;
use crate::scene::{
    CollisionHandle, HighlightHandle, InteractableId, InteractionKey, InteractorId, TypeTag,
};

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    StateChanged {
        id: InteractableId,
        state: InteractableState,
    },
    InteractorFound {
        id: InteractableId,
        interactor: InteractorId,
    },
    InteractorLost {
        id: InteractableId,
        interactor: Option<InteractorId>,
    },
    InteractorOverlapped {
        id: InteractableId,
        interactor: InteractorId,
    },
    InteractorStopOverlap {
        id: InteractableId,
        interactor: InteractorId,
    },
    InteractorTraced {
        id: InteractableId,
        interactor: InteractorId,
    },
    InteractableSelected {
        id: InteractableId,
        interactor: InteractorId,
    },
    InteractionStarted {
        id: InteractableId,
        time_seconds: f32,
        key: InteractionKey,
    },
    InteractionStopped {
        id: InteractableId,
        time_seconds: f32,
    },
    InteractionCompleted {
        id: InteractableId,
        time_seconds: f32,
    },
    InteractionCycleCompleted {
        id: InteractableId,
        time_seconds: f32,
        remaining_lifecycles: i32,
    },
    InteractionCanceled {
        id: InteractableId,
    },
    LifecycleCompleted {
        id: InteractableId,
    },
    CooldownCompleted {
        id: InteractableId,
    },
    DependencyAdded {
        master: InteractableId,
        dependent: InteractableId,
    },
    DependencyRemoved {
        master: InteractableId,
        dependent: InteractableId,
    },
    WeightChanged {
        id: InteractableId,
        weight: i32,
    },
    CollisionTargetAdded {
        id: InteractableId,
        target: CollisionHandle,
    },
    CollisionTargetRemoved {
        id: InteractableId,
        target: CollisionHandle,
    },
    HighlightTargetAdded {
        id: InteractableId,
        target: HighlightHandle,
    },
    HighlightTargetRemoved {
        id: InteractableId,
        target: HighlightHandle,
    },
    IgnoredClassAdded {
        id: InteractableId,
        class: TypeTag,
    },
    IgnoredClassRemoved {
        id: InteractableId,
        class: TypeTag,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    StateChanged,
    InteractorFound,
    InteractorLost,
    InteractorOverlapped,
    InteractorStopOverlap,
    InteractorTraced,
    InteractableSelected,
    InteractionStarted,
    InteractionStopped,
    InteractionCompleted,
    InteractionCycleCompleted,
    InteractionCanceled,
    LifecycleCompleted,
    CooldownCompleted,
    DependencyAdded,
    DependencyRemoved,
    WeightChanged,
    CollisionTargetAdded,
    CollisionTargetRemoved,
    HighlightTargetAdded,
    HighlightTargetRemoved,
    IgnoredClassAdded,
    IgnoredClassRemoved,
}

impl InteractionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::StateChanged { .. } => EventKind::StateChanged,
            Self::InteractorFound { .. } => EventKind::InteractorFound,
            Self::InteractorLost { .. } => EventKind::InteractorLost,
            Self::InteractorOverlapped { .. } => EventKind::InteractorOverlapped,
            Self::InteractorStopOverlap { .. } => EventKind::InteractorStopOverlap,
            Self::InteractorTraced { .. } => EventKind::InteractorTraced,
            Self::InteractableSelected { .. } => EventKind::InteractableSelected,
            Self::InteractionStarted { .. } => EventKind::InteractionStarted,
            Self::InteractionStopped { .. } => EventKind::InteractionStopped,
            Self::InteractionCompleted { .. } => EventKind::InteractionCompleted,
            Self::InteractionCycleCompleted { .. } => EventKind::InteractionCycleCompleted,
            Self::InteractionCanceled { .. } => EventKind::InteractionCanceled,
            Self::LifecycleCompleted { .. } => EventKind::LifecycleCompleted,
            Self::CooldownCompleted { .. } => EventKind::CooldownCompleted,
            Self::DependencyAdded { .. } => EventKind::DependencyAdded,
            Self::DependencyRemoved { .. } => EventKind::DependencyRemoved,
            Self::WeightChanged { .. } => EventKind::WeightChanged,
            Self::CollisionTargetAdded { .. } => EventKind::CollisionTargetAdded,
            Self::CollisionTargetRemoved { .. } => EventKind::CollisionTargetRemoved,
            Self::HighlightTargetAdded { .. } => EventKind::HighlightTargetAdded,
            Self::HighlightTargetRemoved { .. } => EventKind::HighlightTargetRemoved,
            Self::IgnoredClassAdded { .. } => EventKind::IgnoredClassAdded,
            Self::IgnoredClassRemoved { .. } => EventKind::IgnoredClassRemoved,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCounts {
    total: u32,
    by_kind: BTreeMap<EventKind, u32>,
}

impl EventCounts {
    pub fn record(&mut self, kind: EventKind) {
        self.total = self.total.saturating_add(1);
        let slot = self.by_kind.entry(kind).or_insert(0);
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn count(&self, kind: EventKind) -> u32 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventObserverHandle(u64);

type ObserverFn = Box<dyn Fn(&InteractionEvent)>;

struct ObserverEntry {
    handle: EventObserverHandle,
    filter: Option<EventKind>,
    callback: ObserverFn,
}

/// Observer lists with synchronous fan-out: every emission calls each
/// matching observer once, in registration order, on the calling thread.
/// No queuing, no delivery guarantees beyond that.
#[derive(Default)]
pub struct EventChannels {
    next_handle: u64,
    observers: Vec<ObserverEntry>,
    counts: EventCounts,
}

impl EventChannels {
    pub fn subscribe(&mut self, callback: impl Fn(&InteractionEvent) + 'static) -> EventObserverHandle {
        self.subscribe_entry(None, Box::new(callback))
    }

    pub fn subscribe_kind(
        &mut self,
        kind: EventKind,
        callback: impl Fn(&InteractionEvent) + 'static,
    ) -> EventObserverHandle {
        self.subscribe_entry(Some(kind), Box::new(callback))
    }

    fn subscribe_entry(
        &mut self,
        filter: Option<EventKind>,
        callback: ObserverFn,
    ) -> EventObserverHandle {
        let handle = EventObserverHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.observers.push(ObserverEntry {
            handle,
            filter,
            callback,
        });
        handle
    }

    pub fn unsubscribe(&mut self, handle: EventObserverHandle) -> bool {
        let before = self.observers.len();
        self.observers.retain(|entry| entry.handle != handle);
        before != self.observers.len()
    }

    pub fn emit(&mut self, event: &InteractionEvent) {
        let kind = event.kind();
        self.counts.record(kind);
        for entry in &self.observers {
            if entry.filter.map_or(true, |filter| filter == kind) {
                (entry.callback)(event);
            }
        }
    }

    pub fn counts(&self) -> &EventCounts {
        &self.counts
    }
}

impl std::fmt::Debug for EventChannels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannels")
            .field("observer_count", &self.observers.len())
            .field("counts", &self.counts)
            .finish()
    }
}
