use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::machine::{
    transition_plan, EventChannels, EventCounts, EventKind, EventObserverHandle, InteractableState,
    InteractionEvent, TimerService, TransitionEffect, TransitionPlan,
};
use crate::scene::interactable::INFINITE_LIFECYCLE_COUNT;
use crate::scene::{
    CollisionHandle, HighlightHandle, IdAllocator, Interactable, InteractableConfig,
    InteractableId, InteractionKey, Interactor, InteractorConfig, InteractorId, LifecycleMode,
    NullBinder, SceneBinder, TypeTag,
};

const MIN_PROGRESS_EXPIRATION_SECONDS: f32 = 0.01;

#[derive(Debug, Clone)]
enum TimerTask {
    InteractionProgress {
        id: InteractableId,
    },
    ProgressExpiration {
        id: InteractableId,
        key: InteractionKey,
        causer: Option<InteractorId>,
    },
    Cooldown {
        id: InteractableId,
    },
}

/// Registry world owning every interactable and interactor, the cooperative
/// timer service and the event channels. All mutation happens here, on the
/// caller's thread, in response to discrete events: overlap, trace, timer
/// firing from [`advance`], or an explicit operation call.
///
/// [`advance`]: InteractionWorld::advance
pub struct InteractionWorld {
    interactable_ids: IdAllocator,
    interactor_ids: IdAllocator,
    interactables: BTreeMap<InteractableId, Interactable>,
    interactors: BTreeMap<InteractorId, Interactor>,
    timers: TimerService<TimerTask>,
    events: EventChannels,
    binder: Box<dyn SceneBinder>,
    // Masters currently mid-propagation; keeps cyclic graphs terminating.
    propagating: Vec<InteractableId>,
    clock_seconds: f32,
}

impl Default for InteractionWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionWorld {
    pub fn new() -> Self {
        Self::with_binder(Box::new(NullBinder))
    }

    pub fn with_binder(binder: Box<dyn SceneBinder>) -> Self {
        Self {
            interactable_ids: IdAllocator::default(),
            interactor_ids: IdAllocator::default(),
            interactables: BTreeMap::new(),
            interactors: BTreeMap::new(),
            timers: TimerService::new(),
            events: EventChannels::default(),
            binder,
            propagating: Vec::new(),
            clock_seconds: 0.0,
        }
    }

    pub fn clock_seconds(&self) -> f32 {
        self.clock_seconds
    }

    pub fn subscribe(
        &mut self,
        callback: impl Fn(&InteractionEvent) + 'static,
    ) -> EventObserverHandle {
        self.events.subscribe(callback)
    }

    pub fn subscribe_kind(
        &mut self,
        kind: EventKind,
        callback: impl Fn(&InteractionEvent) + 'static,
    ) -> EventObserverHandle {
        self.events.subscribe_kind(kind, callback)
    }

    pub fn unsubscribe(&mut self, handle: EventObserverHandle) -> bool {
        self.events.unsubscribe(handle)
    }

    pub fn event_counts(&self) -> &EventCounts {
        self.events.counts()
    }

    // ---- spawning ----------------------------------------------------------

    pub fn spawn_interactable(&mut self, config: InteractableConfig) -> InteractableId {
        let id = InteractableId(self.interactable_ids.allocate());
        let collision_targets = config.collision_targets.clone();
        let highlight_targets = config.highlight_targets.clone();

        let item = Interactable::from_config(id, config);
        let default_state = item.default_state();
        self.interactables.insert(id, item);

        for target in collision_targets {
            self.add_collision_target(id, target);
        }
        for target in highlight_targets {
            self.add_highlight_target(id, target);
        }

        self.set_state(id, default_state);
        debug!(id = %id, "interactable_spawned");
        id
    }

    pub fn despawn_interactable(&mut self, id: InteractableId) -> bool {
        if !self.interactables.contains_key(&id) {
            return false;
        }

        self.cancel_all_timers(id);

        // Release dependents as if the master completed.
        let dependents = self
            .interactables
            .get(&id)
            .map(|item| item.dependents.clone())
            .unwrap_or_default();
        for dependent in dependents {
            self.restore_dependent_weight(dependent);
            if let Some(target) = self
                .interactables
                .get(&dependent)
                .map(|item| item.default_state())
            {
                self.set_state(dependent, target);
            }
            self.remove_dependency_edge(id, dependent);
        }

        // Drop edges where this object was the dependent.
        let masters: Vec<InteractableId> = self
            .interactables
            .iter()
            .filter(|(_, master)| master.dependents.contains(&id))
            .map(|(master_id, _)| *master_id)
            .collect();
        for master in masters {
            self.remove_dependency_edge(master, id);
        }

        for interactor in self.interactors.values_mut() {
            interactor.remove_candidate(id);
        }

        self.interactables.remove(&id);
        debug!(id = %id, "interactable_despawned");
        true
    }

    pub fn spawn_interactor(&mut self, config: InteractorConfig) -> InteractorId {
        let id = InteractorId(self.interactor_ids.allocate());
        self.interactors.insert(id, Interactor::from_config(id, config));
        debug!(id = %id, "interactor_spawned");
        id
    }

    pub fn despawn_interactor(&mut self, id: InteractorId) -> bool {
        if !self.interactors.contains_key(&id) {
            return false;
        }

        self.release_bound_interactables(id);
        self.interactors.remove(&id);
        debug!(id = %id, "interactor_despawned");
        true
    }

    pub fn interactable(&self, id: InteractableId) -> Option<&Interactable> {
        self.interactables.get(&id)
    }

    /// Mutable access for direct configuration; the setters on
    /// [`Interactable`] clamp their inputs themselves.
    pub fn interactable_mut(&mut self, id: InteractableId) -> Option<&mut Interactable> {
        self.interactables.get_mut(&id)
    }

    pub fn interactor(&self, id: InteractorId) -> Option<&Interactor> {
        self.interactors.get(&id)
    }

    // ---- the state machine -------------------------------------------------

    /// Requests a transition. Illegal requests are silent no-ops; every
    /// attempt, accepted or not, re-runs dependency propagation, because a
    /// dependency may have changed this object's effective weight.
    pub fn set_state(&mut self, id: InteractableId, requested: InteractableState) {
        let Some(current) = self.interactables.get(&id).map(Interactable::state) else {
            debug!(id = %id, "set_state_on_unknown_interactable");
            return;
        };

        match transition_plan(current, requested) {
            TransitionPlan::Rejected => {}
            TransitionPlan::Apply(effects) => self.apply_effects(id, requested, effects),
        }

        self.propagate_dependencies(id);
    }

    fn apply_effects(
        &mut self,
        id: InteractableId,
        requested: InteractableState,
        effects: &[TransitionEffect],
    ) {
        for effect in effects {
            match effect {
                TransitionEffect::Commit => {
                    if let Some(item) = self.interactables.get_mut(&id) {
                        item.commit_state(requested);
                    }
                }
                TransitionEffect::EmitStateChanged => {
                    if let Some(state) = self.interactables.get(&id).map(Interactable::state) {
                        self.events
                            .emit(&InteractionEvent::StateChanged { id, state });
                    }
                }
                TransitionEffect::BindCollisionTargets => {
                    let targets = self
                        .interactables
                        .get(&id)
                        .map(|item| item.collision_targets.clone())
                        .unwrap_or_default();
                    for target in targets {
                        self.binder.bind_collision(target);
                    }
                }
                TransitionEffect::UnbindCollisionTargets => {
                    let targets = self
                        .interactables
                        .get(&id)
                        .map(|item| item.collision_targets.clone())
                        .unwrap_or_default();
                    for target in targets {
                        self.binder.unbind_collision(target);
                    }
                }
                TransitionEffect::StopHighlight => self.stop_highlight(id),
                TransitionEffect::CancelAllTimers => self.cancel_all_timers(id),
                TransitionEffect::EmitInteractorLost => {
                    let bound = self
                        .interactables
                        .get_mut(&id)
                        .and_then(|item| item.interactor.take());
                    if let Some(interactor_id) = bound {
                        if let Some(interactor) = self.interactors.get_mut(&interactor_id) {
                            interactor.remove_candidate(id);
                        }
                    }
                    self.events.emit(&InteractionEvent::InteractorLost {
                        id,
                        interactor: bound,
                    });
                }
                TransitionEffect::EmitCanceled => {
                    self.events
                        .emit(&InteractionEvent::InteractionCanceled { id });
                }
                TransitionEffect::CancelCooldownTimer => {
                    if let Some(handle) = self
                        .interactables
                        .get_mut(&id)
                        .and_then(|item| item.timer_cooldown.take())
                    {
                        self.timers.cancel(handle);
                    }
                }
            }
        }
    }

    fn start_highlight(&mut self, id: InteractableId) {
        let targets = self
            .interactables
            .get(&id)
            .map(|item| item.highlight_targets.clone())
            .unwrap_or_default();
        for target in targets {
            self.binder.bind_highlight(target);
        }
    }

    fn stop_highlight(&mut self, id: InteractableId) {
        let targets = self
            .interactables
            .get(&id)
            .map(|item| item.highlight_targets.clone())
            .unwrap_or_default();
        for target in targets {
            self.binder.unbind_highlight(target);
        }
    }

    fn cancel_all_timers(&mut self, id: InteractableId) {
        let handles = self
            .interactables
            .get_mut(&id)
            .map(Interactable::take_timer_handles)
            .unwrap_or([None, None, None]);
        for handle in handles.into_iter().flatten() {
            self.timers.cancel(handle);
        }
    }

    // ---- dependency propagation --------------------------------------------

    fn propagate_dependencies(&mut self, master_id: InteractableId) {
        if self.propagating.contains(&master_id) {
            return;
        }
        let Some(master) = self.interactables.get(&master_id) else {
            return;
        };
        if master.dependents.is_empty() {
            return;
        }

        let master_state = master.state();
        let master_weight = master.weight();
        let dependents = master.dependents.clone();

        self.propagating.push(master_id);
        match master_state {
            InteractableState::Active | InteractableState::Suppressed => {
                for dependent in dependents {
                    self.apply_dependency_weight(dependent, master_weight);
                    let blocked = self
                        .interactables
                        .get(&dependent)
                        .map(Interactable::state)
                        .map_or(false, |state| {
                            matches!(
                                state,
                                InteractableState::Active
                                    | InteractableState::Awake
                                    | InteractableState::Asleep
                                    | InteractableState::Cooldown
                            )
                        });
                    if blocked {
                        self.set_state(dependent, InteractableState::Suppressed);
                    }
                }
            }
            InteractableState::Cooldown
            | InteractableState::Awake
            | InteractableState::Asleep => {
                for dependent in dependents {
                    self.apply_dependency_weight(dependent, master_weight);
                    if let Some(item) = self.interactables.get(&dependent) {
                        if matches!(
                            item.state(),
                            InteractableState::Awake
                                | InteractableState::Asleep
                                | InteractableState::Suppressed
                        ) {
                            let target = item.default_state();
                            self.set_state(dependent, target);
                        }
                    }
                }
            }
            InteractableState::Disabled | InteractableState::Completed => {
                // A finished master permanently releases its dependents.
                for dependent in dependents {
                    self.restore_dependent_weight(dependent);
                    if let Some(target) = self
                        .interactables
                        .get(&dependent)
                        .map(|item| item.default_state())
                    {
                        self.set_state(dependent, target);
                    }
                    self.remove_dependency_edge(master_id, dependent);
                }
            }
            InteractableState::Paused | InteractableState::Default => {}
        }
        self.propagating.pop();
    }

    /// Registers `dependent` under `master`: the public `add_dependency`
    /// surface is expressed from the dependent's point of view.
    pub fn add_dependency(&mut self, dependent: InteractableId, master: InteractableId) -> bool {
        if dependent == master {
            return false;
        }
        if !self.interactables.contains_key(&dependent)
            || !self.interactables.contains_key(&master)
        {
            debug!(dependent = %dependent, master = %master, "add_dependency_on_unknown_id");
            return false;
        }
        let already_linked = self
            .interactables
            .get(&master)
            .map_or(false, |item| item.dependents.contains(&dependent));
        if already_linked {
            return false;
        }

        self.events
            .emit(&InteractionEvent::DependencyAdded { master, dependent });
        if let Some(item) = self.interactables.get_mut(&master) {
            item.dependents.push(dependent);
        }
        let master_weight = self
            .interactables
            .get(&master)
            .map(Interactable::weight)
            .unwrap_or(0);
        self.apply_dependency_weight(dependent, master_weight);
        true
    }

    pub fn remove_dependency(&mut self, dependent: InteractableId, master: InteractableId) -> bool {
        let linked = self
            .interactables
            .get(&master)
            .map_or(false, |item| item.dependents.contains(&dependent));
        if !linked {
            return false;
        }
        self.remove_dependency_edge(master, dependent);
        true
    }

    fn remove_dependency_edge(&mut self, master: InteractableId, dependent: InteractableId) {
        if let Some(item) = self.interactables.get_mut(&master) {
            item.dependents.retain(|entry| *entry != dependent);
        }
        self.events
            .emit(&InteractionEvent::DependencyRemoved { master, dependent });
        self.restore_dependent_weight(dependent);
    }

    // Dependents rank below their master for selection tie-breaks.
    fn apply_dependency_weight(&mut self, dependent: InteractableId, master_weight: i32) {
        if let Some(item) = self.interactables.get_mut(&dependent) {
            let lowered = item.weight().min(master_weight - 1);
            if lowered != item.weight() {
                item.lower_weight(lowered);
                self.events.emit(&InteractionEvent::WeightChanged {
                    id: dependent,
                    weight: lowered,
                });
            }
        }
    }

    fn restore_dependent_weight(&mut self, dependent: InteractableId) {
        if let Some(item) = self.interactables.get_mut(&dependent) {
            if item.weight() != item.cached_weight() {
                let restored = item.cached_weight();
                item.lower_weight(restored);
                self.events.emit(&InteractionEvent::WeightChanged {
                    id: dependent,
                    weight: restored,
                });
            }
        }
    }

    // ---- action operations -------------------------------------------------

    pub fn activate(&mut self, id: InteractableId) -> (bool, String) {
        let Some(previous) = self.interactables.get(&id).map(Interactable::state) else {
            return (false, format!("{id} is not registered in this world"));
        };
        self.set_state(id, InteractableState::Active);
        match previous {
            InteractableState::Active => (false, "interactable is already active".to_string()),
            InteractableState::Awake => (true, "interactable has been activated".to_string()),
            InteractableState::Asleep
            | InteractableState::Suppressed
            | InteractableState::Cooldown
            | InteractableState::Completed
            | InteractableState::Disabled => (
                false,
                format!(
                    "interactable cannot be activated from {}",
                    previous.as_token()
                ),
            ),
            InteractableState::Paused | InteractableState::Default => (
                false,
                "interactable cannot process the activation request, invalid state".to_string(),
            ),
        }
    }

    pub fn wake_up(&mut self, id: InteractableId) -> (bool, String) {
        let Some(previous) = self.interactables.get(&id).map(Interactable::state) else {
            return (false, format!("{id} is not registered in this world"));
        };
        self.set_state(id, InteractableState::Awake);
        match previous {
            InteractableState::Awake => (false, "interactable is already awake".to_string()),
            InteractableState::Active
            | InteractableState::Asleep
            | InteractableState::Suppressed
            | InteractableState::Cooldown
            | InteractableState::Disabled => {
                (true, "interactable has been awoken".to_string())
            }
            InteractableState::Completed => {
                (false, "interactable cannot be awoken once completed".to_string())
            }
            InteractableState::Paused | InteractableState::Default => (
                false,
                "interactable cannot process the wake-up request, invalid state".to_string(),
            ),
        }
    }

    pub fn complete(&mut self, id: InteractableId) -> (bool, String) {
        let Some(previous) = self.interactables.get(&id).map(Interactable::state) else {
            return (false, format!("{id} is not registered in this world"));
        };
        self.set_state(id, InteractableState::Completed);
        match previous {
            InteractableState::Active => (true, "interactable has been completed".to_string()),
            InteractableState::Completed => {
                (false, "interactable is already completed".to_string())
            }
            InteractableState::Awake
            | InteractableState::Asleep
            | InteractableState::Suppressed
            | InteractableState::Cooldown
            | InteractableState::Disabled => (
                false,
                format!(
                    "interactable cannot be completed from {}",
                    previous.as_token()
                ),
            ),
            InteractableState::Paused | InteractableState::Default => (
                false,
                "interactable cannot process the completion request, invalid state".to_string(),
            ),
        }
    }

    /// Deprecated rest request: delegates to [`deactivate`]. The asleep state
    /// itself stays reachable through the transition table.
    ///
    /// [`deactivate`]: InteractionWorld::deactivate
    pub fn snooze(&mut self, id: InteractableId) -> (bool, String) {
        if !self.interactables.contains_key(&id) {
            return (false, format!("{id} is not registered in this world"));
        }
        self.deactivate(id);
        (
            true,
            "interactable has been deactivated; the asleep state is deprecated".to_string(),
        )
    }

    pub fn deactivate(&mut self, id: InteractableId) {
        self.set_state(id, InteractableState::Disabled);
    }

    // ---- pausing and timers ------------------------------------------------

    /// Holds a running interaction: the player let go of the key but has not
    /// moved away. With an unlimited interaction period the progress timer is
    /// merely suspended; otherwise an expiration task decides later whether
    /// the hold counts as a resume or a cancellation.
    pub fn pause_interaction(
        &mut self,
        id: InteractableId,
        expiration_seconds: f32,
        key: InteractionKey,
        causer: Option<InteractorId>,
    ) {
        if !self.interactables.contains_key(&id) {
            debug!(id = %id, "pause_on_unknown_interactable");
            return;
        }

        self.set_state(id, InteractableState::Paused);

        let unlimited = self
            .interactables
            .get(&id)
            .map_or(true, Interactable::has_unlimited_period);
        if unlimited {
            self.suspend_progress_timer(id);
            return;
        }

        // Re-pausing resets the pending expiration; exactly one is live.
        if let Some(handle) = self
            .interactables
            .get_mut(&id)
            .and_then(|item| item.timer_expiration.take())
        {
            self.timers.cancel(handle);
        }

        let delay = expiration_seconds.max(MIN_PROGRESS_EXPIRATION_SECONDS);
        let handle = self
            .timers
            .schedule(delay, false, TimerTask::ProgressExpiration { id, key, causer });
        if let Some(item) = self.interactables.get_mut(&id) {
            item.timer_expiration = Some(handle);
        }
        self.suspend_progress_timer(id);
    }

    fn suspend_progress_timer(&mut self, id: InteractableId) {
        if let Some(handle) = self
            .interactables
            .get(&id)
            .and_then(|item| item.timer_interaction)
        {
            self.timers.pause(handle);
        }
    }

    pub fn start_interaction(&mut self, id: InteractableId, key: InteractionKey) -> bool {
        if !self.can_interact(id) {
            return false;
        }

        if let Some(handle) = self
            .interactables
            .get_mut(&id)
            .and_then(|item| item.timer_expiration.take())
        {
            self.timers.cancel(handle);
        }

        self.set_state(id, InteractableState::Active);
        self.events.emit(&InteractionEvent::InteractionStarted {
            id,
            time_seconds: self.clock_seconds,
            key,
        });

        let (unlimited, period, existing) = match self.interactables.get(&id) {
            Some(item) => (
                item.has_unlimited_period(),
                item.interaction_period_seconds(),
                item.timer_interaction,
            ),
            None => return true,
        };
        if !unlimited {
            match existing {
                Some(handle) => {
                    self.timers.resume(handle);
                }
                None => {
                    let handle =
                        self.timers
                            .schedule(period, false, TimerTask::InteractionProgress { id });
                    if let Some(item) = self.interactables.get_mut(&id) {
                        item.timer_interaction = Some(handle);
                    }
                }
            }
        }
        true
    }

    pub fn stop_interaction(
        &mut self,
        id: InteractableId,
        expiration_seconds: f32,
        key: InteractionKey,
        causer: Option<InteractorId>,
    ) {
        self.pause_interaction(id, expiration_seconds, key, causer);
    }

    /// Ends an active cycle under Cycled lifecycle. Returns false when no
    /// cooldown applies (lifecycle exhausted), in which case the caller
    /// proceeds to normal completion.
    pub fn trigger_cooldown(&mut self, id: InteractableId) -> bool {
        let Some(item) = self.interactables.get_mut(&id) else {
            return false;
        };

        if item.lifecycle_count() != INFINITE_LIFECYCLE_COUNT {
            let remaining = (item.remaining_lifecycle_count() - 1).max(0);
            item.set_remaining_lifecycle_count(remaining);
        }
        if item.remaining_lifecycle_count() == 0 {
            return false;
        }

        let cooldown = item.cooldown_period_seconds();
        self.set_state(id, InteractableState::Cooldown);

        if let Some(handle) = self
            .interactables
            .get_mut(&id)
            .and_then(|item| item.timer_cooldown.take())
        {
            self.timers.cancel(handle);
        }
        let handle = self
            .timers
            .schedule(cooldown, false, TimerTask::Cooldown { id });
        if let Some(item) = self.interactables.get_mut(&id) {
            item.timer_cooldown = Some(handle);
        }

        // Mid-cooldown the object cannot be re-triggered.
        let targets = self
            .interactables
            .get(&id)
            .map(|item| item.collision_targets.clone())
            .unwrap_or_default();
        for target in targets {
            self.binder.unbind_collision(target);
        }

        let remaining = self
            .interactables
            .get(&id)
            .map(Interactable::remaining_lifecycle_count)
            .unwrap_or(0);
        self.events.emit(&InteractionEvent::InteractionCycleCompleted {
            id,
            time_seconds: self.clock_seconds,
            remaining_lifecycles: remaining,
        });
        true
    }

    /// Drives the cooperative clock. Due timer tasks fire here, serialized
    /// with everything else.
    pub fn advance(&mut self, dt_seconds: f32) {
        self.clock_seconds += dt_seconds;
        for (_, task) in self.timers.advance(dt_seconds) {
            match task {
                TimerTask::InteractionProgress { id } => self.handle_interaction_elapsed(id),
                TimerTask::ProgressExpiration { id, key, causer } => {
                    self.handle_progress_expired(id, key, causer)
                }
                TimerTask::Cooldown { id } => self.handle_cooldown_elapsed(id),
            }
        }
    }

    fn handle_interaction_elapsed(&mut self, id: InteractableId) {
        let Some(item) = self.interactables.get_mut(&id) else {
            return;
        };
        item.timer_interaction = None;
        let mode = item.lifecycle_mode();

        if mode == LifecycleMode::Cycled && self.trigger_cooldown(id) {
            return;
        }

        let (ok, message) = self.complete(id);
        if !ok {
            debug!(id = %id, message, "interaction_completion_rejected");
            return;
        }

        self.events.emit(&InteractionEvent::InteractionCompleted {
            id,
            time_seconds: self.clock_seconds,
        });

        let exhausted = self
            .interactables
            .get(&id)
            .map_or(false, |item| match item.lifecycle_mode() {
                LifecycleMode::OnlyOnce => true,
                LifecycleMode::Cycled => {
                    item.lifecycle_count() != INFINITE_LIFECYCLE_COUNT
                        && item.remaining_lifecycle_count() == 0
                }
            });
        if exhausted {
            self.events.emit(&InteractionEvent::LifecycleCompleted { id });
        }
    }

    fn handle_progress_expired(
        &mut self,
        id: InteractableId,
        key: InteractionKey,
        causer: Option<InteractorId>,
    ) {
        let Some(item) = self.interactables.get_mut(&id) else {
            return;
        };
        item.timer_expiration = None;
        if item.state() != InteractableState::Paused {
            return;
        }
        debug!(id = %id, key = %key.0, causer = ?causer, "interaction_grace_period_expired");

        if let Some(handle) = item.timer_interaction.take() {
            self.timers.cancel(handle);
        }

        if self.is_active_selection(id) {
            self.set_state(id, InteractableState::Active);
            let (unlimited, period) = match self.interactables.get(&id) {
                Some(item) => (item.has_unlimited_period(), item.interaction_period_seconds()),
                None => return,
            };
            if !unlimited {
                let handle = self
                    .timers
                    .schedule(period, false, TimerTask::InteractionProgress { id });
                if let Some(item) = self.interactables.get_mut(&id) {
                    item.timer_interaction = Some(handle);
                }
            }
        } else {
            self.events.emit(&InteractionEvent::InteractionStopped {
                id,
                time_seconds: self.clock_seconds,
            });
        }
    }

    fn handle_cooldown_elapsed(&mut self, id: InteractableId) {
        let Some(item) = self.interactables.get_mut(&id) else {
            return;
        };
        item.timer_cooldown = None;

        let targets = item.collision_targets.clone();
        for target in targets {
            self.binder.bind_collision(target);
        }
        self.events.emit(&InteractionEvent::CooldownCompleted { id });

        let Some(default_state) = self
            .interactables
            .get(&id)
            .map(|item| item.default_state())
        else {
            return;
        };
        if self.is_active_selection(id) {
            self.start_highlight(id);
            self.set_state(id, default_state);
            self.set_state(id, InteractableState::Active);
        } else {
            self.stop_highlight(id);
            self.set_state(id, default_state);
        }
    }

    fn is_active_selection(&self, id: InteractableId) -> bool {
        self.interactables
            .get(&id)
            .and_then(|item| item.interactor)
            .and_then(|interactor_id| self.interactors.get(&interactor_id))
            .map_or(false, |interactor| {
                interactor.active_interactable == Some(id)
            })
    }

    // ---- trigger methods ---------------------------------------------------

    pub fn begin_overlap(&mut self, id: InteractableId, interactor_id: InteractorId) -> bool {
        if !self.can_be_triggered(id) || self.is_interacting(id) {
            return false;
        }
        if !self.interactor_qualifies(id, interactor_id) {
            return false;
        }

        self.bind_interactor(id, interactor_id);
        self.events.emit(&InteractionEvent::InteractorOverlapped {
            id,
            interactor: interactor_id,
        });
        true
    }

    pub fn end_overlap(&mut self, id: InteractableId, interactor_id: InteractorId) -> bool {
        let bound = self
            .interactables
            .get(&id)
            .map_or(false, |item| item.interactor == Some(interactor_id));
        if !bound {
            return false;
        }

        self.lose_interactor(id);
        self.events.emit(&InteractionEvent::InteractorStopOverlap {
            id,
            interactor: interactor_id,
        });
        true
    }

    pub fn traced(&mut self, id: InteractableId, interactor_id: InteractorId) -> bool {
        if !self.can_be_triggered(id) {
            return false;
        }
        if !self.interactor_qualifies(id, interactor_id) {
            return false;
        }

        self.bind_interactor(id, interactor_id);
        self.events.emit(&InteractionEvent::InteractorTraced {
            id,
            interactor: interactor_id,
        });
        true
    }

    fn interactor_qualifies(&self, id: InteractableId, interactor_id: InteractorId) -> bool {
        let Some(item) = self.interactables.get(&id) else {
            return false;
        };
        let Some(interactor) = self.interactors.get(&interactor_id) else {
            debug!(interactor = %interactor_id, "trigger_from_unknown_interactor");
            return false;
        };
        if item.ignored_classes.contains(interactor.type_tag()) {
            return false;
        }
        if !interactor.can_interact() {
            return false;
        }
        interactor.response_channel() == item.collision_channel()
    }

    fn bind_interactor(&mut self, id: InteractableId, interactor_id: InteractorId) {
        if let Some(item) = self.interactables.get_mut(&id) {
            item.interactor = Some(interactor_id);
        }
        if let Some(interactor) = self.interactors.get_mut(&interactor_id) {
            interactor.add_candidate(id);
        }
        self.events.emit(&InteractionEvent::InteractorFound {
            id,
            interactor: interactor_id,
        });
    }

    fn lose_interactor(&mut self, id: InteractableId) {
        let Some(item) = self.interactables.get_mut(&id) else {
            return;
        };
        let Some(interactor_id) = item.interactor else {
            return;
        };

        let handles = [item.timer_interaction.take(), item.timer_expiration.take()];
        for handle in handles.into_iter().flatten() {
            self.timers.cancel(handle);
        }

        let state = item.state();
        let default_state = item.default_state();
        match state {
            InteractableState::Active
            | InteractableState::Awake
            | InteractableState::Paused
            | InteractableState::Asleep
            | InteractableState::Suppressed => self.set_state(id, default_state),
            // A running cooldown keeps running; terminal states are unaffected.
            InteractableState::Cooldown
            | InteractableState::Completed
            | InteractableState::Disabled
            | InteractableState::Default => {}
        }

        if let Some(item) = self.interactables.get_mut(&id) {
            item.interactor = None;
        }
        if let Some(interactor) = self.interactors.get_mut(&interactor_id) {
            interactor.remove_candidate(id);
        }

        self.events.emit(&InteractionEvent::InteractorLost {
            id,
            interactor: Some(interactor_id),
        });
        self.events
            .emit(&InteractionEvent::InteractionCanceled { id });
    }

    // ---- selection protocol ------------------------------------------------

    /// The external best-candidate decision: the chosen candidate highlights
    /// and goes Active; every other candidate is canceled back to its default
    /// state.
    pub fn select_active(&mut self, interactor_id: InteractorId, choice: Option<InteractableId>) {
        let Some(interactor) = self.interactors.get_mut(&interactor_id) else {
            debug!(interactor = %interactor_id, "select_on_unknown_interactor");
            return;
        };
        if let Some(target) = choice {
            if !interactor.candidates.contains(&target) {
                warn!(interactor = %interactor_id, target = %target, "selection_of_non_candidate");
                return;
            }
        }
        interactor.active_interactable = choice;
        let candidates = interactor.candidates.clone();

        for candidate in candidates {
            if Some(candidate) == choice {
                self.start_highlight(candidate);
                self.set_state(candidate, InteractableState::Active);
                self.events.emit(&InteractionEvent::InteractableSelected {
                    id: candidate,
                    interactor: interactor_id,
                });
            } else {
                self.events
                    .emit(&InteractionEvent::InteractionCanceled { id: candidate });
                if let Some(target) = self
                    .interactables
                    .get(&candidate)
                    .map(|item| item.default_state())
                {
                    self.set_state(candidate, target);
                }
            }
        }
    }

    /// Highest weight wins; ties go to the lowest id.
    pub fn select_best_candidate(&mut self, interactor_id: InteractorId) -> Option<InteractableId> {
        let interactor = self.interactors.get(&interactor_id)?;
        let best = interactor
            .candidates
            .iter()
            .copied()
            .max_by_key(|candidate| {
                let weight = self
                    .interactables
                    .get(candidate)
                    .map(Interactable::weight)
                    .unwrap_or(i32::MIN);
                (weight, std::cmp::Reverse(candidate.0))
            })?;
        self.select_active(interactor_id, Some(best));
        Some(best)
    }

    // ---- interactor input context ------------------------------------------

    /// Plain active-selection bookkeeping, without the candidate fan-out.
    /// Most drivers want [`select_active`].
    ///
    /// [`select_active`]: InteractionWorld::select_active
    pub fn set_active_interactable(
        &mut self,
        interactor_id: InteractorId,
        choice: Option<InteractableId>,
    ) {
        if let Some(interactor) = self.interactors.get_mut(&interactor_id) {
            interactor.active_interactable = choice;
        }
    }

    pub fn press_interaction_key(
        &mut self,
        interactor_id: InteractorId,
        key: &InteractionKey,
    ) -> bool {
        let Some(interactor) = self.interactors.get(&interactor_id) else {
            return false;
        };
        if !interactor.can_interact() || interactor.interaction_key() != key {
            return false;
        }
        let Some(active) = interactor.active_interactable else {
            return false;
        };
        self.start_interaction(active, key.clone())
    }

    pub fn release_interaction_key(
        &mut self,
        interactor_id: InteractorId,
        key: &InteractionKey,
        expiration_seconds: f32,
    ) -> bool {
        let Some(interactor) = self.interactors.get(&interactor_id) else {
            return false;
        };
        if interactor.interaction_key() != key {
            return false;
        }
        let Some(active) = interactor.active_interactable else {
            return false;
        };
        self.stop_interaction(active, expiration_seconds, key.clone(), Some(interactor_id));
        true
    }

    pub fn activate_interactor(&mut self, id: InteractorId) -> (bool, String) {
        match self.interactors.get_mut(&id) {
            Some(interactor) => interactor.activate(),
            None => (false, format!("{id} is not registered in this world")),
        }
    }

    pub fn wake_up_interactor(&mut self, id: InteractorId) -> (bool, String) {
        match self.interactors.get_mut(&id) {
            Some(interactor) => interactor.wake_up(),
            None => (false, format!("{id} is not registered in this world")),
        }
    }

    pub fn deactivate_interactor(&mut self, id: InteractorId) {
        self.release_bound_interactables(id);
        if let Some(interactor) = self.interactors.get_mut(&id) {
            interactor.deactivate();
        }
    }

    pub fn suppress_interactor(&mut self, id: InteractorId) {
        self.release_bound_interactables(id);
        if let Some(interactor) = self.interactors.get_mut(&id) {
            interactor.suppress();
        }
    }

    fn release_bound_interactables(&mut self, id: InteractorId) {
        let bound: Vec<InteractableId> = self
            .interactables
            .iter()
            .filter(|(_, item)| item.interactor == Some(id))
            .map(|(item_id, _)| *item_id)
            .collect();
        for item_id in bound {
            self.lose_interactor(item_id);
        }
    }

    // ---- target and class management ---------------------------------------

    pub fn add_collision_target(&mut self, id: InteractableId, target: CollisionHandle) -> bool {
        let Some(item) = self.interactables.get_mut(&id) else {
            return false;
        };
        if item.collision_targets.contains(&target) {
            return false;
        }
        item.collision_targets.push(target);
        self.binder.bind_collision(target);
        self.events
            .emit(&InteractionEvent::CollisionTargetAdded { id, target });
        true
    }

    pub fn remove_collision_target(&mut self, id: InteractableId, target: CollisionHandle) -> bool {
        let Some(item) = self.interactables.get_mut(&id) else {
            return false;
        };
        if !item.collision_targets.contains(&target) {
            return false;
        }
        item.collision_targets.retain(|entry| *entry != target);
        self.binder.unbind_collision(target);
        self.events
            .emit(&InteractionEvent::CollisionTargetRemoved { id, target });
        true
    }

    pub fn add_highlight_target(&mut self, id: InteractableId, target: HighlightHandle) -> bool {
        let Some(item) = self.interactables.get_mut(&id) else {
            return false;
        };
        if item.highlight_targets.contains(&target) {
            return false;
        }
        item.highlight_targets.push(target);
        self.binder.bind_highlight(target);
        self.events
            .emit(&InteractionEvent::HighlightTargetAdded { id, target });
        true
    }

    pub fn remove_highlight_target(&mut self, id: InteractableId, target: HighlightHandle) -> bool {
        let Some(item) = self.interactables.get_mut(&id) else {
            return false;
        };
        if !item.highlight_targets.contains(&target) {
            return false;
        }
        item.highlight_targets.retain(|entry| *entry != target);
        self.binder.unbind_highlight(target);
        self.events
            .emit(&InteractionEvent::HighlightTargetRemoved { id, target });
        true
    }

    pub fn add_ignored_class(&mut self, id: InteractableId, class: TypeTag) -> bool {
        let Some(item) = self.interactables.get_mut(&id) else {
            return false;
        };
        if item.ignored_classes.contains(&class) {
            return false;
        }
        item.ignored_classes.push(class.clone());
        self.events
            .emit(&InteractionEvent::IgnoredClassAdded { id, class });
        true
    }

    pub fn remove_ignored_class(&mut self, id: InteractableId, class: &TypeTag) -> bool {
        let Some(item) = self.interactables.get_mut(&id) else {
            return false;
        };
        if !item.ignored_classes.contains(class) {
            return false;
        }
        item.ignored_classes.retain(|entry| entry != class);
        self.events.emit(&InteractionEvent::IgnoredClassRemoved {
            id,
            class: class.clone(),
        });
        true
    }

    // ---- configuration passthrough -----------------------------------------

    pub fn set_weight(&mut self, id: InteractableId, weight: i32) {
        if let Some(item) = self.interactables.get_mut(&id) {
            item.assign_weight(weight);
            self.events
                .emit(&InteractionEvent::WeightChanged { id, weight });
        }
    }

    pub fn set_default_state(&mut self, id: InteractableId, state: InteractableState) -> bool {
        self.interactables
            .get_mut(&id)
            .map_or(false, |item| item.set_default_state(state))
    }

    pub fn set_interaction_period(&mut self, id: InteractableId, period_seconds: f32) {
        if let Some(item) = self.interactables.get_mut(&id) {
            item.set_interaction_period(period_seconds);
        }
    }

    pub fn set_cooldown_period(&mut self, id: InteractableId, period_seconds: f32) {
        if let Some(item) = self.interactables.get_mut(&id) {
            item.set_cooldown_period(period_seconds);
        }
    }

    pub fn set_lifecycle_count(&mut self, id: InteractableId, count: i32) {
        if let Some(item) = self.interactables.get_mut(&id) {
            item.set_lifecycle_count(count);
        }
    }

    pub fn set_display_name(&mut self, id: InteractableId, name: impl Into<String>) -> bool {
        self.interactables
            .get_mut(&id)
            .map_or(false, |item| item.set_display_name(name))
    }

    // ---- queries -----------------------------------------------------------

    pub fn state(&self, id: InteractableId) -> Option<InteractableState> {
        self.interactables.get(&id).map(Interactable::state)
    }

    pub fn can_interact(&self, id: InteractableId) -> bool {
        self.interactables.get(&id).map_or(false, |item| {
            matches!(
                item.state(),
                InteractableState::Awake | InteractableState::Active | InteractableState::Paused
            ) && item.has_interactor()
        })
    }

    pub fn can_be_triggered(&self, id: InteractableId) -> bool {
        self.interactables.get(&id).map_or(false, |item| {
            matches!(
                item.state(),
                InteractableState::Awake | InteractableState::Active | InteractableState::Paused
            )
        })
    }

    pub fn is_interacting(&self, id: InteractableId) -> bool {
        self.interactables
            .get(&id)
            .and_then(|item| item.timer_interaction)
            .map_or(false, |handle| self.timers.is_active(handle))
    }

    /// Progress fraction for UI; -1 when the id is unknown, 0 without a
    /// running interaction or with an unlimited period.
    pub fn interaction_progress(&self, id: InteractableId) -> f32 {
        let Some(item) = self.interactables.get(&id) else {
            return -1.0;
        };
        let Some(handle) = item.timer_interaction else {
            return 0.0;
        };
        let elapsed = self.timers.elapsed(handle).unwrap_or(0.0);
        if item.interaction_period_seconds() > 0.0 {
            elapsed / item.interaction_period_seconds()
        } else {
            0.0
        }
    }

    pub fn pending_timer_count(&self) -> usize {
        self.timers.pending()
    }

    #[cfg(test)]
    pub(crate) fn force_state_for_tests(&mut self, id: InteractableId, state: InteractableState) {
        if let Some(item) = self.interactables.get_mut(&id) {
            item.commit_state(state);
        }
    }
}

impl std::fmt::Debug for InteractionWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionWorld")
            .field("interactable_count", &self.interactables.len())
            .field("interactor_count", &self.interactors.len())
            .field("pending_timers", &self.timers.pending())
            .field("clock_seconds", &self.clock_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::machine::ALL_STATES;
    use crate::scene::InteractorConfig;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum BinderCall {
        BindCollision(CollisionHandle),
        UnbindCollision(CollisionHandle),
        BindHighlight(HighlightHandle),
        UnbindHighlight(HighlightHandle),
    }

    #[derive(Default)]
    struct RecordingBinder {
        log: Rc<RefCell<Vec<BinderCall>>>,
    }

    impl SceneBinder for RecordingBinder {
        fn bind_collision(&mut self, target: CollisionHandle) {
            self.log.borrow_mut().push(BinderCall::BindCollision(target));
        }
        fn unbind_collision(&mut self, target: CollisionHandle) {
            self.log
                .borrow_mut()
                .push(BinderCall::UnbindCollision(target));
        }
        fn bind_highlight(&mut self, target: HighlightHandle) {
            self.log.borrow_mut().push(BinderCall::BindHighlight(target));
        }
        fn unbind_highlight(&mut self, target: HighlightHandle) {
            self.log
                .borrow_mut()
                .push(BinderCall::UnbindHighlight(target));
        }
    }

    fn basic_config() -> InteractableConfig {
        InteractableConfig::default()
    }

    fn cycled_config(lifecycle_count: i32) -> InteractableConfig {
        InteractableConfig {
            lifecycle_count,
            interaction_period_seconds: 1.0,
            cooldown_period_seconds: 2.0,
            collision_targets: vec![CollisionHandle(11)],
            highlight_targets: vec![HighlightHandle(21)],
            ..InteractableConfig::default()
        }
    }

    fn eager_interactor() -> InteractorConfig {
        InteractorConfig {
            auto_activate: true,
            ..InteractorConfig::default()
        }
    }

    fn wire_selection(world: &mut InteractionWorld, config: InteractableConfig) -> (InteractableId, InteractorId) {
        let id = world.spawn_interactable(config);
        let actor = world.spawn_interactor(eager_interactor());
        assert!(world.begin_overlap(id, actor));
        world.select_active(actor, Some(id));
        assert_eq!(world.state(id), Some(InteractableState::Active));
        (id, actor)
    }

    fn default_key() -> InteractionKey {
        InteractionKey::default()
    }

    #[test]
    fn repeated_transition_requests_are_idempotent() {
        for current in ALL_STATES {
            for requested in ALL_STATES {
                let mut world = InteractionWorld::new();
                let id = world.spawn_interactable(basic_config());
                world.force_state_for_tests(id, current);

                world.set_state(id, requested);
                let after_first = world.state(id);
                world.set_state(id, requested);
                assert_eq!(
                    world.state(id),
                    after_first,
                    "{} -> {} must settle after one application",
                    current.as_token(),
                    requested.as_token()
                );
            }
        }
    }

    #[test]
    fn three_cycle_lifecycle_ends_completed_with_cleanup() {
        let mut world = InteractionWorld::new();
        let id = world.spawn_interactable(cycled_config(3));
        let actor = world.spawn_interactor(eager_interactor());

        world.wake_up(id);
        assert_eq!(world.state(id), Some(InteractableState::Awake));

        assert!(world.begin_overlap(id, actor));
        world.select_active(actor, Some(id));
        assert_eq!(world.state(id), Some(InteractableState::Active));

        for expected_remaining in [2, 1] {
            assert!(world.press_interaction_key(actor, &default_key()));
            assert!(world.is_interacting(id));
            world.advance(1.0);
            assert_eq!(world.state(id), Some(InteractableState::Cooldown));
            assert_eq!(
                world
                    .interactable(id)
                    .expect("registered")
                    .remaining_lifecycle_count(),
                expected_remaining
            );

            world.advance(2.0);
            assert_eq!(
                world.state(id),
                Some(InteractableState::Active),
                "still the active selection, so cooldown resumes interaction"
            );
        }

        assert!(world.press_interaction_key(actor, &default_key()));
        world.advance(1.0);

        assert_eq!(world.state(id), Some(InteractableState::Completed));
        assert_eq!(
            world
                .interactable(id)
                .expect("registered")
                .remaining_lifecycle_count(),
            0
        );
        assert_eq!(world.pending_timer_count(), 0);

        let counts = world.event_counts();
        assert_eq!(counts.count(EventKind::InteractionCycleCompleted), 2);
        assert_eq!(counts.count(EventKind::InteractionCompleted), 1);
        assert_eq!(counts.count(EventKind::LifecycleCompleted), 1);
        assert!(counts.count(EventKind::InteractorLost) >= 1);
    }

    #[test]
    fn remaining_lifecycle_count_stays_within_bounds() {
        let mut world = InteractionWorld::new();
        let id = world.spawn_interactable(cycled_config(2));

        for _ in 0..5 {
            world.trigger_cooldown(id);
        }
        let item = world.interactable(id).expect("registered");
        assert_eq!(item.remaining_lifecycle_count(), 0);
        assert!(item.remaining_lifecycle_count() <= item.lifecycle_count());
    }

    #[test]
    fn active_master_suppresses_dependents_and_blocks_activation() {
        let mut world = InteractionWorld::new();
        let master = world.spawn_interactable(basic_config());
        let dependent = world.spawn_interactable(basic_config());
        assert!(world.add_dependency(dependent, master));

        let (ok, _) = world.activate(master);
        assert!(ok);
        assert_eq!(world.state(dependent), Some(InteractableState::Suppressed));

        let (ok, _) = world.activate(dependent);
        assert!(!ok);
        assert_eq!(world.state(dependent), Some(InteractableState::Suppressed));
    }

    #[test]
    fn rejected_master_attempts_still_repropagate() {
        let mut world = InteractionWorld::new();
        let master = world.spawn_interactable(basic_config());
        let dependent = world.spawn_interactable(basic_config());
        world.add_dependency(dependent, master);
        world.activate(master);
        assert_eq!(world.state(dependent), Some(InteractableState::Suppressed));

        // The dependent escapes through a legal edge...
        world.wake_up(dependent);
        assert_eq!(world.state(dependent), Some(InteractableState::Awake));

        // ...and a no-op request on the master pulls it back in.
        world.set_state(master, InteractableState::Active);
        assert_eq!(world.state(dependent), Some(InteractableState::Suppressed));
    }

    #[test]
    fn finished_master_releases_dependents_and_removes_edges() {
        let mut world = InteractionWorld::new();
        let master = world.spawn_interactable(basic_config());
        let first = world.spawn_interactable(basic_config());
        let second = world.spawn_interactable(basic_config());
        world.add_dependency(first, master);
        world.add_dependency(second, master);
        world.activate(master);
        assert_eq!(world.state(first), Some(InteractableState::Suppressed));

        world.deactivate(master);

        assert_eq!(world.state(master), Some(InteractableState::Disabled));
        assert_eq!(world.state(first), Some(InteractableState::Awake));
        assert_eq!(world.state(second), Some(InteractableState::Awake));
        assert!(world
            .interactable(master)
            .expect("registered")
            .dependents()
            .is_empty());
        assert_eq!(world.event_counts().count(EventKind::DependencyRemoved), 2);
    }

    #[test]
    fn suppression_chains_through_the_dependency_graph() {
        let mut world = InteractionWorld::new();
        let first = world.spawn_interactable(basic_config());
        let second = world.spawn_interactable(basic_config());
        let third = world.spawn_interactable(basic_config());
        world.add_dependency(second, first);
        world.add_dependency(third, second);

        world.activate(first);
        assert_eq!(world.state(second), Some(InteractableState::Suppressed));
        assert_eq!(world.state(third), Some(InteractableState::Suppressed));

        world.deactivate(first);
        assert_eq!(world.state(second), Some(InteractableState::Awake));
        assert_eq!(world.state(third), Some(InteractableState::Awake));
        assert!(world
            .interactable(first)
            .expect("registered")
            .dependents()
            .is_empty());
        assert_eq!(
            world.interactable(second).expect("registered").dependents(),
            &[third]
        );
    }

    #[test]
    fn dependency_weight_coupling_lowers_and_restores() {
        let mut world = InteractionWorld::new();
        let master = world.spawn_interactable(InteractableConfig {
            weight: 5,
            ..basic_config()
        });
        let dependent = world.spawn_interactable(InteractableConfig {
            weight: 5,
            ..basic_config()
        });

        assert!(world.add_dependency(dependent, master));
        assert_eq!(world.interactable(dependent).expect("registered").weight(), 4);

        assert!(world.remove_dependency(dependent, master));
        assert_eq!(world.interactable(dependent).expect("registered").weight(), 5);
    }

    #[test]
    fn pause_with_unlimited_period_schedules_no_expiration() {
        let mut world = InteractionWorld::new();
        let (id, _) = wire_selection(
            &mut world,
            InteractableConfig {
                interaction_period_seconds: -1.0,
                ..basic_config()
            },
        );

        assert!(world.start_interaction(id, default_key()));
        assert_eq!(world.pending_timer_count(), 0);

        world.pause_interaction(id, 5.0, default_key(), None);
        assert_eq!(world.state(id), Some(InteractableState::Paused));
        assert_eq!(world.pending_timer_count(), 0);
    }

    #[test]
    fn pause_with_finite_period_schedules_exactly_one_expiration() {
        let mut world = InteractionWorld::new();
        let (id, _) = wire_selection(
            &mut world,
            InteractableConfig {
                interaction_period_seconds: 1.0,
                ..basic_config()
            },
        );

        assert!(world.start_interaction(id, default_key()));
        assert_eq!(world.pending_timer_count(), 1);

        world.pause_interaction(id, 0.5, default_key(), None);
        assert_eq!(world.pending_timer_count(), 2);
        assert!(!world.is_interacting(id), "progress timer is suspended");

        // Re-pausing resets the expiration rather than stacking another.
        world.pause_interaction(id, 0.5, default_key(), None);
        assert_eq!(world.pending_timer_count(), 2);
    }

    #[test]
    fn expired_pause_resumes_when_still_the_active_selection() {
        let mut world = InteractionWorld::new();
        let (id, actor) = wire_selection(
            &mut world,
            InteractableConfig {
                interaction_period_seconds: 1.0,
                ..basic_config()
            },
        );

        assert!(world.press_interaction_key(actor, &default_key()));
        world.advance(0.4);
        assert!(world.release_interaction_key(actor, &default_key(), 0.5));
        assert_eq!(world.state(id), Some(InteractableState::Paused));

        world.advance(0.5);
        assert_eq!(world.state(id), Some(InteractableState::Active));
        assert!(world.is_interacting(id));
    }

    #[test]
    fn expired_pause_without_selection_emits_interaction_stopped() {
        let mut world = InteractionWorld::new();
        let (id, actor) = wire_selection(
            &mut world,
            InteractableConfig {
                interaction_period_seconds: 1.0,
                ..basic_config()
            },
        );

        assert!(world.press_interaction_key(actor, &default_key()));
        assert!(world.release_interaction_key(actor, &default_key(), 0.5));
        world.set_active_interactable(actor, None);

        world.advance(0.5);
        assert_eq!(world.state(id), Some(InteractableState::Paused));
        assert_eq!(world.event_counts().count(EventKind::InteractionStopped), 1);
        assert_eq!(world.pending_timer_count(), 0);
    }

    #[test]
    fn default_state_setter_rejects_transient_states() {
        let mut world = InteractionWorld::new();
        let id = world.spawn_interactable(basic_config());

        assert!(!world.set_default_state(id, InteractableState::Active));
        assert_eq!(
            world.interactable(id).expect("registered").default_state(),
            InteractableState::Awake
        );
        assert!(world.set_default_state(id, InteractableState::Asleep));
    }

    #[test]
    fn best_candidate_selection_prefers_weight_then_lowest_id() {
        let mut world = InteractionWorld::new();
        let light = world.spawn_interactable(InteractableConfig {
            weight: 5,
            ..basic_config()
        });
        let heavy = world.spawn_interactable(InteractableConfig {
            weight: 7,
            ..basic_config()
        });
        let actor = world.spawn_interactor(eager_interactor());
        assert!(world.begin_overlap(light, actor));
        assert!(world.begin_overlap(heavy, actor));

        assert_eq!(world.select_best_candidate(actor), Some(heavy));
        assert_eq!(world.state(heavy), Some(InteractableState::Active));
        assert_eq!(world.state(light), Some(InteractableState::Awake));
        assert_eq!(
            world.event_counts().count(EventKind::InteractableSelected),
            1
        );
        assert_eq!(
            world.event_counts().count(EventKind::InteractionCanceled),
            1
        );

        // Ties break toward the lower id.
        let mut world = InteractionWorld::new();
        let first = world.spawn_interactable(basic_config());
        let second = world.spawn_interactable(basic_config());
        let actor = world.spawn_interactor(eager_interactor());
        assert!(world.begin_overlap(first, actor));
        assert!(world.begin_overlap(second, actor));
        assert_eq!(world.select_best_candidate(actor), Some(first));
    }

    #[test]
    fn overlap_filters_ignored_classes_channels_and_interactor_state() {
        let mut world = InteractionWorld::new();
        let id = world.spawn_interactable(InteractableConfig {
            ignored_classes: vec![TypeTag::new("drone")],
            ..basic_config()
        });

        let drone = world.spawn_interactor(InteractorConfig {
            type_tag: TypeTag::new("drone"),
            ..eager_interactor()
        });
        assert!(!world.begin_overlap(id, drone));

        let off_channel = world.spawn_interactor(InteractorConfig {
            response_channel: crate::scene::ResponseChannel(3),
            ..eager_interactor()
        });
        assert!(!world.begin_overlap(id, off_channel));

        let sleeper = world.spawn_interactor(eager_interactor());
        world.deactivate_interactor(sleeper);
        assert!(!world.begin_overlap(id, sleeper));

        let qualified = world.spawn_interactor(eager_interactor());
        assert!(world.begin_overlap(id, qualified));
        assert!(world.can_interact(id));
    }

    #[test]
    fn trace_triggering_binds_without_an_overlap() {
        let mut world = InteractionWorld::new();
        let id = world.spawn_interactable(basic_config());
        let actor = world.spawn_interactor(eager_interactor());

        assert!(world.traced(id, actor));
        assert_eq!(world.event_counts().count(EventKind::InteractorTraced), 1);
        assert_eq!(world.event_counts().count(EventKind::InteractorFound), 1);
        assert!(world.can_interact(id));
    }

    #[test]
    fn losing_the_interactor_mid_cooldown_keeps_the_cooldown_running() {
        let mut world = InteractionWorld::new();
        let (id, actor) = wire_selection(&mut world, cycled_config(-1));

        assert!(world.press_interaction_key(actor, &default_key()));
        world.advance(1.0);
        assert_eq!(world.state(id), Some(InteractableState::Cooldown));

        assert!(world.end_overlap(id, actor));
        assert_eq!(world.state(id), Some(InteractableState::Cooldown));
        assert!(world.interactable(id).expect("registered").interactor().is_none());
        assert_eq!(world.pending_timer_count(), 1);

        world.advance(2.0);
        assert_eq!(world.state(id), Some(InteractableState::Awake));
        assert_eq!(world.event_counts().count(EventKind::CooldownCompleted), 1);
    }

    #[test]
    fn losing_the_interactor_while_active_returns_to_default() {
        let mut world = InteractionWorld::new();
        let (id, actor) = wire_selection(&mut world, basic_config());

        assert!(world.end_overlap(id, actor));
        assert_eq!(world.state(id), Some(InteractableState::Awake));
        assert!(!world.can_interact(id));
        assert!(world.event_counts().count(EventKind::InteractorLost) >= 1);
        assert_eq!(
            world.event_counts().count(EventKind::InteractorStopOverlap),
            1
        );
    }

    #[test]
    fn despawning_the_interactor_releases_bound_interactables() {
        let mut world = InteractionWorld::new();
        let (id, actor) = wire_selection(&mut world, basic_config());

        assert!(world.despawn_interactor(actor));
        assert_eq!(world.state(id), Some(InteractableState::Awake));
        assert!(world.interactable(id).expect("registered").interactor().is_none());
    }

    #[test]
    fn cooldown_boundaries_drive_the_binder() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let binder = RecordingBinder { log: Rc::clone(&log) };
        let mut world = InteractionWorld::with_binder(Box::new(binder));

        let (id, actor) = wire_selection(&mut world, cycled_config(-1));
        assert!(world.press_interaction_key(actor, &default_key()));

        log.borrow_mut().clear();
        world.advance(1.0);
        assert_eq!(
            *log.borrow(),
            vec![
                BinderCall::UnbindHighlight(HighlightHandle(21)),
                BinderCall::UnbindCollision(CollisionHandle(11)),
            ]
        );

        log.borrow_mut().clear();
        world.advance(2.0);
        assert_eq!(
            *log.borrow(),
            vec![
                BinderCall::BindCollision(CollisionHandle(11)),
                BinderCall::BindHighlight(HighlightHandle(21)),
                BinderCall::BindCollision(CollisionHandle(11)),
            ]
        );
        assert_eq!(world.state(id), Some(InteractableState::Active));
    }

    #[test]
    fn operations_on_unknown_ids_fail_silently() {
        let mut world = InteractionWorld::new();
        let ghost = InteractableId(99);

        let (ok, message) = world.activate(ghost);
        assert!(!ok);
        assert!(message.contains("not registered"));

        world.set_state(ghost, InteractableState::Active);
        assert!(!world.can_interact(ghost));
        assert!(!world.can_be_triggered(ghost));
        assert!(!world.begin_overlap(ghost, InteractorId(0)));
        assert_eq!(world.interaction_progress(ghost), -1.0);
        assert!(!world.add_dependency(ghost, InteractableId(98)));
    }

    #[test]
    fn snooze_deactivates_and_reports_the_deprecation() {
        let mut world = InteractionWorld::new();
        let id = world.spawn_interactable(basic_config());

        let (ok, message) = world.snooze(id);
        assert!(ok);
        assert!(message.contains("deprecated"));
        assert_eq!(world.state(id), Some(InteractableState::Disabled));

        // The asleep state itself is still reachable through the table.
        let (ok, _) = world.wake_up(id);
        assert!(ok);
        world.set_state(id, InteractableState::Asleep);
        assert_eq!(world.state(id), Some(InteractableState::Asleep));
    }

    #[test]
    fn interaction_progress_tracks_the_elapsed_fraction() {
        let mut world = InteractionWorld::new();
        let (id, actor) = wire_selection(
            &mut world,
            InteractableConfig {
                interaction_period_seconds: 2.0,
                ..basic_config()
            },
        );

        assert_eq!(world.interaction_progress(id), 0.0);
        assert!(world.press_interaction_key(actor, &default_key()));
        world.advance(0.5);
        assert!((world.interaction_progress(id) - 0.25).abs() < 1e-6);
        world.advance(0.5);
        assert!((world.interaction_progress(id) - 0.5).abs() < 1e-6);
    }
}
