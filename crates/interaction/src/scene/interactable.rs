use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::machine::{InteractableState, TimerHandle};
use crate::scene::{
    CollisionHandle, HighlightHandle, InteractableId, InteractorId, ResponseChannel, TypeTag,
};

pub const UNLIMITED_INTERACTION_PERIOD: f32 = -1.0;
pub const INFINITE_LIFECYCLE_COUNT: i32 = -1;
pub const MIN_INTERACTION_PERIOD_SECONDS: f32 = 0.01;
pub const MIN_COOLDOWN_PERIOD_SECONDS: f32 = 0.1;
pub const MIN_CYCLED_LIFECYCLE_COUNT: i32 = 2;

const DEFAULT_INTERACTION_PERIOD_SECONDS: f32 = 1.5;
const DEFAULT_COOLDOWN_PERIOD_SECONDS: f32 = 3.0;
const DEFAULT_INTERACTION_WEIGHT: i32 = 1;
const NEARLY_ZERO_PERIOD: f32 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleMode {
    /// Interaction cycles through cooldowns until the lifecycle count runs out.
    Cycled,
    /// A single interaction completes the interactable for good.
    OnlyOnce,
}

impl Default for LifecycleMode {
    fn default() -> Self {
        Self::Cycled
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractableConfig {
    #[serde(default = "default_display_name")]
    pub display_name: String,
    #[serde(default = "default_state")]
    pub default_state: InteractableState,
    #[serde(default)]
    pub lifecycle_mode: LifecycleMode,
    #[serde(default = "default_lifecycle_count")]
    pub lifecycle_count: i32,
    #[serde(default = "default_interaction_period")]
    pub interaction_period_seconds: f32,
    #[serde(default = "default_cooldown_period")]
    pub cooldown_period_seconds: f32,
    #[serde(default = "default_weight")]
    pub weight: i32,
    #[serde(default)]
    pub collision_channel: ResponseChannel,
    #[serde(default)]
    pub ignored_classes: Vec<TypeTag>,
    #[serde(default)]
    pub collision_targets: Vec<CollisionHandle>,
    #[serde(default)]
    pub highlight_targets: Vec<HighlightHandle>,
}

fn default_display_name() -> String {
    "interactable".to_string()
}

fn default_state() -> InteractableState {
    InteractableState::Awake
}

fn default_lifecycle_count() -> i32 {
    INFINITE_LIFECYCLE_COUNT
}

fn default_interaction_period() -> f32 {
    DEFAULT_INTERACTION_PERIOD_SECONDS
}

fn default_cooldown_period() -> f32 {
    DEFAULT_COOLDOWN_PERIOD_SECONDS
}

fn default_weight() -> i32 {
    DEFAULT_INTERACTION_WEIGHT
}

impl Default for InteractableConfig {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
            default_state: default_state(),
            lifecycle_mode: LifecycleMode::default(),
            lifecycle_count: default_lifecycle_count(),
            interaction_period_seconds: default_interaction_period(),
            cooldown_period_seconds: default_cooldown_period(),
            weight: default_weight(),
            collision_channel: ResponseChannel::default(),
            ignored_classes: Vec::new(),
            collision_targets: Vec::new(),
            highlight_targets: Vec::new(),
        }
    }
}

/// -1 stays unlimited; anything else lands at or above the minimum period.
pub fn clamp_interaction_period(period_seconds: f32) -> f32 {
    let mut period = period_seconds;
    if period > UNLIMITED_INTERACTION_PERIOD && period < MIN_INTERACTION_PERIOD_SECONDS {
        period = MIN_INTERACTION_PERIOD_SECONDS;
    }
    if period.abs() < NEARLY_ZERO_PERIOD {
        period = MIN_INTERACTION_PERIOD_SECONDS;
    }
    period.max(UNLIMITED_INTERACTION_PERIOD)
}

/// Cycled lifecycles allow -1 (infinite) or at least two cycles; 0 and 1
/// would complete without ever cycling.
pub fn clamp_lifecycle_count(mode: LifecycleMode, count: i32) -> i32 {
    match mode {
        LifecycleMode::Cycled => {
            if count <= INFINITE_LIFECYCLE_COUNT {
                INFINITE_LIFECYCLE_COUNT
            } else {
                count.max(MIN_CYCLED_LIFECYCLE_COUNT)
            }
        }
        LifecycleMode::OnlyOnce => count,
    }
}

pub fn clamp_cooldown_period(period_seconds: f32) -> f32 {
    period_seconds.max(MIN_COOLDOWN_PERIOD_SECONDS)
}

#[derive(Debug)]
pub struct Interactable {
    id: InteractableId,
    display_name: String,
    state: InteractableState,
    default_state: InteractableState,
    lifecycle_mode: LifecycleMode,
    lifecycle_count: i32,
    remaining_lifecycle_count: i32,
    interaction_period_seconds: f32,
    cooldown_period_seconds: f32,
    weight: i32,
    cached_weight: i32,
    collision_channel: ResponseChannel,
    pub(crate) interactor: Option<InteractorId>,
    pub(crate) collision_targets: Vec<CollisionHandle>,
    pub(crate) highlight_targets: Vec<HighlightHandle>,
    pub(crate) ignored_classes: Vec<TypeTag>,
    pub(crate) dependents: Vec<InteractableId>,
    pub(crate) timer_interaction: Option<TimerHandle>,
    pub(crate) timer_expiration: Option<TimerHandle>,
    pub(crate) timer_cooldown: Option<TimerHandle>,
}

impl Interactable {
    pub(crate) fn from_config(id: InteractableId, config: InteractableConfig) -> Self {
        let default_state = if config.default_state.is_legal_default() {
            config.default_state
        } else {
            warn!(
                id = %id,
                requested = config.default_state.as_token(),
                "illegal default state in config, falling back to awake"
            );
            InteractableState::Awake
        };
        let lifecycle_count = clamp_lifecycle_count(config.lifecycle_mode, config.lifecycle_count);

        Self {
            id,
            display_name: config.display_name,
            state: InteractableState::Awake,
            default_state,
            lifecycle_mode: config.lifecycle_mode,
            lifecycle_count,
            remaining_lifecycle_count: lifecycle_count,
            interaction_period_seconds: clamp_interaction_period(config.interaction_period_seconds),
            cooldown_period_seconds: clamp_cooldown_period(config.cooldown_period_seconds),
            weight: config.weight,
            cached_weight: config.weight,
            collision_channel: config.collision_channel,
            interactor: None,
            collision_targets: Vec::new(),
            highlight_targets: Vec::new(),
            ignored_classes: config.ignored_classes,
            dependents: Vec::new(),
            timer_interaction: None,
            timer_expiration: None,
            timer_cooldown: None,
        }
    }

    pub fn id(&self) -> InteractableId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Empty names are rejected outright.
    pub fn set_display_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() {
            return false;
        }
        self.display_name = name;
        true
    }

    pub fn state(&self) -> InteractableState {
        self.state
    }

    pub(crate) fn commit_state(&mut self, state: InteractableState) {
        self.state = state;
    }

    pub fn default_state(&self) -> InteractableState {
        self.default_state
    }

    /// Active, Completed and Cooldown are illegal defaults; the prior value
    /// is kept and the request logged.
    pub fn set_default_state(&mut self, state: InteractableState) -> bool {
        if !state.is_legal_default() {
            warn!(
                id = %self.id,
                requested = state.as_token(),
                "rejected illegal default state"
            );
            return false;
        }
        self.default_state = state;
        true
    }

    pub fn lifecycle_mode(&self) -> LifecycleMode {
        self.lifecycle_mode
    }

    pub fn set_lifecycle_mode(&mut self, mode: LifecycleMode) {
        self.lifecycle_mode = mode;
    }

    pub fn lifecycle_count(&self) -> i32 {
        self.lifecycle_count
    }

    pub fn remaining_lifecycle_count(&self) -> i32 {
        self.remaining_lifecycle_count
    }

    pub(crate) fn set_remaining_lifecycle_count(&mut self, remaining: i32) {
        self.remaining_lifecycle_count = remaining;
    }

    /// Clamps per lifecycle mode and resets the remaining count. Ignored
    /// under OnlyOnce, as the count only drives cooldown cycling.
    pub fn set_lifecycle_count(&mut self, count: i32) {
        if self.lifecycle_mode != LifecycleMode::Cycled {
            return;
        }
        self.lifecycle_count = clamp_lifecycle_count(self.lifecycle_mode, count);
        self.remaining_lifecycle_count = self.lifecycle_count;
    }

    pub fn interaction_period_seconds(&self) -> f32 {
        self.interaction_period_seconds
    }

    pub fn set_interaction_period(&mut self, period_seconds: f32) {
        self.interaction_period_seconds = clamp_interaction_period(period_seconds);
    }

    pub fn has_unlimited_period(&self) -> bool {
        self.interaction_period_seconds <= 0.0
            || self.interaction_period_seconds.abs() < MIN_INTERACTION_PERIOD_SECONDS
    }

    pub fn cooldown_period_seconds(&self) -> f32 {
        self.cooldown_period_seconds
    }

    pub fn set_cooldown_period(&mut self, period_seconds: f32) {
        self.cooldown_period_seconds = clamp_cooldown_period(period_seconds);
    }

    pub fn weight(&self) -> i32 {
        self.weight
    }

    /// An explicit weight assignment also becomes the restore point used
    /// when a dependency edge ends.
    pub(crate) fn assign_weight(&mut self, weight: i32) {
        self.weight = weight;
        self.cached_weight = weight;
    }

    pub(crate) fn lower_weight(&mut self, weight: i32) {
        self.weight = weight;
    }

    pub fn cached_weight(&self) -> i32 {
        self.cached_weight
    }

    pub fn collision_channel(&self) -> ResponseChannel {
        self.collision_channel
    }

    pub fn set_collision_channel(&mut self, channel: ResponseChannel) {
        self.collision_channel = channel;
    }

    pub fn interactor(&self) -> Option<InteractorId> {
        self.interactor
    }

    pub fn has_interactor(&self) -> bool {
        self.interactor.is_some()
    }

    pub fn collision_targets(&self) -> &[CollisionHandle] {
        &self.collision_targets
    }

    pub fn highlight_targets(&self) -> &[HighlightHandle] {
        &self.highlight_targets
    }

    pub fn ignored_classes(&self) -> &[TypeTag] {
        &self.ignored_classes
    }

    pub fn dependents(&self) -> &[InteractableId] {
        &self.dependents
    }

    pub(crate) fn take_timer_handles(&mut self) -> [Option<TimerHandle>; 3] {
        [
            self.timer_interaction.take(),
            self.timer_expiration.take(),
            self.timer_cooldown.take(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(config: InteractableConfig) -> Interactable {
        Interactable::from_config(InteractableId(7), config)
    }

    #[test]
    fn config_defaults_match_the_documented_baseline() {
        let config = InteractableConfig::default();
        assert_eq!(config.default_state, InteractableState::Awake);
        assert_eq!(config.lifecycle_mode, LifecycleMode::Cycled);
        assert_eq!(config.lifecycle_count, INFINITE_LIFECYCLE_COUNT);
        assert_eq!(config.weight, 1);
        assert!((config.interaction_period_seconds - 1.5).abs() < f32::EPSILON);
        assert!((config.cooldown_period_seconds - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn interaction_period_clamps_to_minimum_or_unlimited() {
        assert_eq!(clamp_interaction_period(-1.0), -1.0);
        assert_eq!(clamp_interaction_period(-5.0), -1.0);
        assert_eq!(clamp_interaction_period(0.0), MIN_INTERACTION_PERIOD_SECONDS);
        assert_eq!(
            clamp_interaction_period(0.004),
            MIN_INTERACTION_PERIOD_SECONDS
        );
        assert_eq!(clamp_interaction_period(2.5), 2.5);
    }

    #[test]
    fn cycled_lifecycle_count_clamps_low_values_to_two() {
        assert_eq!(clamp_lifecycle_count(LifecycleMode::Cycled, -1), -1);
        assert_eq!(clamp_lifecycle_count(LifecycleMode::Cycled, -4), -1);
        assert_eq!(clamp_lifecycle_count(LifecycleMode::Cycled, 0), 2);
        assert_eq!(clamp_lifecycle_count(LifecycleMode::Cycled, 1), 2);
        assert_eq!(clamp_lifecycle_count(LifecycleMode::Cycled, 5), 5);
    }

    #[test]
    fn illegal_default_state_in_config_falls_back_to_awake() {
        let item = sample(InteractableConfig {
            default_state: InteractableState::Cooldown,
            ..InteractableConfig::default()
        });
        assert_eq!(item.default_state(), InteractableState::Awake);
    }

    #[test]
    fn set_default_state_rejects_active_completed_cooldown() {
        let mut item = sample(InteractableConfig::default());
        assert!(item.set_default_state(InteractableState::Asleep));

        for illegal in [
            InteractableState::Active,
            InteractableState::Completed,
            InteractableState::Cooldown,
        ] {
            assert!(!item.set_default_state(illegal));
            assert_eq!(item.default_state(), InteractableState::Asleep);
        }
    }

    #[test]
    fn set_lifecycle_count_resets_the_remaining_count() {
        let mut item = sample(InteractableConfig {
            lifecycle_count: 4,
            ..InteractableConfig::default()
        });
        assert_eq!(item.remaining_lifecycle_count(), 4);

        item.set_lifecycle_count(1);
        assert_eq!(item.lifecycle_count(), 2);
        assert_eq!(item.remaining_lifecycle_count(), 2);
    }

    #[test]
    fn only_once_mode_ignores_lifecycle_count_updates() {
        let mut item = sample(InteractableConfig {
            lifecycle_mode: LifecycleMode::OnlyOnce,
            lifecycle_count: 3,
            ..InteractableConfig::default()
        });
        item.set_lifecycle_count(10);
        assert_eq!(item.lifecycle_count(), 3);
    }

    #[test]
    fn empty_display_name_is_rejected() {
        let mut item = sample(InteractableConfig::default());
        assert!(!item.set_display_name(""));
        assert_eq!(item.display_name(), "interactable");
        assert!(item.set_display_name("lever"));
        assert_eq!(item.display_name(), "lever");
    }

    #[test]
    fn unlimited_period_detection_covers_negative_and_near_zero() {
        let mut item = sample(InteractableConfig::default());
        assert!(!item.has_unlimited_period());
        item.set_interaction_period(-1.0);
        assert!(item.has_unlimited_period());
    }
}
