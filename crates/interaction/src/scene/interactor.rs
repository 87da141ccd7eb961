use serde::{Deserialize, Serialize};

use crate::scene::{InteractableId, InteractionKey, InteractorId, ResponseChannel, TypeTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractorState {
    Awake,
    Asleep,
    Suppressed,
    Disabled,
    Active,
}

impl InteractorState {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Awake => "awake",
            Self::Asleep => "asleep",
            Self::Suppressed => "suppressed",
            Self::Disabled => "disabled",
            Self::Active => "active",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractorConfig {
    #[serde(default)]
    pub auto_activate: bool,
    #[serde(default)]
    pub interaction_key: InteractionKey,
    #[serde(default)]
    pub response_channel: ResponseChannel,
    #[serde(default = "default_type_tag")]
    pub type_tag: TypeTag,
}

fn default_type_tag() -> TypeTag {
    TypeTag::new("interactor.default")
}

impl Default for InteractorConfig {
    fn default() -> Self {
        Self {
            auto_activate: false,
            interaction_key: InteractionKey::default(),
            response_channel: ResponseChannel::default(),
            type_tag: default_type_tag(),
        }
    }
}

#[derive(Debug)]
pub struct Interactor {
    id: InteractorId,
    state: InteractorState,
    pub(crate) active_interactable: Option<InteractableId>,
    pub(crate) candidates: Vec<InteractableId>,
    auto_activate: bool,
    interaction_key: InteractionKey,
    response_channel: ResponseChannel,
    type_tag: TypeTag,
}

impl Interactor {
    pub(crate) fn from_config(id: InteractorId, config: InteractorConfig) -> Self {
        let state = if config.auto_activate {
            InteractorState::Active
        } else {
            InteractorState::Awake
        };
        Self {
            id,
            state,
            active_interactable: None,
            candidates: Vec::new(),
            auto_activate: config.auto_activate,
            interaction_key: config.interaction_key,
            response_channel: config.response_channel,
            type_tag: config.type_tag,
        }
    }

    pub fn id(&self) -> InteractorId {
        self.id
    }

    pub fn state(&self) -> InteractorState {
        self.state
    }

    pub fn can_interact(&self) -> bool {
        matches!(self.state, InteractorState::Awake | InteractorState::Active)
    }

    pub fn activate(&mut self) -> (bool, String) {
        match self.state {
            InteractorState::Awake => {
                self.state = InteractorState::Active;
                (true, "interactor has been activated".to_string())
            }
            InteractorState::Active => (false, "interactor is already active".to_string()),
            InteractorState::Asleep | InteractorState::Suppressed => (
                false,
                format!(
                    "interactor cannot be activated while {}",
                    self.state.as_token()
                ),
            ),
            InteractorState::Disabled => {
                (false, "interactor is disabled and must be woken up".to_string())
            }
        }
    }

    pub fn wake_up(&mut self) -> (bool, String) {
        match self.state {
            InteractorState::Asleep | InteractorState::Suppressed | InteractorState::Disabled => {
                self.state = InteractorState::Awake;
                (true, "interactor has been awoken".to_string())
            }
            InteractorState::Awake => (false, "interactor is already awake".to_string()),
            InteractorState::Active => (false, "interactor is already active".to_string()),
        }
    }

    pub fn suppress(&mut self) {
        self.state = InteractorState::Suppressed;
    }

    pub fn deactivate(&mut self) {
        self.state = InteractorState::Disabled;
    }

    pub fn auto_activate(&self) -> bool {
        self.auto_activate
    }

    pub fn interaction_key(&self) -> &InteractionKey {
        &self.interaction_key
    }

    pub fn set_interaction_key(&mut self, key: InteractionKey) {
        self.interaction_key = key;
    }

    pub fn response_channel(&self) -> ResponseChannel {
        self.response_channel
    }

    pub fn set_response_channel(&mut self, channel: ResponseChannel) {
        self.response_channel = channel;
    }

    pub fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }

    pub fn active_interactable(&self) -> Option<InteractableId> {
        self.active_interactable
    }

    pub fn candidates(&self) -> &[InteractableId] {
        &self.candidates
    }

    pub(crate) fn add_candidate(&mut self, id: InteractableId) {
        if !self.candidates.contains(&id) {
            self.candidates.push(id);
        }
    }

    pub(crate) fn remove_candidate(&mut self, id: InteractableId) {
        self.candidates.retain(|candidate| *candidate != id);
        if self.active_interactable == Some(id) {
            self.active_interactable = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(config: InteractorConfig) -> Interactor {
        Interactor::from_config(InteractorId(3), config)
    }

    #[test]
    fn auto_activate_spawns_active() {
        let idle = sample(InteractorConfig::default());
        assert_eq!(idle.state(), InteractorState::Awake);

        let eager = sample(InteractorConfig {
            auto_activate: true,
            ..InteractorConfig::default()
        });
        assert_eq!(eager.state(), InteractorState::Active);
    }

    #[test]
    fn activate_only_succeeds_from_awake() {
        let mut interactor = sample(InteractorConfig::default());
        let (ok, _) = interactor.activate();
        assert!(ok);
        assert_eq!(interactor.state(), InteractorState::Active);

        let (ok, message) = interactor.activate();
        assert!(!ok);
        assert!(message.contains("already active"));

        interactor.deactivate();
        let (ok, _) = interactor.activate();
        assert!(!ok);
        assert_eq!(interactor.state(), InteractorState::Disabled);
    }

    #[test]
    fn wake_up_recovers_from_disabled_and_suppressed() {
        let mut interactor = sample(InteractorConfig::default());
        interactor.deactivate();
        let (ok, _) = interactor.wake_up();
        assert!(ok);
        assert_eq!(interactor.state(), InteractorState::Awake);

        interactor.suppress();
        assert!(!interactor.can_interact());
        let (ok, _) = interactor.wake_up();
        assert!(ok);
        assert!(interactor.can_interact());
    }

    #[test]
    fn candidates_stay_deduplicated_in_insertion_order() {
        let mut interactor = sample(InteractorConfig::default());
        interactor.add_candidate(InteractableId(1));
        interactor.add_candidate(InteractableId(2));
        interactor.add_candidate(InteractableId(1));
        assert_eq!(
            interactor.candidates(),
            &[InteractableId(1), InteractableId(2)]
        );

        interactor.active_interactable = Some(InteractableId(2));
        interactor.remove_candidate(InteractableId(2));
        assert_eq!(interactor.candidates(), &[InteractableId(1)]);
        assert_eq!(interactor.active_interactable(), None);
    }
}
