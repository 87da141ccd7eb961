use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractableState {
    /// Invalid sentinel. Requesting it runs no commit; it must never persist.
    Default,
    Awake,
    Active,
    /// Deprecated idle state, kept reachable for compatibility.
    Asleep,
    Suppressed,
    Cooldown,
    Completed,
    Disabled,
    Paused,
}

impl InteractableState {
    pub fn is_terminal(self) -> bool {
        self == Self::Completed
    }

    /// States a default state may legally take.
    pub fn is_legal_default(self) -> bool {
        !matches!(self, Self::Active | Self::Completed | Self::Cooldown)
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Awake => "awake",
            Self::Active => "active",
            Self::Asleep => "asleep",
            Self::Suppressed => "suppressed",
            Self::Cooldown => "cooldown",
            Self::Completed => "completed",
            Self::Disabled => "disabled",
            Self::Paused => "paused",
        }
    }
}

/// One step of an accepted transition, applied in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    Commit,
    EmitStateChanged,
    BindCollisionTargets,
    UnbindCollisionTargets,
    StopHighlight,
    CancelAllTimers,
    EmitInteractorLost,
    EmitCanceled,
    CancelCooldownTimer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    Rejected,
    Apply(&'static [TransitionEffect]),
}

impl TransitionPlan {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Apply(_))
    }

    /// Whether the plan actually moves the machine to the requested state.
    pub fn commits(self) -> bool {
        match self {
            Self::Rejected => false,
            Self::Apply(effects) => effects.contains(&TransitionEffect::Commit),
        }
    }
}

const ENTER_ACTIVE: &[TransitionEffect] =
    &[TransitionEffect::Commit, TransitionEffect::EmitStateChanged];

const ENTER_AWAKE: &[TransitionEffect] = &[
    TransitionEffect::Commit,
    TransitionEffect::EmitStateChanged,
    TransitionEffect::BindCollisionTargets,
];

// The cleanup sequence: the object goes dark and drops every owned timer.
const CLEANUP: &[TransitionEffect] = &[
    TransitionEffect::Commit,
    TransitionEffect::StopHighlight,
    TransitionEffect::EmitStateChanged,
    TransitionEffect::CancelAllTimers,
    TransitionEffect::EmitInteractorLost,
    TransitionEffect::UnbindCollisionTargets,
];

// End-of-cycle cooldown keeps collision bound so progress stays observable.
const ENTER_COOLDOWN_SOFT: &[TransitionEffect] = &[
    TransitionEffect::Commit,
    TransitionEffect::StopHighlight,
    TransitionEffect::EmitStateChanged,
];

const ENTER_SUPPRESSED: &[TransitionEffect] = &[
    TransitionEffect::EmitCanceled,
    TransitionEffect::Commit,
    TransitionEffect::StopHighlight,
    TransitionEffect::EmitStateChanged,
];

const ENTER_SUPPRESSED_FROM_COOLDOWN: &[TransitionEffect] = &[
    TransitionEffect::EmitCanceled,
    TransitionEffect::Commit,
    TransitionEffect::StopHighlight,
    TransitionEffect::EmitStateChanged,
    TransitionEffect::CancelCooldownTimer,
];

const ENTER_PAUSED: &[TransitionEffect] =
    &[TransitionEffect::Commit, TransitionEffect::EmitStateChanged];

const REQUEST_SENTINEL: &[TransitionEffect] = &[TransitionEffect::StopHighlight];

/// The transition table as data: `(current, requested)` to an ordered effect
/// list, or a rejection. Every other combination is a silent no-op.
pub fn transition_plan(
    current: InteractableState,
    requested: InteractableState,
) -> TransitionPlan {
    use InteractableState::*;

    match requested {
        Active => match current {
            Awake | Paused => TransitionPlan::Apply(ENTER_ACTIVE),
            _ => TransitionPlan::Rejected,
        },
        Awake => match current {
            Active | Asleep | Suppressed | Cooldown | Disabled | Paused => {
                TransitionPlan::Apply(ENTER_AWAKE)
            }
            _ => TransitionPlan::Rejected,
        },
        Asleep => match current {
            Active | Paused | Awake | Suppressed | Cooldown | Disabled => {
                TransitionPlan::Apply(CLEANUP)
            }
            _ => TransitionPlan::Rejected,
        },
        Cooldown => match current {
            Awake | Active => TransitionPlan::Apply(ENTER_COOLDOWN_SOFT),
            Suppressed | Disabled => TransitionPlan::Apply(CLEANUP),
            _ => TransitionPlan::Rejected,
        },
        Completed => match current {
            Active => TransitionPlan::Apply(CLEANUP),
            _ => TransitionPlan::Rejected,
        },
        Disabled => match current {
            Awake | Active | Asleep | Suppressed | Cooldown | Paused => {
                TransitionPlan::Apply(CLEANUP)
            }
            _ => TransitionPlan::Rejected,
        },
        Suppressed => match current {
            Active | Awake | Asleep | Disabled | Paused => TransitionPlan::Apply(ENTER_SUPPRESSED),
            Cooldown => TransitionPlan::Apply(ENTER_SUPPRESSED_FROM_COOLDOWN),
            _ => TransitionPlan::Rejected,
        },
        Paused => match current {
            Active => TransitionPlan::Apply(ENTER_PAUSED),
            _ => TransitionPlan::Rejected,
        },
        Default => TransitionPlan::Apply(REQUEST_SENTINEL),
    }
}

pub const ALL_STATES: [InteractableState; 9] = [
    InteractableState::Default,
    InteractableState::Awake,
    InteractableState::Active,
    InteractableState::Asleep,
    InteractableState::Suppressed,
    InteractableState::Cooldown,
    InteractableState::Completed,
    InteractableState::Disabled,
    InteractableState::Paused,
];

#[cfg(test)]
mod tests {
    use super::*;
    use super::InteractableState::*;

    #[test]
    fn same_state_requests_never_commit() {
        for state in ALL_STATES {
            assert!(
                !transition_plan(state, state).commits(),
                "{} -> {} must be a no-op",
                state.as_token(),
                state.as_token()
            );
        }
    }

    #[test]
    fn second_application_is_idempotent() {
        // Applying the same request twice: the second attempt must not commit
        // again from the state the first attempt produced.
        for current in ALL_STATES {
            for requested in ALL_STATES {
                if transition_plan(current, requested).commits() {
                    assert!(
                        !transition_plan(requested, requested).commits(),
                        "{} -> {} reapplied must be a no-op",
                        current.as_token(),
                        requested.as_token()
                    );
                }
            }
        }
    }

    #[test]
    fn completed_is_terminal() {
        for requested in ALL_STATES {
            assert!(
                !transition_plan(Completed, requested).commits(),
                "completed -> {} must be rejected",
                requested.as_token()
            );
        }
    }

    #[test]
    fn sentinel_request_never_commits() {
        for current in ALL_STATES {
            let plan = transition_plan(current, Default);
            assert!(plan.is_accepted());
            assert!(!plan.commits());
        }
    }

    #[test]
    fn active_is_reachable_only_from_awake_and_paused() {
        for current in ALL_STATES {
            let expected = matches!(current, Awake | Paused);
            assert_eq!(
                transition_plan(current, Active).commits(),
                expected,
                "{} -> active",
                current.as_token()
            );
        }
    }

    #[test]
    fn forced_cooldown_runs_cleanup_and_cycle_cooldown_does_not() {
        let soft = transition_plan(Active, Cooldown);
        let forced = transition_plan(Suppressed, Cooldown);

        let TransitionPlan::Apply(soft_effects) = soft else {
            panic!("active -> cooldown must be accepted");
        };
        let TransitionPlan::Apply(forced_effects) = forced else {
            panic!("suppressed -> cooldown must be accepted");
        };

        assert!(!soft_effects.contains(&TransitionEffect::UnbindCollisionTargets));
        assert!(!soft_effects.contains(&TransitionEffect::CancelAllTimers));
        assert!(forced_effects.contains(&TransitionEffect::UnbindCollisionTargets));
        assert!(forced_effects.contains(&TransitionEffect::CancelAllTimers));
    }

    #[test]
    fn suppression_from_cooldown_cancels_the_cooldown_timer() {
        let TransitionPlan::Apply(effects) = transition_plan(Cooldown, Suppressed) else {
            panic!("cooldown -> suppressed must be accepted");
        };
        assert!(effects.contains(&TransitionEffect::CancelCooldownTimer));
        assert_eq!(effects.first(), Some(&TransitionEffect::EmitCanceled));
    }

    #[test]
    fn waking_up_rebinds_collision() {
        for current in [Active, Asleep, Suppressed, Cooldown, Disabled, Paused] {
            let TransitionPlan::Apply(effects) = transition_plan(current, Awake) else {
                panic!("{} -> awake must be accepted", current.as_token());
            };
            assert!(effects.contains(&TransitionEffect::BindCollisionTargets));
        }
    }

    #[test]
    fn cancellation_precedes_the_suppressed_commit() {
        let TransitionPlan::Apply(effects) = transition_plan(Awake, Suppressed) else {
            panic!("awake -> suppressed must be accepted");
        };
        let canceled = effects
            .iter()
            .position(|effect| *effect == TransitionEffect::EmitCanceled)
            .expect("canceled effect present");
        let commit = effects
            .iter()
            .position(|effect| *effect == TransitionEffect::Commit)
            .expect("commit effect present");
        assert!(canceled < commit);
    }
}
