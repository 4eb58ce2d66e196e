//! Aggregate trait for pure, whole-value state transitions.

/// Outcome of handling a command against an aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<S> {
    /// The command produced a replacement state.
    Changed(S),
    /// The command was accepted but the state is unchanged. Callers still
    /// publish and persist the current value.
    Unchanged,
    /// The command was dropped entirely; nothing is published or persisted.
    Skipped,
}

impl<S> Transition<S> {
    /// Returns the state to publish, or `None` for [`Transition::Skipped`].
    pub fn resolve(self, current: &S) -> Option<S>
    where
        S: Clone,
    {
        match self {
            Transition::Changed(next) => Some(next),
            Transition::Unchanged => Some(current.clone()),
            Transition::Skipped => None,
        }
    }
}

/// Aggregate execution semantics (pure, deterministic).
///
/// `handle` never mutates `self`: every accepted command yields a full
/// replacement value. Aggregates must not perform IO or side effects.
pub trait Aggregate: Sized {
    type Command: core::fmt::Debug;
    /// Policy knobs that influence decisions (configuration, not state).
    type Policy;
    type Error: core::fmt::Debug;

    fn handle(
        &self,
        command: &Self::Command,
        policy: &Self::Policy,
    ) -> Result<Transition<Self>, Self::Error>;
}
