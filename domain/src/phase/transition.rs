//! Pure transition resolution over the phase graph.

use super::{FallbackAction, PhaseEnd, PhaseSpec, TransitionTrigger};

/// Where the session goes after a phase completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionDecision {
    /// Continue with the named phase.
    Continue(String),
    /// No eligible transition: the session ends.
    Terminate,
}

/// Resolve the next phase for `(phase, ended_by)`.
///
/// Eligible transitions are those whose trigger is `ALWAYS` or matches the
/// ending. They are sorted by `(priority asc, target id asc)` and the head
/// wins. When nothing is eligible and the phase ended on its round limit
/// with a `TRANSITION` fallback, the fallback target applies as a synthetic
/// lowest-priority edge. Otherwise the session terminates.
///
/// # Example
///
/// ```
/// use council_domain::phase::{
///     resolve_transition, FallbackAction, Governance, PhaseEnd, PhaseFallback, PhaseSpec,
///     StopConditions, TransitionDecision, TransitionRule, TransitionTrigger,
/// };
///
/// let phase = PhaseSpec {
///     id: "debate".into(),
///     goal: "Pick a direction".into(),
///     prompt_guidance: vec![],
///     deliverables: vec![],
///     governance: Governance::default(),
///     stop_conditions: StopConditions { max_rounds: 3, end_on_majority_vote: true },
///     memory_policy: Default::default(),
///     evidence: Default::default(),
///     quality_gates: vec![],
///     fallback: PhaseFallback {
///         resolution: "No consensus".into(),
///         action: FallbackAction::EndSession,
///     },
///     transitions: vec![TransitionRule {
///         to: "plan".into(),
///         when: TransitionTrigger::MajorityVote,
///         priority: 0,
///     }],
/// };
///
/// assert_eq!(
///     resolve_transition(&phase, PhaseEnd::MajorityVote),
///     TransitionDecision::Continue("plan".into())
/// );
/// assert_eq!(
///     resolve_transition(&phase, PhaseEnd::RoundLimit),
///     TransitionDecision::Terminate
/// );
/// ```
pub fn resolve_transition(phase: &PhaseSpec, ended_by: PhaseEnd) -> TransitionDecision {
    let trigger = ended_by.trigger();

    let mut eligible: Vec<_> = phase
        .transitions
        .iter()
        .filter(|rule| rule.when == TransitionTrigger::Always || rule.when == trigger)
        .collect();
    eligible.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.to.cmp(&b.to)));

    if let Some(head) = eligible.first() {
        return TransitionDecision::Continue(head.to.clone());
    }

    if ended_by == PhaseEnd::RoundLimit
        && let FallbackAction::Transition { to } = &phase.fallback.action
    {
        return TransitionDecision::Continue(to.clone());
    }

    TransitionDecision::Terminate
}
