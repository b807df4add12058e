//! Prompt templates for every protocol step.
//!
//! Pure functions: each builder concatenates the council identity, the
//! member's role, the phase context packet, the running counters, the
//! transcript window, the member's memory snapshot, the hard length table,
//! and the JSON response contract for that step. Prompts mandate a
//! single-line JSON response with no literal newlines inside string values.

mod limits;

pub use limits::{
    MAX_DECISION_CHARS, MAX_MESSAGE_CHARS, MAX_MOTION_TEXT_CHARS, MAX_RATIONALE_CHARS,
    MAX_REASON_CHARS, MAX_TITLE_CHARS, length_table,
};

use crate::council::{CouncilConfig, Member};
use crate::motion::Motion;
use crate::phase::PhaseResult;

const SINGLE_LINE_CONTRACT: &str = "Respond with a single JSON object on one line. \
Do not wrap it in a code fence, do not add any text before or after it, and do not put \
literal newlines inside string values (use \\n).";

/// Templates for generating prompts at each protocol step.
pub struct CouncilPrompt;

impl CouncilPrompt {
    /// System prompt for a member: council identity, role, traits, focus,
    /// then the member's own system prompt.
    pub fn member_system(config: &CouncilConfig, member: &Member) -> String {
        format!(
            "You are {name}, a member of the council \"{council}\".\n\
             Council purpose: {purpose}\n\
             Your role: {role}\n\
             Your traits: {traits}\n\
             Your focus: {focus}\n\n\
             {system_prompt}",
            name = member.name,
            council = config.name,
            purpose = config.purpose,
            role = member.role,
            traits = member.traits_line(),
            focus = member.focus_line(),
            system_prompt = member.system_prompt,
        )
    }

    /// Turn prompt: the member decides to CONTRIBUTE, PASS, or CALL_VOTE.
    pub fn turn(
        human_prompt: &str,
        phase_context: &str,
        guidance: &[String],
        remaining_turns: u32,
        transcript_window: &str,
        memory_context: &str,
    ) -> String {
        let mut prompt = format!(
            "The council is deliberating on:\n{human_prompt}\n\n{phase_context}\n"
        );
        if !guidance.is_empty() {
            prompt.push_str("Guidance for this phase:\n");
            for line in guidance {
                prompt.push_str(&format!("  - {}\n", line));
            }
        }
        prompt.push_str(&format!(
            "\nYou will speak {remaining_turns} more time(s) in this phase, counting this turn.\n"
        ));
        if !transcript_window.is_empty() {
            prompt.push_str(&format!("\nRecent discussion:\n{transcript_window}\n"));
        }
        if !memory_context.is_empty() {
            prompt.push_str(&format!("\nYour durable memory:\n{memory_context}\n"));
        }
        prompt.push_str(&format!(
            "\nIt is your turn. Choose exactly one action:\n\
             - CONTRIBUTE: add to the discussion. Fields: {{\"action\":\"CONTRIBUTE\",\"message\":\"…\"}}\n\
             - PASS: yield your turn. Fields: {{\"action\":\"PASS\",\"reason\":\"…\"}}\n\
             - CALL_VOTE: move a motion. Fields: {{\"action\":\"CALL_VOTE\",\"title\":\"…\",\"text\":\"…\",\"decisionIfPass\":\"…\"}}\n\n\
             {length_table}\n{contract}",
            length_table = length_table(),
            contract = SINGLE_LINE_CONTRACT,
        ));
        prompt
    }

    /// Seconding prompt: will this non-caller second the motion?
    pub fn seconding(motion: &Motion, proposer_name: &str, phase_context: &str) -> String {
        format!(
            "{phase_context}\n\
             {proposer_name} has moved the following motion:\n\
             Title: {title}\n\
             Motion: {text}\n\
             If passed, the council resolves: {decision}\n\n\
             Do you second this motion so it can go to a vote? Seconding is not a YES vote; \
             it only means the motion deserves the council's decision.\n\n\
             Respond: {{\"second\":true|false,\"rationale\":\"…\"}} \
             (rationale at most {max_rationale} characters). {contract}",
            title = motion.title,
            text = motion.text,
            decision = motion.decision_if_pass,
            max_rationale = MAX_RATIONALE_CHARS,
            contract = SINGLE_LINE_CONTRACT,
        )
    }

    /// Vote prompt: blind ballot on a seconded motion.
    pub fn vote(motion: &Motion, proposer_name: &str, phase_context: &str) -> String {
        format!(
            "{phase_context}\n\
             The council is voting on a motion moved by {proposer_name}:\n\
             Title: {title}\n\
             Motion: {text}\n\
             If passed, the council resolves: {decision}\n\n\
             Cast your ballot. You will not see other ballots before voting closes.\n\n\
             Respond: {{\"ballot\":\"YES\"|\"NO\"|\"ABSTAIN\",\"rationale\":\"…\"}} \
             (rationale at most {max_rationale} characters). {contract}",
            title = motion.title,
            text = motion.text,
            decision = motion.decision_if_pass,
            max_rationale = MAX_RATIONALE_CHARS,
            contract = SINGLE_LINE_CONTRACT,
        )
    }

    /// Leader-election prompt: pick a chair from the declared members.
    pub fn leader_election(config: &CouncilConfig, human_prompt: &str) -> String {
        let mut prompt = format!(
            "The council \"{name}\" convenes to deliberate on:\n{human_prompt}\n\n\
             Before discussion begins, elect a leader to chair the session and deliver the \
             closing summary. Candidates:\n",
            name = config.name,
        );
        for member in &config.members {
            prompt.push_str(&format!(
                "  - {} ({}): {}\n",
                member.id, member.name, member.role
            ));
        }
        prompt.push_str(&format!(
            "\nVote for exactly one candidate by id. You may vote for yourself.\n\n\
             Respond: {{\"candidateId\":\"…\",\"rationale\":\"…\"}} \
             (rationale at most {max_rationale} characters). {contract}",
            max_rationale = MAX_RATIONALE_CHARS,
            contract = SINGLE_LINE_CONTRACT,
        ));
        prompt
    }

    /// Leader summary prompt: structured closing statement.
    pub fn leader_summary(
        human_prompt: &str,
        phase_results: &[PhaseResult],
        transcript_window: &str,
    ) -> String {
        let mut prompt = format!(
            "As the elected leader, close the session on:\n{human_prompt}\n\nPhase outcomes:\n"
        );
        for result in phase_results {
            prompt.push_str(&format!(
                "  - {} ({}): {}\n",
                result.phase_id,
                result.ended_by.as_str(),
                result.final_resolution
            ));
        }
        if !transcript_window.is_empty() {
            prompt.push_str(&format!("\nClosing discussion:\n{transcript_window}\n"));
        }
        prompt.push_str(&format!(
            "\nWrite the leader summary. Respond: \
             {{\"summaryMarkdown\":\"…\",\"finalResolution\":\"…\",\"requiresExecution\":true|false,\
             \"executionBrief\":\"…\"}}. \
             Include \"executionBrief\" only when requiresExecution is true. {contract}",
            contract = SINGLE_LINE_CONTRACT,
        ));
        prompt
    }

    /// Documentation draft prompt. Free text, not JSON.
    pub fn documentation_draft(
        human_prompt: &str,
        final_resolution: &str,
        phase_results: &[PhaseResult],
    ) -> String {
        let mut prompt = format!(
            "The council deliberated on:\n{human_prompt}\n\n\
             Adopted resolution: {final_resolution}\n\nPhase outcomes:\n"
        );
        for result in phase_results {
            prompt.push_str(&format!(
                "  - {} ({}): {}\n",
                result.phase_id,
                result.ended_by.as_str(),
                result.final_resolution
            ));
        }
        prompt.push_str(
            "\nWrite the documentation artifact for this outcome as well-structured markdown. \
             Cover the decision, the reasoning that led to it, rejected alternatives, and open \
             risks. Respond with the markdown document only.",
        );
        prompt
    }

    /// Reviewer feedback prompt. Structured JSON.
    pub fn documentation_feedback(draft: &str, ballot_rationale: &str) -> String {
        format!(
            "You voted against approving (or abstained on) the documentation draft below, \
             saying: \"{ballot_rationale}\".\n\n\
             --- DRAFT ---\n{draft}\n--- END DRAFT ---\n\n\
             Provide actionable review feedback. criticalBlockers lists at most 5 defects that \
             must be fixed before approval; suggestedChanges lists at most 6 improvements.\n\n\
             Respond: {{\"criticalBlockers\":[{{\"id\":\"B1\",\"section\":\"…\",\"problem\":\"…\",\
             \"impact\":\"…\",\"requiredChange\":\"…\",\"severity\":\"high\"|\"medium\"|\"low\"}}],\
             \"suggestedChanges\":[\"…\"]}}. {contract}",
            contract = SINGLE_LINE_CONTRACT,
        )
    }

    /// Documentation approval-vote prompt.
    pub fn documentation_approval(draft: &str, revision: u32) -> String {
        format!(
            "Review revision {revision} of the session documentation:\n\n\
             --- DRAFT ---\n{draft}\n--- END DRAFT ---\n\n\
             Vote YES to approve it as the council's documentation artifact, NO to demand \
             another revision, or ABSTAIN.\n\n\
             Respond: {{\"ballot\":\"YES\"|\"NO\"|\"ABSTAIN\",\"rationale\":\"…\"}} \
             (rationale at most {max_rationale} characters). {contract}",
            max_rationale = MAX_RATIONALE_CHARS,
            contract = SINGLE_LINE_CONTRACT,
        )
    }

    /// Revision prompt: the leader rewrites the draft using reviewer feedback.
    pub fn documentation_revision(prior_draft: &str, feedback_json: &str) -> String {
        format!(
            "The council did not approve your documentation draft. Revise it.\n\n\
             --- PRIOR DRAFT ---\n{prior_draft}\n--- END PRIOR DRAFT ---\n\n\
             Reviewer feedback (JSON):\n{feedback_json}\n\n\
             Address every critical blocker; apply suggested changes where they improve the \
             document. Respond with the full revised markdown document only.",
        )
    }
}
