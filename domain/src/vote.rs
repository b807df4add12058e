//! Ballots and vote arithmetic.
//!
//! The denominator for every motion is the full council size, never the
//! number of ballots returned. Abstentions either count against the motion
//! or are ignored, per the phase governance.

use crate::phase::Governance;
use serde::{Deserialize, Serialize};

/// One member's vote on a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Ballot {
    Yes,
    No,
    Abstain,
}

impl Ballot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ballot::Yes => "YES",
            Ballot::No => "NO",
            Ballot::Abstain => "ABSTAIN",
        }
    }

    /// Parse a ballot keyword, case-insensitively.
    pub fn parse(text: &str) -> Option<Ballot> {
        match text.trim().to_uppercase().as_str() {
            "YES" => Some(Ballot::Yes),
            "NO" => Some(Ballot::No),
            "ABSTAIN" => Some(Ballot::Abstain),
            _ => None,
        }
    }
}

impl std::fmt::Display for Ballot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregated result of tallying ballots under a governance rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteTally {
    pub passed: bool,
    pub yes_votes: usize,
    /// NO count after abstain folding.
    pub no_votes_effective: usize,
    /// The denominator: full council size.
    pub total_council_size: usize,
    pub majority_threshold: f64,
}

impl VoteTally {
    /// Tally `ballots` against the full council of `council_size` members.
    ///
    /// At the default 0.5 threshold a strict majority is required
    /// (`floor(n/2) + 1` YES votes); at any other threshold the requirement
    /// is `ceil(n * threshold)`. Members who returned no ballot count the
    /// same as abstainers for the denominator.
    ///
    /// # Example
    ///
    /// ```
    /// use council_domain::phase::Governance;
    /// use council_domain::vote::{Ballot, VoteTally};
    ///
    /// let governance = Governance {
    ///     require_seconding: true,
    ///     majority_threshold: 0.5,
    ///     abstain_counts_as_no: true,
    /// };
    /// let tally = VoteTally::count(
    ///     &[Ballot::Yes, Ballot::Yes, Ballot::No],
    ///     &governance,
    ///     3,
    /// );
    /// assert!(tally.passed);
    /// assert_eq!(tally.yes_votes, 2);
    /// ```
    pub fn count(ballots: &[Ballot], governance: &Governance, council_size: usize) -> Self {
        let yes_votes = ballots.iter().filter(|b| **b == Ballot::Yes).count();
        let no_votes = ballots.iter().filter(|b| **b == Ballot::No).count();

        let no_votes_effective = if governance.abstain_counts_as_no {
            council_size - yes_votes
        } else {
            no_votes
        };

        let threshold = governance.majority_threshold;
        let required_yes = if threshold == 0.5 {
            council_size / 2 + 1
        } else {
            (council_size as f64 * threshold).ceil() as usize
        };

        Self {
            passed: yes_votes >= required_yes,
            yes_votes,
            no_votes_effective,
            total_council_size: council_size,
            majority_threshold: threshold,
        }
    }

    /// Visual summary of the tally (e.g. `3Y/2N of 5`).
    pub fn summary(&self) -> String {
        format!(
            "{}Y/{}N of {}",
            self.yes_votes, self.no_votes_effective, self.total_council_size
        )
    }
}
