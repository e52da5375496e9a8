//! Citation identifiers and the counters that issue them
//!
//! Two disjoint id families exist:
//!
//! - planning ids, `PLAN-<NN>`, drawn from a single session-wide counter
//! - research ids, `CIT-<B>-<NN>`, drawn from one counter per block `B`

use crate::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const PLAN_PREFIX: &str = "PLAN-";
const RESEARCH_PREFIX: &str = "CIT-";

/// Sort key for ids that do not parse; orders them after everything else
pub const SORT_SENTINEL: (u32, u32, u32) = (999, 999, 999);

/// Pipeline stage a citation is issued in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stage {
    /// Plan decomposition
    Planning,
    /// Per-block research
    #[default]
    Research,
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "planning" => Ok(Stage::Planning),
            "research" => Ok(Stage::Research),
            _ => Err(Error::UnknownStage(s.to_string())),
        }
    }
}

impl Stage {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Planning => "planning",
            Stage::Research => "research",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed citation id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CitationId {
    /// `PLAN-<seq>`
    Plan(u32),
    /// `CIT-<block>-<seq>`
    Research { block: u32, seq: u32 },
}

impl CitationId {
    /// Parse a citation id; `None` for anything outside the two families
    pub fn parse(id: &str) -> Option<Self> {
        if let Some(rest) = id.strip_prefix(PLAN_PREFIX) {
            return rest.parse().ok().map(CitationId::Plan);
        }

        let rest = id.strip_prefix(RESEARCH_PREFIX)?;
        let mut parts = rest.split('-');
        let (block, seq) = match (parts.next(), parts.next(), parts.next()) {
            (Some(block), Some(seq), None) => (block, seq),
            _ => return None,
        };
        Some(CitationId::Research {
            block: block.parse().ok()?,
            seq: seq.parse().ok()?,
        })
    }

    /// Ordering key: planning ids first, then research ids by (block, seq)
    pub fn sort_key(&self) -> (u32, u32, u32) {
        match *self {
            CitationId::Plan(seq) => (0, 0, seq),
            CitationId::Research { block, seq } => (1, block, seq),
        }
    }
}

impl fmt::Display for CitationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitationId::Plan(seq) => write!(f, "{}{:02}", PLAN_PREFIX, seq),
            CitationId::Research { block, seq } => {
                write!(f, "{}{}-{:02}", RESEARCH_PREFIX, block, seq)
            }
        }
    }
}

/// Sort key for a raw id string, falling back to [`SORT_SENTINEL`]
pub fn sort_key(id: &str) -> (u32, u32, u32) {
    CitationId::parse(id)
        .map(|parsed| parsed.sort_key())
        .unwrap_or(SORT_SENTINEL)
}

/// Block number encoded in a `prefix_<n>` block id; 0 when absent or malformed
pub fn block_number(block_id: &str) -> u32 {
    block_id
        .rsplit_once('_')
        .and_then(|(_, tail)| tail.trim().parse().ok())
        .unwrap_or(0)
}

/// Session-scoped id counters, persisted alongside the citations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Counters {
    /// Last issued planning sequence number
    #[serde(default)]
    pub plan_counter: u32,
    /// Last issued sequence number per block (keyed by block number as text)
    #[serde(default)]
    pub block_counters: BTreeMap<String, u32>,
}

impl Counters {
    /// Rebuild counters from stored ids, taking the highest suffix per family
    pub fn from_ids<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counters = Self::default();
        counters.raise_to(ids);
        counters
    }

    /// Raise counters so that none is below a suffix already in use
    pub fn raise_to<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for id in ids {
            match CitationId::parse(id) {
                Some(CitationId::Plan(seq)) => {
                    self.plan_counter = self.plan_counter.max(seq);
                }
                Some(CitationId::Research { block, seq }) => {
                    let counter = self.block_counters.entry(block.to_string()).or_insert(0);
                    *counter = (*counter).max(seq);
                }
                None => {}
            }
        }
    }

    /// Issue the next planning id
    pub fn next_plan(&mut self) -> CitationId {
        self.plan_counter += 1;
        CitationId::Plan(self.plan_counter)
    }

    /// Issue the next research id for a block id such as `block_3`
    pub fn next_research(&mut self, block_id: &str) -> CitationId {
        let block = block_number(block_id);
        let counter = self.block_counters.entry(block.to_string()).or_insert(0);
        *counter += 1;
        CitationId::Research {
            block,
            seq: *counter,
        }
    }

    /// Last issued sequence number for a block number
    pub fn block(&self, block: u32) -> u32 {
        self.block_counters
            .get(&block.to_string())
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_conversion() {
        assert_eq!(Stage::from_str("planning").unwrap(), Stage::Planning);
        assert_eq!(Stage::from_str("RESEARCH").unwrap(), Stage::Research);
        assert!(matches!(
            Stage::from_str("review"),
            Err(Error::UnknownStage(_))
        ));
        assert_eq!(Stage::Planning.to_string(), "planning");
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(CitationId::parse("PLAN-03"), Some(CitationId::Plan(3)));
        assert_eq!(
            CitationId::parse("CIT-2-11"),
            Some(CitationId::Research { block: 2, seq: 11 })
        );
        assert_eq!(CitationId::parse("CIT-2"), None);
        assert_eq!(CitationId::parse("CIT-2-1-1"), None);
        assert_eq!(CitationId::parse("PLAN-x"), None);
        assert_eq!(CitationId::parse("REF-1-01"), None);

        assert_eq!(CitationId::Plan(7).to_string(), "PLAN-07");
        assert_eq!(CitationId::Plan(123).to_string(), "PLAN-123");
        assert_eq!(
            CitationId::Research { block: 4, seq: 2 }.to_string(),
            "CIT-4-02"
        );
    }

    #[test]
    fn test_sort_key_order() {
        let mut ids = vec!["CIT-2-01", "bogus", "CIT-1-10", "PLAN-02", "CIT-1-02", "PLAN-01"];
        ids.sort_by_key(|id| sort_key(id));
        assert_eq!(
            ids,
            vec!["PLAN-01", "PLAN-02", "CIT-1-02", "CIT-1-10", "CIT-2-01", "bogus"]
        );
        assert_eq!(sort_key("bogus"), SORT_SENTINEL);
    }

    #[test]
    fn test_block_number() {
        assert_eq!(block_number("block_3"), 3);
        assert_eq!(block_number("research_block_12"), 12);
        assert_eq!(block_number("block_x"), 0);
        assert_eq!(block_number("block"), 0);
        assert_eq!(block_number(""), 0);
        assert_eq!(block_number("block_-2"), 0);
    }

    #[test]
    fn test_counters_are_monotonic_per_family() {
        let mut counters = Counters::default();
        assert_eq!(counters.next_plan().to_string(), "PLAN-01");
        assert_eq!(counters.next_plan().to_string(), "PLAN-02");

        assert_eq!(counters.next_research("block_1").to_string(), "CIT-1-01");
        assert_eq!(counters.next_research("block_2").to_string(), "CIT-2-01");
        assert_eq!(counters.next_research("block_1").to_string(), "CIT-1-02");
        assert_eq!(counters.next_research("nonsense").to_string(), "CIT-0-01");

        assert_eq!(counters.plan_counter, 2);
        assert_eq!(counters.block(1), 2);
        assert_eq!(counters.block(9), 0);
    }

    #[test]
    fn test_counters_from_ids_use_max_suffix() {
        let counters = Counters::from_ids(["PLAN-01", "PLAN-03", "CIT-2-01", "CIT-2-05", "junk"]);
        assert_eq!(counters.plan_counter, 3);
        assert_eq!(counters.block(2), 5);
        assert_eq!(counters.block_counters.len(), 1);
    }
}
