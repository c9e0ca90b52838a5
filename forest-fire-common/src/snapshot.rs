use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete state of a tree cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Fine,
    Burning,
    BurnedOut,
    Survivor,
}

impl Condition {
    /// All conditions in output column order.
    pub const ALL: [Condition; 4] = [
        Condition::Fine,
        Condition::Burning,
        Condition::BurnedOut,
        Condition::Survivor,
    ];

    /// Column label used in tabular output.
    pub fn label(self) -> &'static str {
        match self {
            Condition::Fine => "Fine",
            Condition::Burning => "Burning",
            Condition::BurnedOut => "BurnedOut",
            Condition::Survivor => "Survivor",
        }
    }

    /// `BurnedOut` and `Survivor` never change again.
    pub fn is_resolved(self) -> bool {
        matches!(self, Condition::BurnedOut | Condition::Survivor)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Number of occupied cells in each condition at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionCounts {
    pub fine: u32,
    pub burning: u32,
    pub burned_out: u32,
    pub survivor: u32,
}

impl ConditionCounts {
    /// Tallies conditions from any iterator, e.g. over the cells of a grid.
    pub fn tally<I: IntoIterator<Item = Condition>>(conditions: I) -> Self {
        let mut counts = Self::default();
        for condition in conditions {
            counts.add(condition);
        }
        counts
    }

    pub fn add(&mut self, condition: Condition) {
        match condition {
            Condition::Fine => self.fine += 1,
            Condition::Burning => self.burning += 1,
            Condition::BurnedOut => self.burned_out += 1,
            Condition::Survivor => self.survivor += 1,
        }
    }

    pub fn get(&self, condition: Condition) -> u32 {
        match condition {
            Condition::Fine => self.fine,
            Condition::Burning => self.burning,
            Condition::BurnedOut => self.burned_out,
            Condition::Survivor => self.survivor,
        }
    }

    /// Sum over all four conditions; equals the number of occupied cells.
    pub fn total(&self) -> u32 {
        self.fine + self.burning + self.burned_out + self.survivor
    }
}

/// Condition counts of one run at one recorded step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Row index of the run within the sweep.
    pub run: usize,
    /// Repeat number of the run's parameter combination.
    pub iteration: u32,
    /// Step number; 0 is the state right after initialisation.
    pub step: u32,
    pub counts: ConditionCounts,
}
