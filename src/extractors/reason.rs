// src/extractors/reason.rs

/// Category of the reason a report was filed (提出事由).
/// Stored as its integer code in `reports.reason_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReasonType {
    #[default]
    Unclassified,
    /// Holding ratio rose by 1% or more.
    HoldingIncrease,
    /// Holding ratio fell by 1% or more.
    HoldingDecrease,
    NewFiling,
    Change,
    Correction,
    ReferenceDateChange,
}

impl ReasonType {
    pub fn code(self) -> i64 {
        match self {
            ReasonType::Unclassified => 0,
            ReasonType::HoldingIncrease => 1,
            ReasonType::HoldingDecrease => 2,
            ReasonType::NewFiling => 3,
            ReasonType::Change => 4,
            ReasonType::Correction => 5,
            ReasonType::ReferenceDateChange => 6,
        }
    }
}

// Checked top to bottom. "変更" sits above "訂正", so a correction of a change
// report ("訂正報告書（変更報告書）") lands in Change.
const REASON_RULES: &[(&str, ReasonType)] = &[
    ("株券等保有割合が1%以上増加", ReasonType::HoldingIncrease),
    ("株券等保有割合が1%以上減少", ReasonType::HoldingDecrease),
    ("新規", ReasonType::NewFiling),
    ("変更", ReasonType::Change),
    ("訂正", ReasonType::Correction),
    ("基準日", ReasonType::ReferenceDateChange),
];

/// Maps free-text filing reasons onto [`ReasonType`] by substring match.
#[derive(Debug, Clone, Copy)]
pub struct ReasonCategorizer {
    rules: &'static [(&'static str, ReasonType)],
}

impl Default for ReasonCategorizer {
    fn default() -> Self {
        Self { rules: REASON_RULES }
    }
}

impl ReasonCategorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// First rule whose phrase occurs in `text` wins; empty or unmatched text
    /// is `Unclassified`.
    pub fn categorize(&self, text: &str) -> ReasonType {
        if text.is_empty() {
            return ReasonType::Unclassified;
        }
        self.rules
            .iter()
            .find(|(phrase, _)| text.contains(phrase))
            .map(|(_, reason)| *reason)
            .unwrap_or(ReasonType::Unclassified)
    }
}
