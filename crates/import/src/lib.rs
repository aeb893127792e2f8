pub mod matcher;
pub mod reapply;

pub use matcher::{normalize, CategoryMapping, CategoryMatcher, MatchOutcome, MatchTier};
pub use reapply::{reapply_mappings_to_unknown_transactions, CategoryChange, ReapplyOutcome};
