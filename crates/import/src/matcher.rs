use accounts_helper_core::Category;
use serde::{Deserialize, Serialize};

/// A learned association between a payee fragment and a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub normalized_key: String,
    pub category: Category,
    pub usage_count: u32,
}

/// Which comparison produced a match. Tiers are tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchTier {
    /// Key equals the input.
    Exact,
    /// Input starts with the key ("star" matches "starbucks coffee").
    Prefix,
    /// Key appears anywhere in the input.
    Contains,
}

impl MatchTier {
    const ORDER: [MatchTier; 3] = [MatchTier::Exact, MatchTier::Prefix, MatchTier::Contains];

    fn matches(self, input: &str, key: &str) -> bool {
        match self {
            MatchTier::Exact => input == key,
            MatchTier::Prefix => input.starts_with(key),
            MatchTier::Contains => input.contains(key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome<'a> {
    pub mapping: &'a CategoryMapping,
    pub tier: MatchTier,
}

pub const DEFAULT_SEED_USAGE: u32 = 1;

pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Learns payee → category mappings and applies them to new payees.
///
/// Mappings are kept in insertion order and scanned linearly. The first tier
/// with any match decides; inside that tier the highest usage count wins and
/// remaining ties go to the earliest mapping.
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    mappings: Vec<CategoryMapping>,
    seed_usage: u32,
}

impl Default for CategoryMatcher {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CategoryMatcher {
    pub fn new(mappings: Vec<CategoryMapping>) -> Self {
        Self {
            mappings,
            seed_usage: DEFAULT_SEED_USAGE,
        }
    }

    /// Usage count given to newly taught keys. Clamped to at least 1 so a new
    /// mapping can beat one that was loaded with a zero count.
    pub fn with_seed_usage(mut self, seed: u32) -> Self {
        self.seed_usage = seed.max(1);
        self
    }

    pub fn mappings(&self) -> &[CategoryMapping] {
        &self.mappings
    }

    pub fn match_detail(&self, input: &str) -> Option<MatchOutcome<'_>> {
        self.best_index(input).map(|(idx, tier)| MatchOutcome {
            mapping: &self.mappings[idx],
            tier,
        })
    }

    /// The category for `input`, or [`Category::Unknown`] when nothing matches.
    pub fn match_category(&self, input: &str) -> Category {
        self.match_detail(input)
            .map(|m| m.mapping.category)
            .unwrap_or(Category::Unknown)
    }

    /// Like [`Self::match_category`], but counts the use against the winning
    /// mapping. Returns the updated mapping alongside the category.
    pub fn apply_category(&mut self, input: &str) -> (Category, Option<CategoryMapping>) {
        match self.best_index(input) {
            Some((idx, _)) => {
                let used = self.record_use(idx);
                (used.category, Some(used))
            }
            None => (Category::Unknown, None),
        }
    }

    pub(crate) fn record_use(&mut self, idx: usize) -> CategoryMapping {
        let mapping = &mut self.mappings[idx];
        mapping.usage_count = mapping.usage_count.saturating_add(1);
        mapping.clone()
    }

    /// Records that `input` belongs to `category`.
    ///
    /// An existing key is updated in place (category replaced, usage bumped)
    /// rather than duplicated. Returns `None` for blank input.
    pub fn teach_mapping(&mut self, input: &str, category: Category) -> Option<CategoryMapping> {
        let key = normalize(input);
        if key.is_empty() {
            return None;
        }

        let same_pair = self
            .mappings
            .iter()
            .position(|m| m.normalized_key == key && m.category == category);
        let same_key = || self.mappings.iter().position(|m| m.normalized_key == key);

        let idx = match same_pair.or_else(same_key) {
            Some(idx) => {
                let mapping = &mut self.mappings[idx];
                mapping.category = category;
                mapping.usage_count = mapping.usage_count.saturating_add(1);
                idx
            }
            None => {
                self.mappings.push(CategoryMapping {
                    normalized_key: key,
                    category,
                    usage_count: self.seed_usage,
                });
                self.mappings.len() - 1
            }
        };
        Some(self.mappings[idx].clone())
    }

    pub(crate) fn best_index(&self, input: &str) -> Option<(usize, MatchTier)> {
        let input = normalize(input);
        if input.is_empty() {
            return None;
        }

        MatchTier::ORDER.into_iter().find_map(|tier| {
            let mut best: Option<usize> = None;
            for (idx, mapping) in self.mappings.iter().enumerate() {
                if mapping.normalized_key.is_empty() || !tier.matches(&input, &mapping.normalized_key)
                {
                    continue;
                }
                // Strictly greater keeps the earliest mapping on ties.
                if best.map_or(true, |b| mapping.usage_count > self.mappings[b].usage_count) {
                    best = Some(idx);
                }
            }
            best.map(|idx| (idx, tier))
        })
    }
}
