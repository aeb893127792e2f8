use accounts_helper_core::{Category, TransactionRecord};
use uuid::Uuid;

use crate::matcher::{CategoryMapping, CategoryMatcher};

/// A category assignment made by [`reapply_mappings_to_unknown_transactions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChange {
    pub transaction_id: Uuid,
    pub category: Category,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapplyOutcome {
    pub changes: Vec<CategoryChange>,
    /// Mappings whose usage count went up, in their final state.
    pub used_mappings: Vec<CategoryMapping>,
}

/// Fills in the category of every uncategorised record whose payee now
/// matches a learned mapping.
///
/// Every record is matched against the mappings as they stood on entry; usage
/// counts are only bumped once the scan is done, so record order never
/// changes a decision. Records that already have a category are never
/// touched. Running this twice changes nothing the second time.
pub fn reapply_mappings_to_unknown_transactions(
    matcher: &mut CategoryMatcher,
    records: &mut [TransactionRecord],
) -> ReapplyOutcome {
    let decisions: Vec<(usize, usize)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.category.is_unknown() && !r.payee.trim().is_empty())
        .filter_map(|(i, r)| matcher.best_index(&r.payee).map(|(m, _)| (i, m)))
        .filter(|&(_, m)| !matcher.mappings()[m].category.is_unknown())
        .collect();

    let mut outcome = ReapplyOutcome::default();
    for (record_idx, mapping_idx) in decisions {
        let used = matcher.record_use(mapping_idx);
        let record = &mut records[record_idx];
        record.category = used.category;
        outcome.changes.push(CategoryChange {
            transaction_id: record.id,
            category: used.category,
        });
        match outcome
            .used_mappings
            .iter_mut()
            .find(|m| m.normalized_key == used.normalized_key && m.category == used.category)
        {
            Some(existing) => *existing = used,
            None => outcome.used_mappings.push(used),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use accounts_helper_core::{Currency, ReconcilableAccount};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn record(payee: &str, category: Category) -> TransactionRecord {
        TransactionRecord::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            Decimal::new(1999, 2),
            Currency::Gbp,
            ReconcilableAccount::VisaGbp,
            payee,
        )
        .with_category(category)
    }

    fn matcher() -> CategoryMatcher {
        let mut matcher = CategoryMatcher::default();
        matcher.teach_mapping("tesco", Category::Groceries);
        matcher.teach_mapping("netflix", Category::Subscriptions);
        matcher
    }

    #[test]
    fn fills_unknown_categories() {
        let mut matcher = matcher();
        let mut records = vec![
            record("TESCO STORES 2231", Category::Unknown),
            record("Netflix.com", Category::Unknown),
            record("Corner shop", Category::Unknown),
        ];
        let outcome = reapply_mappings_to_unknown_transactions(&mut matcher, &mut records);
        assert_eq!(outcome.changes.len(), 2);
        assert_eq!(records[0].category, Category::Groceries);
        assert_eq!(records[1].category, Category::Subscriptions);
        assert_eq!(records[2].category, Category::Unknown);
    }

    #[test]
    fn leaves_categorised_records_alone() {
        let mut matcher = matcher();
        let mut records = vec![record("Tesco", Category::Gifts)];
        let outcome = reapply_mappings_to_unknown_transactions(&mut matcher, &mut records);
        assert!(outcome.changes.is_empty());
        assert_eq!(records[0].category, Category::Gifts);
    }

    #[test]
    fn skips_blank_payees() {
        let mut matcher = matcher();
        let mut records = vec![record("  ", Category::Unknown)];
        let outcome = reapply_mappings_to_unknown_transactions(&mut matcher, &mut records);
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn is_idempotent() {
        let mut matcher = matcher();
        let mut records = vec![
            record("tesco express", Category::Unknown),
            record("NETFLIX", Category::Unknown),
            record("unmatched", Category::Unknown),
            record("tesco", Category::Travel),
        ];
        reapply_mappings_to_unknown_transactions(&mut matcher, &mut records);
        let after_first: Vec<Category> = records.iter().map(|r| r.category).collect();
        let usage_after_first = matcher.mappings().to_vec();

        let second = reapply_mappings_to_unknown_transactions(&mut matcher, &mut records);
        let after_second: Vec<Category> = records.iter().map(|r| r.category).collect();

        assert!(second.changes.is_empty());
        assert_eq!(after_first, after_second);
        assert_eq!(matcher.mappings(), usage_after_first.as_slice());
        assert_eq!(after_second[3], Category::Travel);
    }

    #[test]
    fn decisions_ignore_usage_bumped_earlier_in_the_pass() {
        let mapping = |key: &str, category| CategoryMapping {
            normalized_key: key.to_string(),
            category,
            usage_count: 2,
        };
        let mut matcher = CategoryMatcher::new(vec![
            mapping("uber", Category::Transport),
            mapping("eats", Category::DiningOut),
        ]);
        let expected = matcher.match_category("paypal uber eats");
        let mut records = vec![
            record("x eats", Category::Unknown),
            record("paypal uber eats", Category::Unknown),
        ];

        let outcome = reapply_mappings_to_unknown_transactions(&mut matcher, &mut records);

        assert_eq!(expected, Category::Transport);
        assert_eq!(records[0].category, Category::DiningOut);
        assert_eq!(records[1].category, expected);
        let usage: Vec<u32> = matcher.mappings().iter().map(|m| m.usage_count).collect();
        assert_eq!(usage, vec![3, 3]);
        assert_eq!(outcome.used_mappings.len(), 2);
    }

    #[test]
    fn reports_final_usage_once_per_mapping() {
        let mut matcher = matcher();
        let mut records = vec![
            record("tesco a", Category::Unknown),
            record("tesco b", Category::Unknown),
        ];
        let outcome = reapply_mappings_to_unknown_transactions(&mut matcher, &mut records);
        assert_eq!(outcome.used_mappings.len(), 1);
        assert_eq!(outcome.used_mappings[0].usage_count, 3);
    }
}
