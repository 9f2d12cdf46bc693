//! Property-based tests for the cycle-prevention stack.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use crate::model::RelationReference;
    use crate::resolver::LookupStack;

    /// Strategy generating relation references over a small alphabet so
    /// that collisions are frequent.
    fn reference_strategy() -> impl Strategy<Value = RelationReference> {
        ("[a-c]{1,2}", "[a-d]{1,2}").prop_map(|(ns, rel)| RelationReference::new(ns, rel))
    }

    fn extend(base: &LookupStack, references: &[RelationReference]) -> LookupStack {
        references
            .iter()
            .fold(base.clone(), |stack, reference| stack.with(reference.clone()))
    }

    proptest! {
        #[test]
        fn test_has_every_reference_along_a_with_chain(
            references in proptest::collection::vec(reference_strategy(), 0..20),
        ) {
            let stack = extend(&LookupStack::new(), &references);
            for reference in &references {
                prop_assert!(stack.has(reference));
            }
            let distinct: HashSet<_> = references.iter().collect();
            prop_assert_eq!(stack.len(), distinct.len());
        }

        #[test]
        fn test_membership_matches_exactly_what_was_inserted(
            inserted in proptest::collection::vec(reference_strategy(), 0..20),
            probe in reference_strategy(),
        ) {
            let stack = extend(&LookupStack::new(), &inserted);
            prop_assert_eq!(stack.has(&probe), inserted.contains(&probe));
        }

        #[test]
        fn test_siblings_from_a_shared_prefix_are_independent(
            prefix in proptest::collection::vec(reference_strategy(), 0..10),
            left in proptest::collection::vec(reference_strategy(), 0..10),
            right in proptest::collection::vec(reference_strategy(), 0..10),
        ) {
            let base = extend(&LookupStack::new(), &prefix);
            let left_stack = extend(&base, &left);
            let right_stack = extend(&base, &right);

            // A sibling sees the shared prefix plus its own insertions,
            // never the other sibling's.
            for reference in &left {
                if !prefix.contains(reference) && !right.contains(reference) {
                    prop_assert!(!right_stack.has(reference));
                }
            }
            for reference in &right {
                if !prefix.contains(reference) && !left.contains(reference) {
                    prop_assert!(!left_stack.has(reference));
                }
            }

            // Extending never mutates the base.
            let distinct_prefix: HashSet<_> = prefix.iter().collect();
            prop_assert_eq!(base.len(), distinct_prefix.len());
            for reference in &prefix {
                prop_assert!(left_stack.has(reference));
                prop_assert!(right_stack.has(reference));
            }
        }
    }
}
