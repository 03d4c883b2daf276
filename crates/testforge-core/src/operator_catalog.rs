// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Canonical list of mutation-operator names (spec.md §4.8), kept here
//! rather than in `testforge-assert` so [`GeneratorConfig::validate`] can
//! check `mutation_operators` entries against it without a crate-graph
//! cycle. `testforge-assert::operators::ALL_OPERATORS` mirrors this list.

use once_cell::sync::Lazy;
use std::collections::HashSet;

pub const ALL_OPERATORS: &[&str] = &[
    "arithmetic_replace",
    "unary_delete",
    "compare_replace",
    "boolean_swap",
    "logical_negation_delete",
    "branch_invert",
    "exception_type_swap",
    "constant_tweak",
];

static ALL_OPERATORS_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| ALL_OPERATORS.iter().copied().collect());

pub fn is_known_operator(name: &str) -> bool {
    ALL_OPERATORS_SET.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_entry_is_known() {
        for name in ALL_OPERATORS {
            assert!(is_known_operator(name));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(!is_known_operator("not_a_real_operator"));
    }
}
