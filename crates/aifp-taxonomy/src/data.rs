// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::Taxonomy;

pub fn builtin_taxonomy() -> Taxonomy {
    serde_json::from_str(include_str!("taxonomy.json")).expect("Failed to parse taxonomy.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecisionList;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_loading() {
        let taxonomy = builtin_taxonomy();
        assert!(!taxonomy.manufacturers.is_empty());

        let boeing = taxonomy
            .manufacturers
            .iter()
            .find(|m| m.name == "Boeing")
            .expect("Boeing missing");
        assert!(boeing.types.iter().any(|t| t.code == "B738"));
    }

    #[test]
    fn test_builtin_patterns_compile() {
        let taxonomy = builtin_taxonomy();
        assert!(DecisionList::compile(&taxonomy).is_ok());
    }

    #[test]
    fn test_builtin_codes_unique_per_manufacturer() {
        for mfr in builtin_taxonomy().manufacturers {
            let mut seen = HashSet::new();
            for t in &mfr.types {
                assert!(seen.insert(&t.code), "{} lists {} twice", mfr.name, t.code);
            }
        }
    }
}
