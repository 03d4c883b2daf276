// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

/// Mirrors the host import machinery's module-finder hook (spec.md §4.1):
/// the instrumenter intercepts exactly the target module and its
/// transitively loaded source modules for full instrumentation; everything
/// else (third-party, standard-library) gets only the unwrap adapter.
pub trait ModuleFinder: Send + Sync {
    /// True if `qualified_name` is part of the target's own source tree and
    /// should receive the full adapter chain.
    fn is_first_party(&self, qualified_name: &str) -> bool;
}

/// Prefix-based module finder: anything rooted at `target_package` (the
/// module path passed to the invocation contract, spec.md §6) is considered
/// first-party.
pub struct TargetModuleFinder {
    target_package: String,
}

impl TargetModuleFinder {
    pub fn new(target_package: impl Into<String>) -> Self {
        Self { target_package: target_package.into() }
    }
}

impl ModuleFinder for TargetModuleFinder {
    fn is_first_party(&self, qualified_name: &str) -> bool {
        qualified_name == self.target_package
            || qualified_name.starts_with(&format!("{}.", self.target_package))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_submodules_but_not_siblings() {
        let finder = TargetModuleFinder::new("pkg.mod");
        assert!(finder.is_first_party("pkg.mod"));
        assert!(finder.is_first_party("pkg.mod.sub"));
        assert!(!finder.is_first_party("pkg.mod_other"));
        assert!(!finder.is_first_party("stdlib.json"));
    }
}
