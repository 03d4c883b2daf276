// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::fitness::ProgramGraphs;
use crate::goals::CoverageGoal;
use crate::rng::RngContext;
use indexmap::{IndexMap, IndexSet};

/// Coverage archive (spec.md §3, §4.5): one slot per goal, holding the
/// shortest individual observed to cover it. Archive updates inside an
/// iteration are serialized in insertion order; ties are broken by strictly
/// shorter length winning, later insertion losing (spec.md §5 "Ordering
/// guarantees").
#[derive(Clone)]
pub struct CoverageArchive<C> {
    all_goals: IndexSet<CoverageGoal>,
    covered: IndexMap<CoverageGoal, Entry<C>>,
}

#[derive(Clone)]
struct Entry<C> {
    individual: C,
    length: usize,
    generation: u64,
}

impl<C: Clone> CoverageArchive<C> {
    pub fn new(goals: impl IntoIterator<Item = CoverageGoal>) -> Self {
        Self { all_goals: goals.into_iter().collect(), covered: IndexMap::new() }
    }

    pub fn add_goals(&mut self, goals: impl IntoIterator<Item = CoverageGoal>) {
        self.all_goals.extend(goals);
    }

    pub fn remove_goals(&mut self, goals: impl IntoIterator<Item = CoverageGoal>) {
        for goal in goals {
            self.all_goals.shift_remove(&goal);
            self.covered.shift_remove(&goal);
        }
    }

    pub fn uncovered(&self) -> impl Iterator<Item = CoverageGoal> + '_ {
        self.all_goals.iter().copied().filter(|g| !self.covered.contains_key(g))
    }

    pub fn is_covered(&self, goal: &CoverageGoal) -> bool {
        self.covered.contains_key(goal)
    }

    pub fn total_goals(&self) -> usize {
        self.all_goals.len()
    }

    pub fn covered_count(&self) -> usize {
        self.covered.len()
    }

    pub fn coverage_ratio(&self) -> f64 {
        if self.all_goals.is_empty() {
            1.0
        } else {
            self.covered.len() as f64 / self.all_goals.len() as f64
        }
    }

    /// Records `individual` (of statement-length `length`) as covering every
    /// goal in `covers`, replacing the current holder exactly when empty or
    /// strictly shorter (spec.md §4.5 "Updating with a new individual").
    pub fn update(&mut self, individual: &C, length: usize, generation: u64, covers: impl IntoIterator<Item = CoverageGoal>) {
        for goal in covers {
            if !self.all_goals.contains(&goal) {
                continue;
            }
            let replace = match self.covered.get(&goal) {
                None => true,
                Some(existing) => length < existing.length,
            };
            if replace {
                self.covered.insert(goal, Entry { individual: individual.clone(), length, generation });
            }
        }
    }

    pub fn best_for(&self, goal: &CoverageGoal) -> Option<&C> {
        self.covered.get(goal).map(|e| &e.individual)
    }

    pub fn generation_for(&self, goal: &CoverageGoal) -> Option<u64> {
        self.covered.get(goal).map(|e| e.generation)
    }

    /// The final suite: one copy per distinct archived individual, the
    /// "survivors... emitted as final suite" step of spec.md §4.6.
    pub fn distinct_individuals(&self) -> Vec<&C>
    where
        C: PartialEq,
    {
        let mut out: Vec<&C> = Vec::new();
        for entry in self.covered.values() {
            if !out.iter().any(|existing| **existing == entry.individual) {
                out.push(&entry.individual);
            }
        }
        out
    }
}

/// DynaMOSA's activation frontier (spec.md §4.5): initially the root goals;
/// covering an active goal activates its CDG children, so preference
/// sorting never wastes budget on provably unreachable targets.
pub struct DynaMosaGoalManager {
    active: IndexSet<CoverageGoal>,
}

impl DynaMosaGoalManager {
    pub fn new(graphs: &ProgramGraphs) -> Self {
        Self { active: graphs.root_goals().into_iter().collect() }
    }

    pub fn active_goals(&self) -> impl Iterator<Item = CoverageGoal> + '_ {
        self.active.iter().copied()
    }

    /// Activates the CDG children of every goal in `newly_covered` that
    /// isn't already active, returning the freshly activated set.
    pub fn activate(&mut self, newly_covered: &[CoverageGoal], graphs: &ProgramGraphs) -> Vec<CoverageGoal> {
        let mut activated = Vec::new();
        for goal in newly_covered {
            self.active.shift_remove(goal);
            for child in graphs.child_goals(*goal) {
                if self.active.insert(child) {
                    activated.push(child);
                }
            }
        }
        activated
    }
}

/// A MIO archive entry: an individual, its h-value, and how many times it
/// has been sampled (spec.md §3, §4.5).
#[derive(Clone)]
pub struct MioEntry<C> {
    pub individual: C,
    pub h_value: f64,
    pub length: usize,
    pub sample_count: u32,
}

/// Adaptive exploration/exploitation parameters (spec.md §4.5): advance
/// linearly from `(Pr=0.5, n=5, m=1)` to `(Pr=0, n=1, m=10)` as
/// `covered/total` crosses `focus_threshold`.
#[derive(Debug, Clone, Copy)]
pub struct MioParams {
    pub sample_fresh_probability: f64,
    pub population_cap: usize,
    pub mutations_per_iteration: u32,
}

pub fn mio_params_at(progress: f64, focus_threshold: f64) -> MioParams {
    let t = (progress / focus_threshold).clamp(0.0, 1.0);
    MioParams {
        sample_fresh_probability: 0.5 * (1.0 - t),
        population_cap: (5.0 - 4.0 * t).round().max(1.0) as usize,
        mutations_per_iteration: (1.0 + 9.0 * t).round().max(1.0) as u32,
    }
}

/// Per-goal bounded population sorted by h-value descending, ties broken by
/// length ascending (spec.md §4.5).
pub struct MioArchive<C> {
    populations: IndexMap<CoverageGoal, Vec<MioEntry<C>>>,
}

impl<C: Clone> MioArchive<C> {
    pub fn new() -> Self {
        Self { populations: IndexMap::new() }
    }

    pub fn record(&mut self, goal: CoverageGoal, individual: C, h_value: f64, length: usize, cap: usize) {
        let pop = self.populations.entry(goal).or_default();
        pop.push(MioEntry { individual, h_value, length, sample_count: 0 });
        pop.sort_by(|a, b| {
            b.h_value
                .partial_cmp(&a.h_value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.length.cmp(&b.length))
        });
        pop.truncate(cap.max(1));
    }

    pub fn shrink_to(&mut self, cap: usize) {
        for pop in self.populations.values_mut() {
            pop.truncate(cap.max(1));
        }
    }

    /// Draws fresh with probability `params.sample_fresh_probability`; else
    /// picks from the goal's population, preferring low sample-count
    /// entries, with random tie-break (spec.md §4.5).
    pub fn sample(&mut self, goal: &CoverageGoal, params: &MioParams, rng: &RngContext) -> Option<C> {
        if rng.gen_bool(params.sample_fresh_probability) {
            return None;
        }
        let pop = self.populations.get_mut(goal)?;
        if pop.is_empty() {
            return None;
        }
        let min_samples = pop.iter().map(|e| e.sample_count).min()?;
        let candidates: Vec<usize> =
            (0..pop.len()).filter(|&i| pop[i].sample_count == min_samples).collect();
        let chosen = *rng.choose(&candidates)?;
        pop[chosen].sample_count += 1;
        Some(pop[chosen].individual.clone())
    }

    pub fn covered_count(&self) -> usize {
        self.populations.values().filter(|pop| pop.iter().any(|e| e.h_value >= 1.0)).count()
    }

    /// Best (highest h-value) individual recorded for `goal`, if any — the
    /// survivor MIO emits into the final suite for that target.
    pub fn best(&self, goal: &CoverageGoal) -> Option<&C> {
        self.populations.get(goal).and_then(|pop| pop.first()).map(|e| &e.individual)
    }

    /// Goals whose population contains a fully-covering individual
    /// (`h_value >= 1.0`).
    pub fn covered_goals(&self) -> impl Iterator<Item = CoverageGoal> + '_ {
        self.populations.iter().filter(|(_, pop)| pop.iter().any(|e| e.h_value >= 1.0)).map(|(&g, _)| g)
    }
}

impl<C: Clone> Default for MioArchive<C> {
    fn default() -> Self {
        Self::new()
    }
}
