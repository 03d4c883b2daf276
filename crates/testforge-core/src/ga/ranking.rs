// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::fitness::FitnessVector;
use crate::goals::CoverageGoal;
use indexmap::IndexMap;
use itertools::Itertools;
use std::cmp::Ordering;

/// Rank 0 (spec.md §4.6 "Preference sorting"): for each goal, the single
/// individual with the lowest fitness on that goal, ties broken by shorter
/// chromosome length. A given individual may end up in rank 0 for more than
/// one goal; it still only appears once.
fn rank0(fitness: &[FitnessVector], lengths: &[usize], goals: &[CoverageGoal]) -> Vec<usize> {
    let mut chosen = std::collections::BTreeSet::new();
    for goal in goals {
        let mut best: Option<(usize, f64, usize)> = None;
        for (i, fv) in fitness.iter().enumerate() {
            let Some(&f) = fv.get(goal) else { continue };
            let len = lengths[i];
            let better = match best {
                None => true,
                Some((_, best_f, best_len)) => f < best_f || (f == best_f && len < best_len),
            };
            if better {
                best = Some((i, f, len));
            }
        }
        if let Some((i, _, _)) = best {
            chosen.insert(i);
        }
    }
    chosen.into_iter().collect()
}

fn dominates(a: &FitnessVector, b: &FitnessVector, goals: &[CoverageGoal]) -> bool {
    let mut strictly_better_somewhere = false;
    for goal in goals {
        let fa = a.get(goal).copied().unwrap_or(1.0);
        let fb = b.get(goal).copied().unwrap_or(1.0);
        if fa > fb {
            return false;
        }
        if fa < fb {
            strictly_better_somewhere = true;
        }
    }
    strictly_better_somewhere
}

fn non_dominated_fronts(fitness: &[FitnessVector], goals: &[CoverageGoal], candidates: &[usize]) -> Vec<Vec<usize>> {
    let mut remaining: Vec<usize> = candidates.to_vec();
    let mut fronts = Vec::new();
    while !remaining.is_empty() {
        let front: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&i| !remaining.iter().any(|&j| j != i && dominates(&fitness[j], &fitness[i], goals)))
            .collect();
        remaining.retain(|i| !front.contains(i));
        fronts.push(front);
    }
    fronts
}

/// Full preference sort (spec.md §4.6): rank 0 as defined above, then the
/// remaining individuals by ordinary non-dominated sorting over the
/// uncovered-goal fitness vector.
pub fn preference_sort(fitness: &[FitnessVector], lengths: &[usize], goals: &[CoverageGoal]) -> Vec<Vec<usize>> {
    let front0 = rank0(fitness, lengths, goals);
    let remaining: Vec<usize> = (0..fitness.len()).filter(|i| !front0.contains(i)).collect();
    let mut fronts = vec![front0];
    fronts.extend(non_dominated_fronts(fitness, goals, &remaining));
    fronts.retain(|f| !f.is_empty());
    fronts
}

/// Approximate crowding ("subvector") distance within one front (spec.md
/// §4.6: "approximated by fast epsilon dominance"): boundary individuals
/// for each goal get infinite distance so they are always preserved; others
/// accumulate normalized neighbor gaps.
pub fn crowding_distances(fitness: &[FitnessVector], goals: &[CoverageGoal], front: &[usize]) -> IndexMap<usize, f64> {
    let mut distances: IndexMap<usize, f64> = front.iter().map(|&i| (i, 0.0)).collect();
    if front.len() <= 2 {
        for &i in front {
            distances.insert(i, f64::INFINITY);
        }
        return distances;
    }
    for goal in goals {
        let mut sorted: Vec<usize> = front.to_vec();
        sorted.sort_by(|&a, &b| {
            let fa = fitness[a].get(goal).copied().unwrap_or(1.0);
            let fb = fitness[b].get(goal).copied().unwrap_or(1.0);
            fa.partial_cmp(&fb).unwrap_or(Ordering::Equal)
        });
        let min = fitness[sorted[0]].get(goal).copied().unwrap_or(1.0);
        let max = fitness[*sorted.last().unwrap()].get(goal).copied().unwrap_or(1.0);
        let span = (max - min).max(f64::EPSILON);
        let first = sorted[0];
        let last = sorted[sorted.len() - 1];
        distances.insert(first, f64::INFINITY);
        distances.insert(last, f64::INFINITY);
        for w in 1..sorted.len() - 1 {
            let prev = fitness[sorted[w - 1]].get(goal).copied().unwrap_or(1.0);
            let next = fitness[sorted[w + 1]].get(goal).copied().unwrap_or(1.0);
            if let Some(d) = distances.get_mut(&sorted[w]) {
                if d.is_finite() {
                    *d += (next - prev).abs() / span;
                }
            }
        }
    }
    distances
}

/// Descending-crowding-distance order within one front, shared by
/// [`flatten_with_crowding`] and [`truncate_to`] so the tie-break rule lives
/// in one place.
fn by_crowding_desc(front: &[usize], distances: &IndexMap<usize, f64>) -> Vec<usize> {
    front
        .iter()
        .copied()
        .sorted_by(|&a, &b| {
            distances
                .get(&b)
                .copied()
                .unwrap_or(0.0)
                .partial_cmp(&distances.get(&a).copied().unwrap_or(0.0))
                .unwrap_or(Ordering::Equal)
        })
        .collect()
}

/// Flattens ranked fronts into a single best-to-worst order, breaking ties
/// within a front by descending crowding distance.
pub fn flatten_with_crowding(fronts: &[Vec<usize>], fitness: &[FitnessVector], goals: &[CoverageGoal]) -> Vec<usize> {
    let mut order = Vec::new();
    for front in fronts {
        let distances = crowding_distances(fitness, goals, front);
        order.extend(by_crowding_desc(front, &distances));
    }
    order
}

/// Selects up to `target` survivors front by front, splitting the last
/// admitted front by crowding distance (spec.md §4.6 "Rank combined
/// population; truncate to population size").
pub fn truncate_to(fronts: &[Vec<usize>], fitness: &[FitnessVector], goals: &[CoverageGoal], target: usize) -> Vec<usize> {
    let mut selected = Vec::with_capacity(target);
    for front in fronts {
        if selected.len() + front.len() <= target {
            selected.extend(front.iter().copied());
            if selected.len() == target {
                break;
            }
            continue;
        }
        let remaining = target - selected.len();
        let distances = crowding_distances(fitness, goals, front);
        selected.extend(by_crowding_desc(front, &distances).into_iter().take(remaining));
        break;
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(pairs: &[(CoverageGoal, f64)]) -> FitnessVector {
        pairs.iter().copied().collect()
    }

    #[test]
    fn rank0_picks_best_per_goal() {
        let g0 = CoverageGoal::LineCovered(0);
        let g1 = CoverageGoal::LineCovered(1);
        let fitness = vec![vector(&[(g0, 0.1), (g1, 0.9)]), vector(&[(g0, 0.9), (g1, 0.1)]), vector(&[(g0, 0.5), (g1, 0.5)])];
        let lengths = vec![3, 3, 1];
        let front0 = rank0(&fitness, &lengths, &[g0, g1]);
        assert_eq!(front0, vec![0, 1]);
    }

    #[test]
    fn truncate_never_exceeds_target() {
        let g0 = CoverageGoal::LineCovered(0);
        let fitness = vec![vector(&[(g0, 0.1)]), vector(&[(g0, 0.2)]), vector(&[(g0, 0.3)]), vector(&[(g0, 0.4)])];
        let lengths = vec![1, 1, 1, 1];
        let fronts = preference_sort(&fitness, &lengths, &[g0]);
        let survivors = truncate_to(&fronts, &fitness, &[g0], 2);
        assert_eq!(survivors.len(), 2);
    }
}
