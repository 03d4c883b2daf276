// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::rng::RngContext;

/// Rank-based selection (spec.md §6 `selection: rank`, `rank_bias`):
/// consumes an already rank+crowding-sorted index order (best first, as
/// produced by [`crate::ga::ranking::flatten_with_crowding`]) and draws one
/// index, weighting earlier positions more heavily as `rank_bias` grows
/// from 1.0 (uniform) towards 2.0 (strongly biased towards the best rank).
pub fn rank_select(order: &[usize], rank_bias: f64, rng: &RngContext) -> usize {
    let n = order.len();
    if n <= 1 {
        return order[0];
    }
    let bias = rank_bias.clamp(1.0, 2.0);
    let roll = rng.gen_f64();
    let mut cumulative = 0.0;
    for (position, &index) in order.iter().enumerate() {
        let weight = ((2.0 - bias) + 2.0 * (bias - 1.0) * (n - 1 - position) as f64 / (n - 1) as f64) / n as f64;
        cumulative += weight;
        if roll <= cumulative {
            return index;
        }
    }
    *order.last().unwrap()
}

/// Tournament(k) selection (spec.md §6 `selection: tournament(k)`): draws
/// `k` random positions from the sorted order and keeps the earliest
/// (best-ranked) one.
pub fn tournament_select(order: &[usize], k: usize, rng: &RngContext) -> usize {
    let mut best_position = rng.gen_range(0..order.len());
    for _ in 1..k.max(1) {
        let challenger = rng.gen_range(0..order.len());
        if challenger < best_position {
            best_position = challenger;
        }
    }
    order[best_position]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_select_stays_within_order() {
        let order = vec![4, 1, 0, 3, 2];
        let rng = RngContext::from_seed(7);
        for _ in 0..50 {
            assert!(order.contains(&rank_select(&order, 1.7, &rng)));
        }
    }

    #[test]
    fn tournament_select_stays_within_order() {
        let order = vec![0, 1, 2];
        let rng = RngContext::from_seed(3);
        for _ in 0..20 {
            assert!(order.contains(&tournament_select(&order, 3, &rng)));
        }
    }

    #[test]
    fn single_candidate_order_is_returned_unconditionally() {
        let order = vec![9];
        let rng = RngContext::from_seed(1);
        assert_eq!(rank_select(&order, 1.7, &rng), 9);
        assert_eq!(tournament_select(&order, 3, &rng), 9);
    }
}
