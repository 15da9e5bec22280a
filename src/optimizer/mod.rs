use rstar::RTree;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::plotter::{GridPoint, PenPlan};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptimizationStrategy {
    /// Exhaustive nearest-neighbour search from the last visited point. O(n²).
    #[default]
    Greedy,
    /// Nearest neighbour through an R-tree. Visits the same points, but ties are
    /// broken by the tree rather than by recording order, so tours can differ
    /// from [`OptimizationStrategy::Greedy`].
    SpatialIndex,
}

#[derive(Debug, Clone, PartialEq)]
/// Orders each pen's dabs so the pen mostly moves between adjacent pixels.
pub struct Optimizer {
    strategy: OptimizationStrategy,
}

fn distance_2(a: &GridPoint, b: &GridPoint) -> i64 {
    let d_x = a.x - b.x;
    let d_y = a.y - b.y;
    d_x * d_x + d_y * d_y
}

/// Total travel distance, in pixels, of visiting `points` in order.
pub fn tour_length(points: &[GridPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| (distance_2(&pair[0], &pair[1]) as f64).sqrt())
        .sum()
}

impl Optimizer {
    pub fn new(strategy: OptimizationStrategy) -> Optimizer {
        Optimizer { strategy }
    }

    /// Returns a visiting order starting at `points[0]` that contains every
    /// input point exactly once.
    pub fn optimize(&self, points: &[GridPoint]) -> Vec<GridPoint> {
        if points.len() < 2 {
            return points.to_vec();
        }
        let tour = match self.strategy {
            OptimizationStrategy::Greedy => self.greedy(points),
            OptimizationStrategy::SpatialIndex => self.spatial_index(points),
        };
        debug!(
            strategy = ?self.strategy,
            points = tour.len(),
            before = tour_length(points),
            after = tour_length(&tour),
            "Optimized tour"
        );
        tour
    }

    /// Replaces the plan's pixel list with its visiting order.
    pub fn optimize_plan(&self, plan: &mut PenPlan) {
        plan.pixels = self.optimize(&plan.pixels);
    }

    /// Picks the closest remaining point each step. A remaining point other
    /// than the first one at distance exactly 1 is taken immediately; otherwise
    /// the first point reaching the minimum distance wins.
    fn greedy(&self, points: &[GridPoint]) -> Vec<GridPoint> {
        let mut remaining = points.to_vec();
        let mut last = remaining.remove(0);
        let mut tour = Vec::with_capacity(points.len());
        tour.push(last);
        while !remaining.is_empty() {
            let mut index = 0;
            let mut shortest = distance_2(&last, &remaining[0]);
            for (i, candidate) in remaining.iter().enumerate().skip(1) {
                let distance = distance_2(&last, candidate);
                if distance == 1 {
                    index = i;
                    break;
                }
                if distance < shortest {
                    shortest = distance;
                    index = i;
                }
            }
            last = remaining.remove(index);
            tour.push(last);
        }
        tour
    }

    fn spatial_index(&self, points: &[GridPoint]) -> Vec<GridPoint> {
        let mut rtree: RTree<[i64; 2]> =
            RTree::bulk_load(points[1..].iter().map(|p| [p.x, p.y]).collect());
        let mut tour = Vec::with_capacity(points.len());
        tour.push(points[0]);
        let mut last = [points[0].x, points[0].y];
        while let Some(next) = rtree.nearest_neighbor(&last).copied() {
            rtree.remove(&next);
            tour.push(GridPoint {
                x: next[0],
                y: next[1],
            });
            last = next;
        }
        tour
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plotter::grid_point;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn sorted(points: &[GridPoint]) -> Vec<(i64, i64)> {
        let mut out: Vec<(i64, i64)> = points.iter().map(|p| (p.y, p.x)).collect();
        out.sort();
        out
    }

    fn scatter(seed: u64, count: usize) -> Vec<GridPoint> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..count)
            .map(|_| grid_point(rng.gen_range(0..40), rng.gen_range(0..40)))
            .collect()
    }

    #[test]
    fn test_empty_and_single() {
        let opt = Optimizer::new(OptimizationStrategy::Greedy);
        assert!(opt.optimize(&[]).is_empty());
        assert_eq!(opt.optimize(&[grid_point(3, 4)]), vec![grid_point(3, 4)]);
    }

    #[test]
    fn test_greedy_walks_neighbours() {
        // A row recorded out of order is walked left to right from its start.
        let points = vec![
            grid_point(0, 0),
            grid_point(0, 3),
            grid_point(0, 1),
            grid_point(0, 2),
        ];
        let opt = Optimizer::new(OptimizationStrategy::Greedy);
        assert_eq!(
            opt.optimize(&points),
            vec![grid_point(0, 0), grid_point(0, 1), grid_point(0, 2), grid_point(0, 3)]
        );
    }

    #[test]
    fn test_greedy_tie_break() {
        // Both candidates are 2 away; the one recorded first wins.
        let points = vec![grid_point(0, 0), grid_point(0, 2), grid_point(2, 0)];
        let opt = Optimizer::new(OptimizationStrategy::Greedy);
        assert_eq!(opt.optimize(&points)[1], grid_point(0, 2));
        // Distance-1 candidates later in the list short-circuit the scan.
        let points = vec![grid_point(5, 5), grid_point(5, 6), grid_point(4, 5)];
        assert_eq!(opt.optimize(&points)[1], grid_point(4, 5));
    }

    #[test]
    fn test_tours_are_permutations() {
        for strategy in [OptimizationStrategy::Greedy, OptimizationStrategy::SpatialIndex] {
            let opt = Optimizer::new(strategy);
            for seed in 0..5 {
                let points = scatter(seed, 150);
                let tour = opt.optimize(&points);
                assert_eq!(tour.len(), points.len());
                assert_eq!(tour[0], points[0]);
                assert_eq!(sorted(&tour), sorted(&points));
            }
        }
    }

    #[test]
    fn test_tours_do_not_get_longer() {
        let points = scatter(42, 300);
        for strategy in [OptimizationStrategy::Greedy, OptimizationStrategy::SpatialIndex] {
            let tour = Optimizer::new(strategy).optimize(&points);
            assert!(tour_length(&tour) < tour_length(&points));
        }
    }

    #[test]
    fn test_optimize_plan_in_place() {
        let mut plan = PenPlan::new();
        plan.pixels = vec![grid_point(0, 0), grid_point(9, 9), grid_point(0, 1)];
        Optimizer::new(OptimizationStrategy::Greedy).optimize_plan(&mut plan);
        assert_eq!(plan.pixels, vec![grid_point(0, 0), grid_point(0, 1), grid_point(9, 9)]);
    }
}
