//! Procedural wall-map generation.
//!
//! Interior cells are promoted to wall endpoints at random, endpoints are
//! paired with a regional but not-nearest partner, each pair is joined by a
//! carved corridor of walls, and finally thin pockets are pruned away.

use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::DistanceAlg;
use bracket_random::prelude::RandomNumberGenerator;
use tracing::{debug, info, warn};

use super::{Cell, MapError, MapResult, WallMap, check_size};

/// Rank into the distance-sorted endpoint list where the partner search
/// starts. Rank 0 is the endpoint itself.
pub const DEFAULT_PAIRING_RANK: usize = 3;

/// Wall-neighbour thresholds of the two pruning passes, in order.
pub const PRUNE_THRESHOLDS: [usize; 2] = [3, 4];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallMapGenerator {
    pub rows: i32,
    pub cols: i32,
    pub wall_percent: u32,
    pub pairing_rank: usize,
}

/// Intermediate products of one generation run.
#[derive(Clone, Debug, Default)]
pub struct GenerationReport {
    pub endpoints: Vec<Point>,
    pub pairs: Vec<(Point, Point)>,
    pub corridors: Vec<Vec<Point>>,
    pub pruned: [usize; 2],
    pub reopened: Option<Point>,
}

impl WallMapGenerator {
    pub const fn new(rows: i32, cols: i32, wall_percent: u32) -> Self {
        Self {
            rows,
            cols,
            wall_percent,
            pairing_rank: DEFAULT_PAIRING_RANK,
        }
    }

    #[must_use]
    pub const fn with_pairing_rank(mut self, rank: usize) -> Self {
        self.pairing_rank = rank;
        self
    }

    pub fn validate(&self) -> MapResult<()> {
        check_size(self.rows, self.cols)?;
        if self.wall_percent > 100 {
            return Err(MapError::InvalidDensity(self.wall_percent));
        }
        Ok(())
    }

    pub fn generate(&self, rng: &mut RandomNumberGenerator) -> MapResult<WallMap> {
        self.generate_with_report(rng).map(|(map, _)| map)
    }

    pub fn generate_with_report(
        &self,
        rng: &mut RandomNumberGenerator,
    ) -> MapResult<(WallMap, GenerationReport)> {
        self.validate()?;

        let mut map = WallMap::bordered(self.rows, self.cols)?;
        let mut report = GenerationReport {
            endpoints: seed_endpoints(&mut map, self.wall_percent, rng),
            ..GenerationReport::default()
        };

        for (a, b) in pair_endpoints(&report.endpoints, self.pairing_rank) {
            let start = report.endpoints[a];
            let end = report.endpoints[b];
            let path = carve_path(start, end, rng);
            for point in &path {
                map.set(point.y, point.x, Cell::Wall);
            }
            report.pairs.push((start, end));
            report.corridors.push(path);
        }

        for (pass, &threshold) in PRUNE_THRESHOLDS.iter().enumerate() {
            report.pruned[pass] = prune(&mut map, threshold);
            debug!(threshold, pruned = report.pruned[pass], "Pruned wall map");
        }

        if self.wall_percent < 100 && map.interior_open_count() == 0 {
            let center = Point::new(self.cols / 2, self.rows / 2);
            map.set(center.y, center.x, Cell::Open);
            report.reopened = Some(center);
            warn!(row = center.y, col = center.x, "No open cell survived pruning, reopened centre");
        }

        info!(
            rows = self.rows,
            cols = self.cols,
            wall_percent = self.wall_percent,
            endpoints = report.endpoints.len(),
            corridors = report.corridors.len(),
            open = map.interior_open_count(),
            "Generated wall map"
        );

        Ok((map, report))
    }
}

/// Generates a map with the default pairing rank.
pub fn generate(
    rows: i32,
    cols: i32,
    wall_percent: u32,
    rng: &mut RandomNumberGenerator,
) -> MapResult<WallMap> {
    WallMapGenerator::new(rows, cols, wall_percent).generate(rng)
}

fn seed_endpoints(
    map: &mut WallMap,
    wall_percent: u32,
    rng: &mut RandomNumberGenerator,
) -> Vec<Point> {
    let mut endpoints = Vec::new();
    for row in 1..map.rows() - 1 {
        for col in 1..map.cols() - 1 {
            if rng.range(0, 100) < wall_percent as i32 {
                map.set(row, col, Cell::Wall);
                endpoints.push(Point::new(col, row));
            }
        }
    }
    endpoints
}

/// Pairs endpoints by index. Each unused endpoint, in seeding order, takes
/// the first unused endpoint at or beyond `rank` in its distance ordering.
/// Pairing ends the first time no such candidate exists, so an odd
/// leftover simply stays unpaired.
///
/// Quadratic: every unused endpoint re-sorts the full endpoint list. The
/// counts involved are small.
fn pair_endpoints(endpoints: &[Point], rank: usize) -> Vec<(usize, usize)> {
    let mut used = vec![false; endpoints.len()];
    let mut pairs = Vec::new();

    for (origin, &endpoint) in endpoints.iter().enumerate() {
        if used[origin] {
            continue;
        }

        let mut by_distance: Vec<usize> = (0..endpoints.len()).collect();
        by_distance.sort_by(|&a, &b| {
            let da = DistanceAlg::Pythagoras.distance2d(endpoint, endpoints[a]);
            let db = DistanceAlg::Pythagoras.distance2d(endpoint, endpoints[b]);
            da.total_cmp(&db)
        });

        match kth_unused(&by_distance, &used, rank, origin) {
            Some(partner) => {
                used[origin] = true;
                used[partner] = true;
                pairs.push((origin, partner));
            }
            None => break,
        }
    }

    pairs
}

fn kth_unused(by_distance: &[usize], used: &[bool], rank: usize, origin: usize) -> Option<usize> {
    by_distance
        .iter()
        .skip(rank)
        .copied()
        .find(|&candidate| candidate != origin && !used[candidate])
}

/// Walks from `start` to `end`, returning every visited cell after `start`.
///
/// Each step advances along the row axis, the column axis or both, but only
/// along axes whose delta is still non-zero, so the walk takes between
/// `max(|drow|, |dcol|)` and `|drow| + |dcol|` steps.
pub fn carve_path(start: Point, end: Point, rng: &mut RandomNumberGenerator) -> Vec<Point> {
    let mut path = Vec::new();
    let mut cursor = start;

    while cursor != end {
        let dx = (end.x - cursor.x).signum();
        let dy = (end.y - cursor.y).signum();
        let (step_x, step_y) = if dx != 0 && dy != 0 {
            match rng.range(0, 3) {
                0 => (dx, 0),
                1 => (0, dy),
                _ => (dx, dy),
            }
        } else {
            (dx, dy)
        };
        cursor = Point::new(cursor.x + step_x, cursor.y + step_y);
        path.push(cursor);
    }

    path
}

/// Walls in every interior open cell with at least `threshold` wall
/// neighbours. Candidates are collected before any cell changes.
fn prune(map: &mut WallMap, threshold: usize) -> usize {
    let pockets: Vec<(i32, i32)> = map
        .interior_cells()
        .filter(|&(row, col)| !map.is_wall(row, col) && map.wall_neighbors(row, col) >= threshold)
        .collect();
    for &(row, col) in &pockets {
        map.set(row, col, Cell::Wall);
    }
    pockets.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_density_keeps_open_interior() {
        let mut rng = RandomNumberGenerator::seeded(7);
        let (map, report) = WallMapGenerator::new(7, 7, 0)
            .generate_with_report(&mut rng)
            .unwrap();
        assert!(report.endpoints.is_empty());
        assert!(report.pairs.is_empty());
        assert_eq!(report.pruned, [0, 0]);
        assert_eq!(map.interior_open_count(), 25);
        assert!(map.border_is_sealed());
    }

    #[test]
    fn full_density_walls_everything() {
        let mut rng = RandomNumberGenerator::seeded(11);
        let (map, report) = WallMapGenerator::new(6, 8, 100)
            .generate_with_report(&mut rng)
            .unwrap();
        assert_eq!(report.endpoints.len(), 4 * 6);
        assert_eq!(map.interior_open_count(), 0);
        assert_eq!(report.reopened, None);
    }

    #[test]
    fn three_by_three_reopens_centre() {
        // The lone interior cell is boxed in by the border and pruned.
        let mut rng = RandomNumberGenerator::seeded(3);
        let (map, report) = WallMapGenerator::new(3, 3, 0)
            .generate_with_report(&mut rng)
            .unwrap();
        assert_eq!(report.reopened, Some(Point::new(1, 1)));
        assert!(!map.is_wall(1, 1));
    }

    #[test]
    fn rejects_bad_parameters() {
        let mut rng = RandomNumberGenerator::seeded(1);
        assert_eq!(
            generate(2, 9, 3, &mut rng),
            Err(MapError::TooSmall { rows: 2, cols: 9 })
        );
        assert_eq!(
            generate(9, 9, 101, &mut rng),
            Err(MapError::InvalidDensity(101))
        );
    }

    #[test]
    fn oversized_maps_fail_validation_before_allocating() {
        let generator = WallMapGenerator::new(50_000, 50_000, 3);
        assert_eq!(
            generator.validate(),
            Err(MapError::TooLarge {
                rows: 50_000,
                cols: 50_000
            })
        );
        let mut rng = RandomNumberGenerator::seeded(1);
        assert!(generator.generate(&mut rng).is_err());
        assert_eq!(
            WallMapGenerator::new(i32::MAX, 2, 0).validate(),
            Err(MapError::TooSmall {
                rows: i32::MAX,
                cols: 2
            })
        );
        assert!(WallMapGenerator::new(i32::MAX, i32::MAX, 0).validate().is_err());
    }

    #[test]
    fn corridors_are_carved_into_the_map() {
        let mut rng = RandomNumberGenerator::seeded(4);
        let (map, report) = WallMapGenerator::new(25, 49, 4)
            .generate_with_report(&mut rng)
            .unwrap();
        assert!(!report.corridors.is_empty());
        assert_eq!(report.corridors.len(), report.pairs.len());
        for corridor in &report.corridors {
            for &point in corridor {
                if report.reopened == Some(point) {
                    continue;
                }
                assert!(map.is_wall(point.y, point.x), "{point:?} was not carved");
            }
        }
        for &(start, end) in &report.pairs {
            assert!(report.endpoints.contains(&start));
            assert!(report.endpoints.contains(&end));
        }
    }

    #[test]
    fn odd_endpoint_count_leaves_one_unpaired() {
        let mut rng = RandomNumberGenerator::seeded(4);
        let generator = WallMapGenerator::new(25, 49, 4);
        let mut report = None;
        for _ in 0..50 {
            let (_, candidate) = generator.generate_with_report(&mut rng).unwrap();
            if candidate.endpoints.len() % 2 == 1 {
                report = Some(candidate);
                break;
            }
        }
        let report = report.unwrap();
        let paired: Vec<Point> = report.pairs.iter().flat_map(|&(a, b)| [a, b]).collect();
        assert!(report.pairs.len() * 2 < report.endpoints.len());
        assert!(report.endpoints.iter().any(|endpoint| !paired.contains(endpoint)));
    }

    #[test]
    fn pairing_skips_nearest_neighbours() {
        let endpoints: Vec<Point> = (0..6).map(|x| Point::new(x * 2 + 1, 1)).collect();
        let pairs = pair_endpoints(&endpoints, DEFAULT_PAIRING_RANK);
        // Endpoint 0 sorts as [0, 1, 2, 3, ...]; rank 3 is endpoint 3.
        assert_eq!(pairs[0], (0, 3));
        for (a, b) in &pairs {
            assert_ne!(a, b);
        }
        let mut seen: Vec<usize> = pairs.iter().flat_map(|&(a, b)| [a, b]).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), pairs.len() * 2);
    }

    #[test]
    fn pairing_stops_when_candidates_run_out() {
        let endpoints = vec![Point::new(1, 1), Point::new(2, 1), Point::new(3, 1)];
        assert!(pair_endpoints(&endpoints, DEFAULT_PAIRING_RANK).is_empty());

        let single = vec![Point::new(4, 4)];
        assert!(pair_endpoints(&single, 0).is_empty());
    }

    #[test]
    fn kth_unused_skips_used_and_origin() {
        let order = [0, 1, 2, 3, 4];
        let used = [false, false, false, true, false];
        assert_eq!(kth_unused(&order, &used, 3, 0), Some(4));
        assert_eq!(kth_unused(&order, &used, 0, 0), Some(1));
        assert_eq!(kth_unused(&order, &[false, true, true, true, true], 1, 0), None);
    }

    #[test]
    fn carve_path_is_monotone_and_bounded() {
        let mut rng = RandomNumberGenerator::seeded(99);
        let start = Point::new(2, 20);
        let end = Point::new(17, 4);
        for _ in 0..50 {
            let path = carve_path(start, end, &mut rng);
            let manhattan = ((end.x - start.x).abs() + (end.y - start.y).abs()) as usize;
            let chebyshev = (end.x - start.x).abs().max((end.y - start.y).abs()) as usize;
            assert!(path.len() <= manhattan);
            assert!(path.len() >= chebyshev);
            assert_eq!(path.last(), Some(&end));

            let mut prev = start;
            for &point in &path {
                assert!((point.x - prev.x).abs() <= 1 && (point.y - prev.y).abs() <= 1);
                assert!((end.x - point.x).abs() <= (end.x - prev.x).abs());
                assert!((end.y - point.y).abs() <= (end.y - prev.y).abs());
                assert_ne!(point, prev);
                prev = point;
            }
        }
    }

    #[test]
    fn carve_path_to_self_is_empty() {
        let mut rng = RandomNumberGenerator::seeded(5);
        assert!(carve_path(Point::new(3, 3), Point::new(3, 3), &mut rng).is_empty());
    }

    #[test]
    fn prune_fills_pockets_before_dead_ends() {
        let mut map = WallMap::from_rows(&["xxxxxx", "x x  x", "xxx  x", "xxxxxx"]).unwrap();
        // (1,1) is a single-cell pocket: four walls.
        assert_eq!(prune(&mut map, 4), 1);
        assert!(map.is_wall(1, 1));
        // The 2x2 block has two walls per cell and survives threshold 3.
        assert_eq!(prune(&mut map, 3), 0);
        assert_eq!(map.interior_open_count(), 4);
    }
}
