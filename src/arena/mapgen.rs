//! Seeded symmetric map generation
//!
//! Factory 0 sits at the centre of the plane. Every other factory comes as a
//! point-mirrored pair `(2k + 1, 2k + 2)`, so both seats see the same board.
//! The first pair holds the starting factories.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{Distance, FactoryId, Owner, MAX_DISTANCE, MAX_PRODUCTION};
use crate::graph::Link;
use crate::world::Factory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Smallest board; rounded up to an odd count
    pub min_factories: usize,
    /// Largest board; rounded down to an odd count
    pub max_factories: usize,
    pub width: f64,
    pub height: f64,
    /// Closest two factories may be placed
    pub min_spacing: f64,
    /// Plane units per turn of travel
    pub distance_scale: f64,
    /// Tries per pair before giving up on placing it
    pub placement_attempts: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            min_factories: 7,
            max_factories: 15,
            width: 16_000.0,
            height: 6_500.0,
            min_spacing: 1_200.0,
            distance_scale: 800.0,
            placement_attempts: 500,
        }
    }
}

/// A generated board, owners in the absolute frame
/// (`Owner::Me` is the first seat, `Owner::Enemy` the second)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedMap {
    pub seed: u64,
    pub positions: Vec<(f64, f64)>,
    pub links: Vec<Link>,
    pub factories: Vec<Factory>,
}

impl GeneratedMap {
    pub fn node_count(&self) -> usize {
        self.factories.len()
    }
}

/// The factory occupying the mirrored position
pub fn mirror(id: FactoryId) -> FactoryId {
    match id.index() {
        0 => id,
        i if i % 2 == 1 => FactoryId(i + 1),
        i => FactoryId(i - 1),
    }
}

fn spaced(positions: &[(f64, f64)], point: (f64, f64), spacing: f64) -> bool {
    positions
        .iter()
        .all(|&(x, y)| ((x - point.0).powi(2) + (y - point.1).powi(2)).sqrt() >= spacing)
}

/// Build a symmetric board from a seed
pub fn generate_map(seed: u64, config: &MapConfig) -> GeneratedMap {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let min_pairs = config.min_factories.saturating_sub(1).div_ceil(2).max(1);
    let max_pairs = (config.max_factories.saturating_sub(1) / 2).max(min_pairs);
    let pairs = rng.gen_range(min_pairs..=max_pairs);

    let (width, height) = (config.width, config.height);
    let centre = (width / 2.0, height / 2.0);
    let margin = config.min_spacing / 2.0;
    let mut positions = vec![centre];

    for pair in 0..pairs {
        // Starting factories stay on the far left so the mirror lands far right
        let x_range = if pair == 0 {
            margin..(width / 4.0).max(margin + 1.0)
        } else {
            margin..(width - margin).max(margin + 1.0)
        };
        for _ in 0..config.placement_attempts {
            let point = (rng.gen_range(x_range.clone()), rng.gen_range(margin..(height - margin).max(margin + 1.0)));
            let mirrored = (width - point.0, height - point.1);
            let apart = ((point.0 - mirrored.0).powi(2) + (point.1 - mirrored.1).powi(2)).sqrt();
            if apart >= config.min_spacing
                && spaced(&positions, point, config.min_spacing)
                && spaced(&positions, mirrored, config.min_spacing)
            {
                positions.push(point);
                positions.push(mirrored);
                break;
            }
        }
        if positions.len() == 1 {
            // Without starts there is no game; fall back to the far corners
            positions.push((margin, margin));
            positions.push((width - margin, height - margin));
        }
    }

    let node_count = positions.len();
    let mut links = Vec::with_capacity(node_count * (node_count - 1) / 2);
    for a in 0..node_count {
        for b in a + 1..node_count {
            let (ax, ay) = positions[a];
            let (bx, by) = positions[b];
            let euclid = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();
            let distance = ((euclid / config.distance_scale).round() as Distance).clamp(1, MAX_DISTANCE);
            links.push(Link::new(a, b, distance));
        }
    }

    let mut factories = Vec::with_capacity(node_count);
    factories.push(
        Factory::new(FactoryId(0))
            .with_cyborgs(rng.gen_range(0..=5))
            .with_production(rng.gen_range(0..=MAX_PRODUCTION)),
    );
    for first in (1..node_count).step_by(2) {
        let (owners, cyborgs, production) = if first == 1 {
            ((Owner::Me, Owner::Enemy), rng.gen_range(15..=30), rng.gen_range(1..=MAX_PRODUCTION))
        } else {
            ((Owner::Neutral, Owner::Neutral), rng.gen_range(0..=5), rng.gen_range(0..=MAX_PRODUCTION))
        };
        for (id, owner) in [(first, owners.0), (first + 1, owners.1)] {
            factories.push(
                Factory::new(FactoryId(id))
                    .with_owner(owner)
                    .with_cyborgs(cyborgs)
                    .with_production(production),
            );
        }
    }

    tracing::debug!(seed, factories = node_count, "Generated map");

    GeneratedMap {
        seed,
        positions,
        links,
        factories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_map() {
        let config = MapConfig::default();
        assert_eq!(generate_map(7, &config), generate_map(7, &config));
    }

    #[test]
    fn test_map_is_symmetric() {
        let config = MapConfig::default();
        for seed in 0..20 {
            let map = generate_map(seed, &config);
            let n = map.node_count();
            assert!(n % 2 == 1, "seed {seed}: {n} factories");
            assert!((3..=config.max_factories).contains(&n));

            assert_eq!(map.factories[1].owner, Owner::Me);
            assert_eq!(map.factories[2].owner, Owner::Enemy);
            for f in &map.factories {
                let m = &map.factories[mirror(f.id).index()];
                assert_eq!(f.cyborgs, m.cyborgs);
                assert_eq!(f.production, m.production);
                assert_eq!(f.owner.opposite(), m.owner);
            }
        }
    }

    #[test]
    fn test_complete_graph_distances_in_range() {
        let map = generate_map(3, &MapConfig::default());
        let n = map.node_count();
        assert_eq!(map.links.len(), n * (n - 1) / 2);
        assert!(map.links.iter().all(|l| (1..=MAX_DISTANCE).contains(&l.distance)));

        let distance = |a: usize, b: usize| {
            map.links
                .iter()
                .find(|l| (l.a.index(), l.b.index()) == (a.min(b), a.max(b)))
                .map(|l| l.distance)
                .unwrap()
        };
        for a in 0..n {
            for b in 0..n {
                if a != b {
                    let (ma, mb) = (mirror(FactoryId(a)).index(), mirror(FactoryId(b)).index());
                    assert_eq!(distance(a, b), distance(ma, mb));
                }
            }
        }
    }

    #[test]
    fn test_mirror_pairs() {
        assert_eq!(mirror(FactoryId(0)), FactoryId(0));
        assert_eq!(mirror(FactoryId(1)), FactoryId(2));
        assert_eq!(mirror(FactoryId(2)), FactoryId(1));
        assert_eq!(mirror(FactoryId(9)), FactoryId(10));
    }
}
