//! Per-attempt projection noise.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rosterforge_config::RandomnessConfig;
use rosterforge_core::PlayerCatalog;

use crate::builder::ObjectiveWeights;

/// Draws a projection for every player with a `[floor, ceiling]` range.
///
/// The draw is uniform over the part of the range selected by `spread`
/// around the median projection; players without a range keep their
/// projection.
///
/// # Example
///
/// ```
/// use rosterforge_config::RandomnessConfig;
/// use rosterforge_lineup::randomness::ProjectionRandomizer;
/// use rosterforge_test::mlb_catalog;
///
/// let catalog = mlb_catalog();
/// let config = RandomnessConfig { seed: Some(7), spread: 0.5 };
/// let weights = ProjectionRandomizer::new(&config).draw(&catalog);
///
/// // Hitters carry a range, pitchers do not.
/// assert_eq!(weights.len(), 17);
/// ```
#[derive(Debug, Clone)]
pub struct ProjectionRandomizer {
    rng: ChaCha8Rng,
    spread: f64,
}

impl ProjectionRandomizer {
    pub fn new(config: &RandomnessConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self {
            rng,
            spread: config.spread.clamp(0.0, 1.0),
        }
    }

    pub fn draw(&mut self, catalog: &PlayerCatalog) -> ObjectiveWeights {
        let mut weights = ObjectiveWeights::new();
        for player in catalog.iter() {
            let (Some(floor), Some(ceiling)) = (player.floor, player.ceiling) else {
                continue;
            };
            let median = player.projection;
            let lo = median - self.spread * (median - floor).max(0.0);
            let hi = median + self.spread * (ceiling - median).max(0.0);
            if hi > lo {
                weights.set(player.id.clone(), self.rng.random_range(lo..=hi));
            }
        }
        weights
    }
}
