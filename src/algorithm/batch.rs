//! Parallel generation of several levels.

use rand::{SeedableRng, rngs::StdRng};
use rayon::prelude::*;

use super::generator::Generator;
use crate::{DoubleEdgeRules, GenerationError, GeneratorConfig, Level, Tileset};

/// Generates one level per seed, in parallel.
///
/// Results come back in seed order; each level is exactly what a single
/// generator seeded with `StdRng::seed_from_u64(seed)` would produce.
pub fn generate_levels(
    tileset: &Tileset,
    rules: &DoubleEdgeRules,
    config: &GeneratorConfig,
    seeds: &[u64],
) -> Vec<Result<Level, GenerationError>> {
    seeds
        .par_iter()
        .map(|&seed| {
            Generator::new(
                tileset.clone(),
                rules.clone(),
                config.clone(),
                StdRng::seed_from_u64(seed),
            )?
            .run()
        })
        .collect()
}
