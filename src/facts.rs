// FACTSHORTS Fact Pools
// Built-in single-line fact collections and random non-repeating draws.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;
use tracing::info;

pub const POOL_NAMES: &[&str] = &["random", "science", "history", "weird"];

const RANDOM_FACTS: &[&str] = &[
    "Honey never spoils; archaeologists found edible honey in ancient tombs.",
    "Bananas are berries but strawberries are not.",
    "Octopuses have three hearts and blue blood.",
    "There are more possible chess games than atoms in the observable universe.",
    "A day on Venus is longer than a year on Venus.",
    "Cleopatra lived closer in time to the Moon landing than to the building of the Great Pyramid.",
    "The Eiffel Tower can be 15 cm taller during hot days.",
    "Wombat poop is cube-shaped — it helps them mark territory.",
    "Sharks existed before trees evolved on Earth.",
    "A bolt of lightning contains enough energy to toast 100,000 slices of bread.",
];

const SCIENCE_FACTS: &[&str] = &[
    "Water can boil and freeze at the same time under a vacuum (triple point).",
    "Our bones are constantly renewing; your skeleton replaces itself about every 10 years.",
    "Neutron stars are so dense that a sugar-cube-sized amount would weigh about a billion tons.",
    "If you could drive straight up, you'd reach space in about an hour at highway speeds.",
    "Plants can communicate through fungal networks sometimes called the wood-wide web.",
    "There are more possible protein sequences than there are atoms in the universe.",
    "A teaspoon of neutron star material would weigh as much as Mount Everest.",
    "Sunlight takes about 8 minutes and 20 seconds to reach Earth.",
    "Some bacteria can survive decades in extreme dormancy and reanimate later.",
    "Saturn's rings are mostly made of water ice and are incredibly thin relative to their width.",
];

const HISTORY_FACTS: &[&str] = &[
    "Oxford University existed before the Aztec empire was founded.",
    "The shortest war in history lasted around 40 minutes (UK vs Zanzibar, 1896).",
    "The Great Pyramid was the tallest man-made structure for over 3,800 years.",
    "During WWII, a Great Dane named Juliana was awarded for extinguishing an incendiary bomb by peeing on it.",
    "Vikings used a type of 'sunstone' crystal for navigation on cloudy days.",
    "Roman concrete's durability came from volcanic ash in the mortar.",
    "Ketchup used to be sold as a medicine in the 1830s.",
    "A president once survived a bullet because the bullet hit a metal eyeglass case in his pocket.",
    "Some ancient coins contain microscopic layers of gold leaf to save metal.",
    "Railroad spikes were sometimes used as money in frontier towns.",
];

const WEIRD_FACTS: &[&str] = &[
    "A single strand of spider silk is thinner than human hair but stronger than steel by weight.",
    "In Japan there is an island populated almost entirely by rabbits.",
    "There's a species of jellyfish that is biologically immortal (Turritopsis dohrnii).",
    "The smell after rain even has a name: petrichor.",
    "There's a plant called the 'resurrection plant' that can come back to life after drying.",
    "A small town in Norway has more bicycles than people.",
    "Some plants eat animals — the venus flytrap traps insects to survive.",
    "There's a tiny moon orbiting the asteroid Ida called Dactyl.",
    "The longest-living animal known grew to over 500 years (a clam named Ming).",
    "A single cloud can weigh more than a million pounds.",
];

/// A shuffled pool of facts drawn without replacement. When the pool runs
/// dry it is reshuffled and refilled, so duplicates only appear once a draw
/// exceeds the pool size.
pub struct FactPool {
    facts: Vec<String>,
    remaining: Vec<usize>,
    rng: StdRng,
}

impl FactPool {
    pub fn new(facts: Vec<String>) -> Self {
        Self::with_rng(facts, StdRng::from_entropy())
    }

    /// Deterministic pool for tests and reproducible runs.
    pub fn with_rng(facts: Vec<String>, rng: StdRng) -> Self {
        Self {
            facts,
            remaining: Vec::new(),
            rng,
        }
    }

    /// Built-in pool by name; unknown names fall back to `random`, matching
    /// the generator's original behavior.
    pub fn builtin(name: &str) -> Self {
        let facts = match name {
            "science" => SCIENCE_FACTS,
            "history" => HISTORY_FACTS,
            "weird" => WEIRD_FACTS,
            _ => RANDOM_FACTS,
        };
        Self::new(facts.iter().map(|s| s.to_string()).collect())
    }

    /// Load a custom pool from a JSON array of strings.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fact pool {:?}", path))?;
        let facts: Vec<String> = serde_json::from_str(&raw)
            .with_context(|| format!("Fact pool {:?} is not a JSON string array", path))?;
        if facts.is_empty() {
            anyhow::bail!("Fact pool {:?} is empty", path);
        }
        info!("[FACTS] Loaded {} facts from {:?}", facts.len(), path);
        Ok(Self::new(facts))
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    fn refill(&mut self) {
        self.remaining = (0..self.facts.len()).collect();
        self.remaining.shuffle(&mut self.rng);
    }

    /// Draw one fact, refilling the shuffled index pool when exhausted.
    pub fn draw(&mut self) -> Option<String> {
        if self.facts.is_empty() {
            return None;
        }
        if self.remaining.is_empty() {
            self.refill();
        }
        self.remaining.pop().map(|i| self.facts[i].clone())
    }

    /// Draw `n` facts in sequence.
    pub fn draw_many(&mut self, n: usize) -> Vec<String> {
        (0..n).filter_map(|_| self.draw()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn seeded_pool(facts: &[&str]) -> FactPool {
        FactPool::with_rng(
            facts.iter().map(|s| s.to_string()).collect(),
            StdRng::seed_from_u64(42),
        )
    }

    #[test]
    fn test_draws_are_unique_within_pool_size() {
        let mut pool = seeded_pool(&["a", "b", "c", "d", "e"]);
        let drawn = pool.draw_many(5);
        let unique: HashSet<_> = drawn.iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_refill_after_exhaustion() {
        let mut pool = seeded_pool(&["a", "b"]);
        let drawn = pool.draw_many(6);
        assert_eq!(drawn.len(), 6);
        // every fact appears exactly three times across three refills
        assert_eq!(drawn.iter().filter(|f| f.as_str() == "a").count(), 3);
        assert_eq!(drawn.iter().filter(|f| f.as_str() == "b").count(), 3);
    }

    #[test]
    fn test_empty_pool_draws_nothing() {
        let mut pool = seeded_pool(&[]);
        assert!(pool.draw().is_none());
        assert!(pool.draw_many(3).is_empty());
    }

    #[test]
    fn test_builtin_pools_exist() {
        for name in POOL_NAMES {
            assert!(!FactPool::builtin(name).is_empty());
        }
        // unknown names fall back to the random pool
        assert_eq!(FactPool::builtin("nope").len(), RANDOM_FACTS.len());
    }
}
