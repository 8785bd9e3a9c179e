use anyhow::{Context, Result};
use serde::Deserialize;
use std::{path::Path, str::FromStr};

use crate::{Direction, Directions, SpritePart, tileset::direction_names};

const PACMAN_DOUBLE_EDGES: &str = include_str!("../assets/double_edges.yaml");

#[derive(Debug, Clone, Deserialize)]
struct DoubleEdgeRule {
    original: SpritePart,
    #[serde(deserialize_with = "direction_names")]
    directions: Directions,
    upgraded: SpritePart,
}

#[derive(Debug, Deserialize)]
struct DoubleEdgeFile {
    rules: Vec<DoubleEdgeRule>,
}

/// Lookup table turning border sprite parts into their double-edge variants.
///
/// Each rule names the part it replaces, the outward-facing directions it
/// applies to, and the replacement. The first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct DoubleEdgeRules {
    rules: Vec<DoubleEdgeRule>,
}

impl DoubleEdgeRules {
    /// The table bundled with the Pacman tileset.
    pub fn pacman() -> Self {
        PACMAN_DOUBLE_EDGES
            .parse()
            .unwrap_or_else(|e| panic!("Bundled double edge rules are invalid: {e:#}"))
    }

    /// Reads a rule table from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read double edge rules {}", path.display()))?;
        data.parse()
            .with_context(|| format!("Failed to parse double edge rules {}", path.display()))
    }

    /// Adds a rule after the existing ones.
    pub fn with_rule(mut self, original: SpritePart, directions: Directions, upgraded: SpritePart) -> Self {
        self.rules.push(DoubleEdgeRule {
            original,
            directions,
            upgraded,
        });
        self
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Replacement for `part` on a border facing `direction`, if there is one.
    pub fn try_upgrade(&self, part: SpritePart, direction: Direction) -> Option<SpritePart> {
        if part == SpritePart::Empty {
            return None;
        }
        self.rules
            .iter()
            .find(|rule| rule.original == part && rule.directions.has(direction))
            .map(|rule| rule.upgraded)
    }
}

impl FromStr for DoubleEdgeRules {
    type Err = anyhow::Error;

    fn from_str(data: &str) -> Result<Self> {
        let file: DoubleEdgeFile = serde_yaml::from_str(data)?;
        Ok(Self { rules: file.rules })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_rules_parse() {
        let rules = DoubleEdgeRules::pacman();
        assert!(!rules.is_empty());
        assert_eq!(
            rules.try_upgrade(SpritePart::TopEdge, Direction::Up),
            Some(SpritePart::DoubleTopEdge)
        );
    }

    #[test]
    fn test_direction_must_match() {
        let rules = DoubleEdgeRules::pacman();
        assert_eq!(rules.try_upgrade(SpritePart::TopEdge, Direction::Left), None);
        assert_eq!(rules.try_upgrade(SpritePart::LeftEdge, Direction::Left), Some(SpritePart::DoubleLeftEdge));
    }

    #[test]
    fn test_empty_part_never_upgrades() {
        let rules = DoubleEdgeRules::default().with_rule(
            SpritePart::Empty,
            Directions::all(),
            SpritePart::DoubleTopEdge,
        );
        assert_eq!(rules.try_upgrade(SpritePart::Empty, Direction::Up), None);
    }

    #[test]
    fn test_first_rule_wins() {
        let rules = DoubleEdgeRules::default()
            .with_rule(SpritePart::TopEdge, Directions::UP, SpritePart::DoubleTopEdge)
            .with_rule(SpritePart::TopEdge, Directions::UP, SpritePart::GhostDoor);
        assert_eq!(
            rules.try_upgrade(SpritePart::TopEdge, Direction::Up),
            Some(SpritePart::DoubleTopEdge)
        );
    }

    #[test]
    fn test_rules_from_yaml() {
        let yaml = "
rules:
  - { original: RIGHT_EDGE, directions: [RIGHT, UP], upgraded: DOUBLE_RIGHT_EDGE }
";
        let rules: DoubleEdgeRules = yaml.parse().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.try_upgrade(SpritePart::RightEdge, Direction::Up), Some(SpritePart::DoubleRightEdge));
        assert_eq!(rules.try_upgrade(SpritePart::RightEdge, Direction::Down), None);
    }

    #[test]
    fn test_unknown_direction_is_rejected() {
        let yaml = "
rules:
  - { original: RIGHT_EDGE, directions: [NORTH], upgraded: DOUBLE_RIGHT_EDGE }
";
        assert!(yaml.parse::<DoubleEdgeRules>().is_err());
    }
}
