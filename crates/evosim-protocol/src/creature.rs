//! Creature records as supplied by the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Creature identifier, assigned by the engine at birth.
///
/// Unique within a generation; reset when a new generation is bred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureId(pub u32);

impl CreatureId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for CreatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One creature as the engine reports it.
///
/// `fitness`, `rank` and `will_die` are present only after scoring.
/// `nodes` and `muscles` are opaque; only their lengths are read here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureRecord {
    pub id: CreatureId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub will_die: Option<bool>,
    #[serde(default)]
    pub nodes: Vec<Value>,
    #[serde(default)]
    pub muscles: Vec<Value>,
    /// Engine-owned fields that are passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreatureRecord {
    /// Create an unscored record with empty structure.
    pub fn new(id: CreatureId) -> Self {
        Self {
            id,
            fitness: None,
            rank: None,
            will_die: None,
            nodes: Vec::new(),
            muscles: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Whether the engine has scored this creature.
    pub fn is_scored(&self) -> bool {
        self.fitness.is_some() && self.rank.is_some()
    }

    /// Morphology class derived from the structural counts.
    pub fn morphology(&self) -> MorphologyClass {
        MorphologyClass::from_counts(self.nodes.len(), self.muscles.len())
    }
}

/// Demographic bucket key, e.g. `n4m6` for four nodes and six muscles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MorphologyClass(String);

impl MorphologyClass {
    pub fn from_counts(nodes: usize, muscles: usize) -> Self {
        Self(format!("n{nodes}m{muscles}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MorphologyClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn morphology_from_structure_lengths() {
        let mut record = CreatureRecord::new(CreatureId(3));
        record.nodes = vec![json!({}); 4];
        record.muscles = vec![json!({}); 6];
        assert_eq!(record.morphology().as_str(), "n4m6");
    }

    #[test]
    fn scored_record_parses_camel_case() {
        let raw = json!({
            "id": 12,
            "fitness": 3.5,
            "rank": 0,
            "willDie": false,
            "nodes": [{"x": 0.0}, {"x": 1.0}],
            "muscles": [[0, 1]],
            "genome": "opaque"
        });

        let record: CreatureRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.id, CreatureId(12));
        assert_eq!(record.fitness, Some(3.5));
        assert_eq!(record.will_die, Some(false));
        assert!(record.is_scored());
        assert_eq!(record.morphology().as_str(), "n2m1");
        assert_eq!(record.extra.get("genome"), Some(&json!("opaque")));
    }

    #[test]
    fn fresh_record_is_unscored() {
        let record: CreatureRecord = serde_json::from_value(json!({ "id": 0 })).unwrap();
        assert!(!record.is_scored());
        assert!(record.nodes.is_empty());

        let back = serde_json::to_value(&record).unwrap();
        assert!(back.get("fitness").is_none());
    }
}
