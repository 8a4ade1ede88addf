//! Headsign merging.
//!
//! Two trips of the same route and resolved direction can end up with
//! different cleaned headsigns (typically a "Via ..." variant next to the
//! plain destination). The merge table enumerates the pairs known to denote
//! the same logical destination and the label to keep. Pairs compare
//! unordered and as exact literal strings after normalization; anything
//! outside the table is an unrecoverable inconsistency.

use rustc_hash::FxHashMap;

use crate::error::NormalizeError;

/// One registered equivalence: an unordered headsign pair and its label.
#[derive(Debug, Clone)]
pub struct MergePair {
    pub left: String,
    pub right: String,
    pub canonical: String,
}

impl MergePair {
    pub fn new(left: &str, right: &str, canonical: &str) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
            canonical: canonical.to_string(),
        }
    }

    fn matches(&self, a: &str, b: &str) -> bool {
        (self.left == a && self.right == b) || (self.left == b && self.right == a)
    }
}

#[derive(Debug, Default)]
pub struct HeadsignMerger {
    rules: FxHashMap<i64, Vec<MergePair>>,
}

impl HeadsignMerger {
    pub fn new(rules: impl IntoIterator<Item = (i64, Vec<MergePair>)>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// The CITLA table, keyed on post-normalization strings.
    pub fn citla() -> Self {
        Self::new([
            (
                9,
                vec![MergePair::new(
                    "Terminus / St-Eustache Via Le Carref.",
                    "Terminus / St-Eustache",
                    "Terminus / St-Eustache",
                )],
            ),
            (
                8,
                vec![MergePair::new(
                    "Gare Ste-Thérèse Via Cégep",
                    "Gare Ste-Thérèse",
                    "Gare Ste-Thérèse",
                )],
            ),
        ])
    }

    /// Collapses two observed headsigns into the registered canonical label.
    pub fn merge(
        &self,
        route_id: i64,
        direction: u8,
        left: &str,
        right: &str,
    ) -> Result<String, NormalizeError> {
        if left == right {
            return Ok(left.to_string());
        }
        self.rules
            .get(&route_id)
            .and_then(|pairs| pairs.iter().find(|pair| pair.matches(left, right)))
            .map(|pair| pair.canonical.clone())
            .ok_or_else(|| NormalizeError::UnmergeableHeadsigns {
                route_id,
                direction,
                left: left.to_string(),
                right: right.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_registered_pair() {
        let merger = HeadsignMerger::citla();
        let merged = merger
            .merge(
                9,
                0,
                "Terminus / St-Eustache Via Le Carref.",
                "Terminus / St-Eustache",
            )
            .unwrap();
        assert_eq!(merged, "Terminus / St-Eustache");
    }

    #[test]
    fn pair_order_does_not_matter() {
        let merger = HeadsignMerger::citla();
        let merged = merger
            .merge(
                9,
                1,
                "Terminus / St-Eustache",
                "Terminus / St-Eustache Via Le Carref.",
            )
            .unwrap();
        assert_eq!(merged, "Terminus / St-Eustache");
    }

    #[test]
    fn equal_labels_pass_through() {
        let merger = HeadsignMerger::citla();
        assert_eq!(merger.merge(42, 0, "Gare", "Gare").unwrap(), "Gare");
    }

    #[test]
    fn unregistered_pair_is_fatal() {
        let merger = HeadsignMerger::citla();
        let err = merger.merge(9, 0, "Gare", "Terminus").unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::UnmergeableHeadsigns {
                route_id: 9,
                direction: 0,
                ..
            }
        ));
    }

    #[test]
    fn unregistered_route_is_fatal() {
        let merger = HeadsignMerger::citla();
        assert!(merger.merge(7, 0, "A", "B").is_err());
    }

    #[test]
    fn partial_match_is_not_a_merge() {
        let merger = HeadsignMerger::citla();
        // Exact literals only; a near-miss must not silently merge.
        assert!(merger
            .merge(9, 0, "Terminus / St-Eustache Via Le Carref", "Terminus / St-Eustache")
            .is_err());
    }
}
