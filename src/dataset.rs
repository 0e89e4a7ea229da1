use std::hash::Hash;

use crate::counter::Counter;
use crate::encoding::Encoding;
use crate::error::{Error, Result};

/// An active feature consists of a feature id with its count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveFeature {
    /// Feature id
    pub id: u32,
    /// Count of the feature in the datum
    pub count: f64,
}

impl ActiveFeature {
    pub fn new(id: u32, count: f64) -> Self {
        Self { id, count }
    }
}

/// Sparse, id-based representation of one (possibly unlabeled) datum
///
/// Features unknown to the encoding are dropped when the datum is built,
/// so they contribute nothing to any score.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDatum {
    /// Label id, absent for inference-time inputs
    label: Option<u32>,
    /// Known features with their counts, each id at most once
    features: Vec<ActiveFeature>,
}

impl EncodedDatum {
    pub fn new(label: Option<u32>, features: Vec<ActiveFeature>) -> Self {
        Self { label, features }
    }

    /// Encode an unlabeled feature-count vector.
    ///
    /// Features missing from the encoding are dropped. A known feature with
    /// a negative or non-finite count is rejected.
    pub fn encode<F, L>(counts: &Counter<F>, encoding: &Encoding<F, L>) -> Result<Self>
    where
        F: Clone + Eq + Hash,
        L: Clone + Eq + Hash,
    {
        // Counter keys are distinct, so each known id is pushed at most once
        let mut features = Vec::with_capacity(counts.len());
        for (feature, count) in counts.iter() {
            if let Some(id) = encoding.feature_id(feature) {
                if !count.is_finite() || count < 0.0 {
                    return Err(Error::InvalidInput(format!(
                        "feature #{} has invalid count {}",
                        id, count
                    )));
                }
                features.push(ActiveFeature::new(id, count));
            }
        }
        Ok(Self {
            label: None,
            features,
        })
    }

    /// Encode a feature-count vector together with its gold label.
    ///
    /// Fails if the label was never seen while building the encoding.
    pub fn encode_labeled<F, L>(
        counts: &Counter<F>,
        label: &L,
        encoding: &Encoding<F, L>,
    ) -> Result<Self>
    where
        F: Clone + Eq + Hash,
        L: Clone + Eq + Hash,
    {
        let label_id = encoding.label_id(label).ok_or_else(|| {
            Error::Encoding("label was not seen while building the encoding".to_string())
        })?;
        let mut datum = Self::encode(counts, encoding)?;
        datum.label = Some(label_id);
        Ok(datum)
    }

    /// Gold label id; reading it from an unlabeled datum is an error
    pub fn label_id(&self) -> Result<u32> {
        self.label.ok_or_else(|| {
            Error::InvalidState("attempted to read the label of an unlabeled datum".to_string())
        })
    }

    pub fn is_labeled(&self) -> bool {
        self.label.is_some()
    }

    pub fn num_active_features(&self) -> usize {
        self.features.len()
    }

    pub fn features(&self) -> &[ActiveFeature] {
        &self.features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoding() -> Encoding<&'static str, &'static str> {
        let data = vec![
            (Counter::from([("fuzzy", 1.0), ("claws", 1.0)]), "cat"),
            (Counter::from([("big", 1.0)]), "bear"),
        ];
        Encoding::build(data.iter().map(|(c, l)| (c, l)))
    }

    #[test]
    fn test_encode_drops_unknown_features() {
        let encoding = encoding();
        let counts = Counter::from([("tail", 1.0), ("claws", 2.0), ("whiskers", 1.0)]);
        let datum = EncodedDatum::encode(&counts, &encoding).unwrap();

        assert!(!datum.is_labeled());
        assert_eq!(datum.features(), &[ActiveFeature::new(1, 2.0)]);
    }

    #[test]
    fn test_encode_all_unknown_is_empty() {
        let encoding = encoding();
        let counts = Counter::from([("tail", 1.0), ("whiskers", 1.0)]);
        let datum = EncodedDatum::encode(&counts, &encoding).unwrap();
        assert_eq!(datum.num_active_features(), 0);
    }

    #[test]
    fn test_encode_labeled() {
        let encoding = encoding();
        let counts = Counter::from([("big", 1.0), ("fuzzy", 1.0)]);
        let datum = EncodedDatum::encode_labeled(&counts, &"bear", &encoding).unwrap();
        assert_eq!(datum.label_id().unwrap(), 1);
        assert_eq!(
            datum.features(),
            &[ActiveFeature::new(2, 1.0), ActiveFeature::new(0, 1.0)]
        );
    }

    #[test]
    fn test_encode_labeled_unknown_label() {
        let encoding = encoding();
        let counts = Counter::from([("big", 1.0)]);
        let err = EncodedDatum::encode_labeled(&counts, &"moose", &encoding).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_encode_rejects_invalid_counts() {
        let encoding = encoding();
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let counts = Counter::from([("claws", bad)]);
            let err = EncodedDatum::encode(&counts, &encoding).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
            assert!(EncodedDatum::encode_labeled(&counts, &"cat", &encoding).is_err());
        }

        // Unknown features are dropped before their counts are looked at
        let counts = Counter::from([("tail", -1.0), ("big", 0.0)]);
        let datum = EncodedDatum::encode(&counts, &encoding).unwrap();
        assert_eq!(datum.features(), &[ActiveFeature::new(2, 0.0)]);
    }

    #[test]
    fn test_unlabeled_label_id_fails() {
        let datum = EncodedDatum::new(None, vec![ActiveFeature::new(0, 1.0)]);
        let err = datum.label_id().unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }
}
