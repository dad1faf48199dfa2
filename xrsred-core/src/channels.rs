//! Explicit channel selections.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sorted, deduplicated set of analyzer channel indices.
///
/// Selections are normalized once when built and checked against the channel
/// count, so consumers only ever see valid indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "ChannelSetParts")
)]
pub struct ChannelSet {
    indices: Vec<usize>,
}

impl ChannelSet {
    /// Every channel of an `n`-channel setup.
    #[must_use]
    pub fn all(n: usize) -> Self {
        Self {
            indices: (0..n).collect(),
        }
    }

    /// A single channel.
    pub fn single(channel: usize, channels: usize) -> Result<Self> {
        Self::from_indices([channel], channels)
    }

    /// Arbitrary channels; duplicates are dropped and order is normalized.
    pub fn from_indices<I>(indices: I, channels: usize) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        let indices: Vec<usize> = indices.into_iter().collect();
        if let Some(&channel) = indices.iter().find(|&&channel| channel >= channels) {
            return Err(Error::ChannelOutOfRange { channel, channels });
        }
        Ok(Self::normalized(indices))
    }

    fn normalized(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// Largest selected index.
    #[must_use]
    pub fn max(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    /// Number of selected channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns true if `channel` is selected.
    #[must_use]
    pub fn contains(&self, channel: usize) -> bool {
        self.indices.binary_search(&channel).is_ok()
    }

    /// Selected indices in ascending order.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    /// Iterates over selected indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

/// Serialized form of a [`ChannelSet`]; sorted and deduplicated on the way in.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct ChannelSetParts {
    indices: Vec<usize>,
}

#[cfg(feature = "serde")]
impl From<ChannelSetParts> for ChannelSet {
    fn from(parts: ChannelSetParts) -> Self {
        Self::normalized(parts.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_indices() {
        let set = ChannelSet::from_indices([5, 1, 5, 3], 72).unwrap();
        assert_eq!(set.as_slice(), &[1, 3, 5]);
        assert!(set.contains(3));
        assert!(!set.contains(2));
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = ChannelSet::single(12, 12).unwrap_err();
        assert!(matches!(
            err,
            Error::ChannelOutOfRange {
                channel: 12,
                channels: 12
            }
        ));
    }

    #[test]
    fn test_all_channels() {
        let set = ChannelSet::all(4);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(set.len(), 4);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_normalizes() {
        let set: ChannelSet = serde_json::from_str(r#"{"indices":[7,2,7,0]}"#).unwrap();
        assert_eq!(set.as_slice(), &[0, 2, 7]);
        assert!(set.contains(7));
        assert_eq!(set.max(), Some(7));
    }
}
