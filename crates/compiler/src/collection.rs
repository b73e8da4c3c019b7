//! Immutable collections of media assets with aggregate statistics.

use crate::asset::MediaAsset;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq)]
pub enum CollectionError {
    #[error("No media assets found")]
    Empty,

    #[error("Duplicate asset identifier '{0}'")]
    DuplicateIdentifier(String),
}

/// A set of assets with aggregates fixed at construction.
///
/// Collections are rebuilt after every stage rather than updated, so the
/// aggregates always describe exactly the members.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCollection {
    /// Members in ascending identifier order
    assets: Vec<MediaAsset>,
    min_width: u32,
    max_width: u32,
    min_height: u32,
    max_height: u32,
    total_duration_secs: f64,
}

impl AssetCollection {
    /// Build a collection, computing every aggregate in one pass.
    ///
    /// Fails on an empty input (the average duration would be undefined) and
    /// on repeated identifiers.
    pub fn new(mut assets: Vec<MediaAsset>) -> Result<Self, CollectionError> {
        if assets.is_empty() {
            return Err(CollectionError::Empty);
        }

        assets.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        if let Some(pair) = assets.windows(2).find(|w| w[0].identifier == w[1].identifier) {
            return Err(CollectionError::DuplicateIdentifier(pair[0].identifier.clone()));
        }

        let mut min_width = u32::MAX;
        let mut max_width = 0;
        let mut min_height = u32::MAX;
        let mut max_height = 0;
        let mut total_duration_secs = 0.0;
        for asset in &assets {
            total_duration_secs += asset.duration_secs;
            min_width = min_width.min(asset.width);
            max_width = max_width.max(asset.width);
            min_height = min_height.min(asset.height);
            max_height = max_height.max(asset.height);
        }

        Ok(Self {
            assets,
            min_width,
            max_width,
            min_height,
            max_height,
            total_duration_secs,
        })
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn min_width(&self) -> u32 {
        self.min_width
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    pub fn min_height(&self) -> u32 {
        self.min_height
    }

    pub fn max_height(&self) -> u32 {
        self.max_height
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration_secs
    }

    pub fn average_duration_secs(&self) -> f64 {
        self.total_duration_secs / self.assets.len() as f64
    }

    /// Members in ascending identifier order, or descending when `reverse`.
    pub fn sorted(&self, reverse: bool) -> Vec<&MediaAsset> {
        if reverse {
            self.assets.iter().rev().collect()
        } else {
            self.assets.iter().collect()
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&MediaAsset> {
        self.assets
            .binary_search_by(|asset| asset.identifier.as_str().cmp(identifier))
            .ok()
            .map(|index| &self.assets[index])
    }

    /// Log the collection summary
    pub fn log_summary(&self) {
        info!(
            videos = self.len(),
            total_minutes = self.total_duration_secs / 60.0,
            average_secs = self.average_duration_secs(),
            "video collection info"
        );
        info!(
            "min width/height: {} / {}, max width/height: {} / {}",
            self.min_width, self.min_height, self.max_width, self.max_height
        );
    }
}
