//! Interfaces to the feature extraction and association collaborators.

use formscan_core::GrayImageView;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One detected keypoint with its descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature<D> {
    pub position: Point2<f64>,
    pub descriptor: D,
}

impl<D> Feature<D> {
    pub fn new(position: Point2<f64>, descriptor: D) -> Self {
        Self {
            position,
            descriptor,
        }
    }
}

/// Candidate pairing of a template feature (`src`) with a scan feature (`dst`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    pub src: usize,
    pub dst: usize,
    /// Descriptor dissimilarity, lower is better.
    pub fit_score: f64,
}

impl Correspondence {
    pub fn new(src: usize, dst: usize, fit_score: f64) -> Self {
        Self {
            src,
            dst,
            fit_score,
        }
    }
}

/// Keypoint locations paired by index with opaque descriptors.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureSet<D> {
    points: Vec<Point2<f64>>,
    descriptors: Vec<D>,
}

impl<D> FeatureSet<D> {
    pub fn from_features(features: Vec<Feature<D>>) -> Self {
        let (points, descriptors) = features
            .into_iter()
            .map(|f| (f.position, f.descriptor))
            .unzip();
        Self {
            points,
            descriptors,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn point(&self, index: usize) -> Option<Point2<f64>> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn descriptors(&self) -> &[D] {
        &self.descriptors
    }
}

/// Keypoint detector + descriptor extractor.
pub trait FeatureExtractor {
    type Descriptor;

    fn extract(&self, image: &GrayImageView<'_>) -> Vec<Feature<Self::Descriptor>>;
}

/// Nearest-neighbour association between two descriptor lists.
///
/// Returned indices point into `src` and `dst` respectively.
pub trait DescriptorAssociator<D> {
    fn associate(&self, src: &[D], dst: &[D]) -> Vec<Correspondence>;
}
