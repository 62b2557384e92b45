//! Alignment against a known perspective warp.
//!
//! Features are a 10x10 grid identified by index. The scan grid is the
//! template grid pushed through a fixed homography and listed in reverse,
//! and the associator adds wrong pairings with poor scores on top of the
//! true ones.

use approx::assert_relative_eq;
use formscan_align::{
    AlignError, AlignmentSession, Correspondence, DescriptorAssociator, Feature,
    FeatureExtractor, SessionState,
};
use formscan_core::{GrayImage, GrayImageView, Homography};
use nalgebra::Point2;
use std::sync::Arc;

const TEMPLATE_WIDTH: usize = 16;
const SCAN_WIDTH: usize = 24;
const CORNER_IDS: [u32; 4] = [0, 9, 99, 90];

fn warp() -> Homography {
    Homography::from_array([
        [0.93, 0.06, 41.0],
        [-0.04, 1.08, 17.5],
        [0.00015, -0.0001, 1.0],
    ])
}

fn grid() -> Vec<(u32, Point2<f64>)> {
    (0..100u32)
        .map(|id| {
            let (col, row) = (id % 10, id / 10);
            (id, Point2::new(60.0 + 90.0 * col as f64, 80.0 + 120.0 * row as f64))
        })
        .collect()
}

/// Returns the template or scan features depending on the image width.
#[derive(Clone)]
struct KnownFeatures;

impl FeatureExtractor for KnownFeatures {
    type Descriptor = u32;

    fn extract(&self, image: &GrayImageView<'_>) -> Vec<Feature<u32>> {
        match image.width {
            TEMPLATE_WIDTH => grid()
                .into_iter()
                .map(|(id, p)| Feature::new(p, id))
                .collect(),
            SCAN_WIDTH => {
                let h = warp();
                grid()
                    .into_iter()
                    .rev()
                    .map(|(id, p)| Feature::new(h.apply(p).unwrap(), id))
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

/// True pairs score low (corner ids best), shifted pairs score high.
#[derive(Clone)]
struct ById;

impl DescriptorAssociator<u32> for ById {
    fn associate(&self, src: &[u32], dst: &[u32]) -> Vec<Correspondence> {
        let mut out = Vec::new();
        for (i, a) in src.iter().enumerate() {
            for (j, b) in dst.iter().enumerate() {
                let score = if a == b {
                    match CORNER_IDS.iter().position(|c| c == a) {
                        Some(rank) => 0.1 * (rank + 1) as f64,
                        None => 1.0 + f64::from(*a),
                    }
                } else if *b == a + 1 {
                    500.0
                } else {
                    continue;
                };
                out.push(Correspondence::new(i, j, score));
            }
        }
        out
    }
}

fn template_image() -> GrayImage {
    GrayImage::filled(TEMPLATE_WIDTH, 8, 255)
}

fn scan_image() -> GrayImage {
    GrayImage::filled(SCAN_WIDTH, 8, 255)
}

#[test]
fn recovers_the_warp_from_the_best_four() {
    let mut session = AlignmentSession::new(KnownFeatures, ById);
    assert_eq!(session.describe_template(&template_image().view()), Ok(100));
    assert_eq!(session.describe_scan(&scan_image().view()), Ok(100));
    assert_eq!(session.state(), SessionState::Ready);

    let t = *session.align().expect("aligned");
    let h = warp();
    for (_, p) in grid() {
        assert_relative_eq!(t.transform(p).unwrap(), h.apply(p).unwrap(), max_relative = 1e-6);
    }
    assert_eq!(session.state(), SessionState::Aligned);
}

#[test]
fn forks_share_the_template_and_agree() {
    let mut session = AlignmentSession::new(KnownFeatures, ById);
    session.describe_template(&template_image().view()).unwrap();
    let mut fork = session.fork();

    let shared = session.template_features().unwrap();
    assert!(Arc::ptr_eq(shared, fork.template_features().unwrap()));

    session.describe_scan(&scan_image().view()).unwrap();
    fork.describe_scan(&scan_image().view()).unwrap();
    let a = *session.align().unwrap();
    let b = *fork.align().unwrap();
    assert_eq!(a, b);
}

#[test]
fn featureless_scan_drops_the_previous_transform() {
    let mut session = AlignmentSession::new(KnownFeatures, ById);
    session.describe_template(&template_image().view()).unwrap();
    session.describe_scan(&scan_image().view()).unwrap();
    session.align().unwrap();

    let blank = GrayImage::filled(5, 5, 255);
    assert_eq!(session.describe_scan(&blank.view()), Ok(0));
    assert!(matches!(
        session.transformer(),
        Err(AlignError::InvalidState { .. })
    ));
    assert_eq!(
        session.align().unwrap_err(),
        AlignError::InsufficientCorrespondences {
            found: 0,
            required: 4
        }
    );
    assert_eq!(session.state(), SessionState::Ready);
}
