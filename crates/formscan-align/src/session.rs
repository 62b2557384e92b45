use std::sync::Arc;

use crate::rank::best_correspondences;
use crate::{AlignError, DescriptorAssociator, FeatureExtractor, FeatureSet, PointTransformer};
use formscan_core::GrayImageView;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Lifecycle of an [`AlignmentSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Uninitialized,
    TemplateDescribed,
    /// A scan has been described but not aligned yet.
    Ready,
    Aligned,
}

/// Aligns many scans against one template.
///
/// The template feature set is described once and shared read-only (it can
/// be handed to other sessions through [`AlignmentSession::fork`]). Scan-side
/// state is replaced on every [`describe_scan`](Self::describe_scan).
pub struct AlignmentSession<E: FeatureExtractor, A> {
    extractor: E,
    associator: A,
    template: Option<Arc<FeatureSet<E::Descriptor>>>,
    scan: Option<FeatureSet<E::Descriptor>>,
    transformer: Option<PointTransformer>,
}

impl<E, A> AlignmentSession<E, A>
where
    E: FeatureExtractor,
    A: DescriptorAssociator<E::Descriptor>,
{
    pub fn new(extractor: E, associator: A) -> Self {
        Self {
            extractor,
            associator,
            template: None,
            scan: None,
            transformer: None,
        }
    }

    /// Session that starts out with an already described template.
    pub fn with_template(
        extractor: E,
        associator: A,
        template: Arc<FeatureSet<E::Descriptor>>,
    ) -> Self {
        Self {
            template: Some(template),
            ..Self::new(extractor, associator)
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.template, &self.scan, &self.transformer) {
            (None, _, _) => SessionState::Uninitialized,
            (Some(_), None, _) => SessionState::TemplateDescribed,
            (Some(_), Some(_), None) => SessionState::Ready,
            (Some(_), Some(_), Some(_)) => SessionState::Aligned,
        }
    }

    fn invalid(&self, operation: &'static str) -> AlignError {
        AlignError::InvalidState {
            operation,
            state: self.state(),
        }
    }

    /// Extract template features. Allowed once per session.
    ///
    /// Returns the number of features found.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(width = image.width, height = image.height))
    )]
    pub fn describe_template(&mut self, image: &GrayImageView<'_>) -> Result<usize, AlignError> {
        if self.template.is_some() {
            return Err(self.invalid("describe_template"));
        }
        let features = FeatureSet::from_features(self.extractor.extract(image));
        let n = features.len();
        log::debug!("template described with {n} features");
        self.template = Some(Arc::new(features));
        Ok(n)
    }

    /// Extract features of a new scan, dropping the previous scan and transform.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(width = image.width, height = image.height))
    )]
    pub fn describe_scan(&mut self, image: &GrayImageView<'_>) -> Result<usize, AlignError> {
        if self.template.is_none() {
            return Err(self.invalid("describe_scan"));
        }
        self.reset_scan();
        let features = FeatureSet::from_features(self.extractor.extract(image));
        let n = features.len();
        log::debug!("scan described with {n} features");
        self.scan = Some(features);
        Ok(n)
    }

    /// Forget the current scan; the template stays.
    pub fn reset_scan(&mut self) {
        self.scan = None;
        self.transformer = None;
    }

    /// Associate, rank and estimate the template-to-scan transform.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn align(&mut self) -> Result<&PointTransformer, AlignError> {
        let (Some(template), Some(scan)) = (&self.template, &self.scan) else {
            return Err(self.invalid("align"));
        };
        self.transformer = None;

        let matches = self
            .associator
            .associate(template.descriptors(), scan.descriptors());
        let best = best_correspondences(&matches)?;
        log::debug!(
            "{} correspondences, best fit scores {:?}",
            matches.len(),
            best.map(|c| c.fit_score)
        );

        let mut template_pts = [Point2::origin(); 4];
        let mut scan_pts = [Point2::origin(); 4];
        for (k, c) in best.iter().enumerate() {
            let out_of_range = AlignError::CorrespondenceOutOfRange {
                src: c.src,
                dst: c.dst,
            };
            template_pts[k] = template.point(c.src).ok_or(out_of_range.clone())?;
            scan_pts[k] = scan.point(c.dst).ok_or(out_of_range)?;
        }

        let transformer = PointTransformer::from_pairs(&template_pts, &scan_pts)?;
        let transformer = self.transformer.insert(transformer);
        Ok(&*transformer)
    }

    /// Transform estimated by the last successful [`align`](Self::align).
    pub fn transformer(&self) -> Result<&PointTransformer, AlignError> {
        self.transformer
            .as_ref()
            .ok_or_else(|| self.invalid("transformer"))
    }

    pub fn template_features(&self) -> Option<&Arc<FeatureSet<E::Descriptor>>> {
        self.template.as_ref()
    }

    /// New session sharing this session's template features, with no scan state.
    pub fn fork(&self) -> Self
    where
        E: Clone,
        A: Clone,
    {
        Self {
            extractor: self.extractor.clone(),
            associator: self.associator.clone(),
            template: self.template.clone(),
            scan: None,
            transformer: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Correspondence, Feature};
    use approx::assert_relative_eq;
    use formscan_core::GrayImage;

    /// Every non-white pixel is a keypoint whose descriptor is its value.
    #[derive(Clone)]
    struct MarkerPixels;

    impl FeatureExtractor for MarkerPixels {
        type Descriptor = u8;

        fn extract(&self, image: &GrayImageView<'_>) -> Vec<Feature<u8>> {
            let mut out = Vec::new();
            for y in 0..image.height {
                for x in 0..image.width {
                    let v = image.data[y * image.width + x];
                    if v < 255 {
                        out.push(Feature::new(Point2::new(x as f64, y as f64), v));
                    }
                }
            }
            out
        }
    }

    /// Pairs equal descriptors; the descriptor value doubles as the fit score.
    #[derive(Clone)]
    struct SameValue;

    impl DescriptorAssociator<u8> for SameValue {
        fn associate(&self, src: &[u8], dst: &[u8]) -> Vec<Correspondence> {
            let mut out = Vec::new();
            for (i, a) in src.iter().enumerate() {
                if let Some(j) = dst.iter().position(|b| b == a) {
                    out.push(Correspondence::new(i, j, *a as f64));
                }
            }
            out
        }
    }

    fn image_with_markers(markers: &[(usize, usize, u8)]) -> GrayImage {
        let mut img = GrayImage::filled(64, 64, 255);
        for &(x, y, v) in markers {
            img.put(x, y, v);
        }
        img
    }

    const TEMPLATE_MARKERS: [(usize, usize, u8); 5] =
        [(5, 5, 1), (40, 6, 2), (42, 44, 3), (4, 41, 4), (20, 20, 9)];

    fn shifted(dx: usize, dy: usize) -> GrayImage {
        let moved: Vec<_> = TEMPLATE_MARKERS
            .iter()
            .map(|&(x, y, v)| (x + dx, y + dy, v))
            .collect();
        image_with_markers(&moved)
    }

    #[test]
    fn aligns_translated_scan() {
        let template = image_with_markers(&TEMPLATE_MARKERS);
        let mut session = AlignmentSession::new(MarkerPixels, SameValue);
        assert_eq!(session.state(), SessionState::Uninitialized);

        assert_eq!(session.describe_template(&template.view()).unwrap(), 5);
        assert_eq!(session.state(), SessionState::TemplateDescribed);

        session.describe_scan(&shifted(3, 7).view()).unwrap();
        assert_eq!(session.state(), SessionState::Ready);

        let t = session.align().expect("aligned");
        let mapped = t.transform(Point2::new(10.0, 12.0)).unwrap();
        assert_relative_eq!(mapped, Point2::new(13.0, 19.0), epsilon = 1e-9);
        assert_eq!(session.state(), SessionState::Aligned);
    }

    #[test]
    fn new_scan_replaces_previous_transform() {
        let template = image_with_markers(&TEMPLATE_MARKERS);
        let mut session = AlignmentSession::new(MarkerPixels, SameValue);
        session.describe_template(&template.view()).unwrap();

        session.describe_scan(&shifted(1, 1).view()).unwrap();
        session.align().unwrap();

        session.describe_scan(&shifted(6, 2).view()).unwrap();
        assert!(session.transformer().is_err());
        let p = session
            .align()
            .unwrap()
            .transform(Point2::new(0.0, 0.0))
            .unwrap();
        assert_relative_eq!(p, Point2::new(6.0, 2.0), epsilon = 1e-9);
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let template = image_with_markers(&TEMPLATE_MARKERS);
        let mut session = AlignmentSession::new(MarkerPixels, SameValue);

        assert!(matches!(
            session.describe_scan(&template.view()),
            Err(AlignError::InvalidState {
                state: SessionState::Uninitialized,
                ..
            })
        ));

        session.describe_template(&template.view()).unwrap();
        assert!(matches!(
            session.align(),
            Err(AlignError::InvalidState {
                operation: "align",
                state: SessionState::TemplateDescribed
            })
        ));
        assert!(session.transformer().is_err());
        assert!(matches!(
            session.describe_template(&template.view()),
            Err(AlignError::InvalidState { .. })
        ));
    }

    #[test]
    fn too_few_matches_fail() {
        let template = image_with_markers(&TEMPLATE_MARKERS);
        let scan = image_with_markers(&[(5, 5, 1), (40, 6, 2), (42, 44, 3)]);
        let mut session = AlignmentSession::new(MarkerPixels, SameValue);
        session.describe_template(&template.view()).unwrap();
        session.describe_scan(&scan.view()).unwrap();

        assert!(matches!(
            session.align(),
            Err(AlignError::InsufficientCorrespondences { found: 3, .. })
        ));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn collinear_best_matches_are_degenerate() {
        let markers = [(5, 5, 1), (10, 10, 2), (15, 15, 3), (4, 41, 4)];
        let template = image_with_markers(&markers);
        let mut session = AlignmentSession::new(MarkerPixels, SameValue);
        session.describe_template(&template.view()).unwrap();
        session.describe_scan(&template.view()).unwrap();

        assert!(matches!(
            session.align(),
            Err(AlignError::Homography(
                formscan_core::HomographyError::DegenerateConfiguration { .. }
            ))
        ));
    }

    #[test]
    fn fork_shares_template_features() {
        let template = image_with_markers(&TEMPLATE_MARKERS);
        let mut session = AlignmentSession::new(MarkerPixels, SameValue);
        session.describe_template(&template.view()).unwrap();
        session.describe_scan(&shifted(2, 2).view()).unwrap();

        let mut forked = session.fork();
        assert_eq!(forked.state(), SessionState::TemplateDescribed);
        assert!(Arc::ptr_eq(
            session.template_features().unwrap(),
            forked.template_features().unwrap()
        ));

        forked.describe_scan(&shifted(4, 0).view()).unwrap();
        forked.align().unwrap();
        assert_eq!(session.state(), SessionState::Ready);
    }
}
