//! Per-image scanning pipeline.

use std::sync::Arc;

use crate::aggregate::ResponseAggregator;
use crate::{FillDetector, ScanConfig, ScanError};
use formscan_align::{AlignmentSession, DescriptorAssociator, FeatureExtractor, SessionState};
use formscan_barcode::BarcodeDecoder;
use formscan_core::{FilledForm, FormTemplate, GrayImage, GrayImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Scans images of one form against its template.
///
/// The template image is described once in [`FormScanner::new`]; each call to
/// [`scan`](Self::scan) then aligns one image and reads its answers.
pub struct FormScanner<E: FeatureExtractor, A, D> {
    session: AlignmentSession<E, A>,
    decoder: Arc<D>,
    template: Arc<FormTemplate>,
    fill: FillDetector,
    config: ScanConfig,
}

impl<E, A, D> FormScanner<E, A, D>
where
    E: FeatureExtractor,
    A: DescriptorAssociator<E::Descriptor>,
    D: BarcodeDecoder,
{
    pub fn new(
        extractor: E,
        associator: A,
        decoder: D,
        template: FormTemplate,
        template_image: &GrayImageView<'_>,
        config: ScanConfig,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        let fill = FillDetector::new(config.fill)?;

        let mut session = AlignmentSession::new(extractor, associator);
        let features = session.describe_template(template_image)?;
        log::info!(
            "template `{}`: {} features, {} questions, {} areas",
            template.name,
            features,
            template.question_count(),
            template.area_count()
        );

        Ok(Self {
            session,
            decoder: Arc::new(decoder),
            template: Arc::new(template),
            fill,
            config,
        })
    }

    pub fn template(&self) -> &FormTemplate {
        &self.template
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Align `image` to the template and read every question and area.
    ///
    /// Any error aborts this image only; the scanner stays usable.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image),
            fields(width = image.width, height = image.height)
        )
    )]
    pub fn scan(
        &mut self,
        name: &str,
        image: &GrayImageView<'_>,
    ) -> Result<FilledForm, ScanError> {
        self.session.describe_scan(image)?;
        let transformer = self.session.align()?;

        let aggregator = ResponseAggregator {
            transformer,
            fill: &self.fill,
            decoder: &*self.decoder,
            barcode: &self.config.barcode,
        };
        let form = aggregator.form(image, name, &self.template)?;
        log::debug!("scanned `{name}`");
        Ok(form)
    }

    /// Scan images in order, collecting a result per image.
    pub fn scan_batch<I>(&mut self, images: I) -> BatchReport
    where
        I: IntoIterator<Item = (String, GrayImage)>,
    {
        let mut results = Vec::new();
        for (name, image) in images {
            let result = self.scan(&name, &image.view());
            if let Err(e) = &result {
                log::warn!("`{name}` skipped: {e}");
            }
            results.push((name, result));
        }

        let report = BatchReport { results };
        log::info!(
            "batch done: {} scanned, {} failed",
            report.forms().count(),
            report.failures().count()
        );
        report
    }

    /// Independent scanner sharing the template features, form and decoder.
    pub fn fork(&self) -> Self
    where
        E: Clone,
        A: Clone,
    {
        Self {
            session: self.session.fork(),
            decoder: Arc::clone(&self.decoder),
            template: Arc::clone(&self.template),
            fill: self.fill,
            config: self.config.clone(),
        }
    }
}

/// Outcome of [`FormScanner::scan_batch`], in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<(String, Result<FilledForm, ScanError>)>,
}

impl BatchReport {
    pub fn forms(&self) -> impl Iterator<Item = &FilledForm> + '_ {
        self.results.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ScanError)> + '_ {
        self.results
            .iter()
            .filter_map(|(name, r)| r.as_ref().err().map(|e| (name.as_str(), e)))
    }
}
