//! Turning mapped template points and areas into recorded answers.

use crate::area::{crop_rect, locate_area};
use crate::{FillDetector, ScanError};
use formscan_align::PointTransformer;
use formscan_barcode::{resolve_barcode, BarcodeDecoder, BarcodeParams};
use formscan_core::{
    FilledArea, FilledForm, FilledGroup, FilledQuestion, FormGroup, FormTemplate, ImageSource,
    TemplateArea, TemplateQuestion,
};

/// Everything needed to read answers off one aligned scan.
pub struct ResponseAggregator<'a, D: ?Sized> {
    pub transformer: &'a PointTransformer,
    pub fill: &'a FillDetector,
    pub decoder: &'a D,
    pub barcode: &'a BarcodeParams,
}

impl<D: BarcodeDecoder + ?Sized> ResponseAggregator<'_, D> {
    /// Record the filled points of one question.
    ///
    /// Points are visited in ascending name order. A single-answer question
    /// keeps the first filled point, or ends with no response as soon as a
    /// second one is filled when `reject_multiple` is set. A multiple-answer
    /// question records every filled point.
    pub fn question<I: ImageSource + ?Sized>(
        &self,
        image: &I,
        question: &TemplateQuestion,
    ) -> Result<FilledQuestion, ScanError> {
        let mut filled = FilledQuestion::from_template(question);
        let mut count = 0usize;

        for (name, &template_pt) in &question.points {
            let p = self.transformer.transform(template_pt)?;
            if !self.fill.is_filled(image, p)? {
                continue;
            }
            count += 1;
            filled.record(name, p);

            if !question.multiple {
                if question.reject_multiple && count > 1 {
                    log::debug!("question `{}`: multiple marks rejected", question.name);
                    filled.clear();
                    break;
                }
                if !question.reject_multiple {
                    break;
                }
            }
        }
        Ok(filled)
    }

    /// Map, crop and decode one area. Decode failures leave the text empty.
    pub fn area<I: ImageSource + ?Sized>(
        &self,
        image: &I,
        area: &TemplateArea,
    ) -> Result<FilledArea, ScanError> {
        let corners = locate_area(self.transformer, area)?;
        let rect = crop_rect(&corners)?;
        let crop = image.crop(rect.x, rect.y, rect.width, rect.height)?;
        let resolution = resolve_barcode(self.decoder, &crop.view(), self.barcode);
        if !resolution.is_decoded() {
            log::warn!("area `{}`: barcode not decoded", area.name);
        }

        Ok(FilledArea {
            name: area.name.clone(),
            area_type: area.area_type,
            corners,
            text: resolution.text,
        })
    }

    pub fn group<I: ImageSource + ?Sized>(
        &self,
        image: &I,
        group: &FormGroup,
    ) -> Result<FilledGroup, ScanError> {
        let mut out = FilledGroup::default();
        for (name, question) in &group.questions {
            out.questions
                .insert(name.clone(), self.question(image, question)?);
        }
        for (name, area) in &group.areas {
            out.areas.insert(name.clone(), self.area(image, area)?);
        }
        Ok(out)
    }

    /// One result per template question and area, grouped like the template.
    pub fn form<I: ImageSource + ?Sized>(
        &self,
        image: &I,
        name: &str,
        template: &FormTemplate,
    ) -> Result<FilledForm, ScanError> {
        let mut form = FilledForm {
            name: name.to_owned(),
            ..FilledForm::default()
        };
        for (group_name, group) in &template.groups {
            form.groups
                .insert(group_name.clone(), self.group(image, group)?);
        }
        Ok(form)
    }
}
