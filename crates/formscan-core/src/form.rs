//! Template and result model for scanned forms.
//!
//! Templates describe where marks and barcode areas live in template space;
//! results carry what was found at the mapped scan-space locations.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Layout kind of a question's response points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    QuestionsByRows,
    QuestionsByCols,
    ResponsesByGrid,
}

/// Kind of a rectangular template area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaType {
    Barcode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];
}

/// The four corners of an area, one per [`Corner`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Corners {
    pub top_left: Point2<f64>,
    pub top_right: Point2<f64>,
    pub bottom_left: Point2<f64>,
    pub bottom_right: Point2<f64>,
}

impl Corners {
    /// Corners of the axis-aligned rectangle spanning `min` to `max`.
    pub fn from_rect(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self {
            top_left: min,
            top_right: Point2::new(max.x, min.y),
            bottom_left: Point2::new(min.x, max.y),
            bottom_right: max,
        }
    }

    #[inline]
    pub fn get(&self, corner: Corner) -> Point2<f64> {
        match corner {
            Corner::TopLeft => self.top_left,
            Corner::TopRight => self.top_right,
            Corner::BottomLeft => self.bottom_left,
            Corner::BottomRight => self.bottom_right,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Corner, Point2<f64>)> + '_ {
        Corner::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Map every corner through a fallible function, stopping at the first error.
    pub fn try_map<E>(
        &self,
        mut f: impl FnMut(Point2<f64>) -> Result<Point2<f64>, E>,
    ) -> Result<Self, E> {
        Ok(Self {
            top_left: f(self.top_left)?,
            top_right: f(self.top_right)?,
            bottom_left: f(self.bottom_left)?,
            bottom_right: f(self.bottom_right)?,
        })
    }
}

/// A question with named candidate mark points in template space.
///
/// Points are kept in a `BTreeMap`, so iteration yields point names in
/// ascending lexicographic order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateQuestion {
    pub name: String,
    pub field_type: FieldType,
    pub multiple: bool,
    pub reject_multiple: bool,
    pub points: BTreeMap<String, Point2<f64>>,
}

impl TemplateQuestion {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            multiple: false,
            reject_multiple: false,
            points: BTreeMap::new(),
        }
    }

    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn with_reject_multiple(mut self, reject_multiple: bool) -> Self {
        self.reject_multiple = reject_multiple;
        self
    }

    pub fn with_point(mut self, name: impl Into<String>, p: Point2<f64>) -> Self {
        self.points.insert(name.into(), p);
        self
    }
}

/// A rectangular template region, e.g. a barcode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateArea {
    pub name: String,
    pub area_type: AreaType,
    pub corners: Corners,
}

impl TemplateArea {
    pub fn new(name: impl Into<String>, area_type: AreaType, corners: Corners) -> Self {
        Self {
            name: name.into(),
            area_type,
            corners,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormGroup {
    pub questions: BTreeMap<String, TemplateQuestion>,
    pub areas: BTreeMap<String, TemplateArea>,
}

impl FormGroup {
    pub fn with_question(mut self, question: TemplateQuestion) -> Self {
        self.questions.insert(question.name.clone(), question);
        self
    }

    pub fn with_area(mut self, area: TemplateArea) -> Self {
        self.areas.insert(area.name.clone(), area);
        self
    }
}

/// A form template: named groups of questions and areas.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormTemplate {
    pub name: String,
    pub groups: BTreeMap<String, FormGroup>,
}

impl FormTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: BTreeMap::new(),
        }
    }

    pub fn with_group(mut self, name: impl Into<String>, group: FormGroup) -> Self {
        self.groups.insert(name.into(), group);
        self
    }

    pub fn question_count(&self) -> usize {
        self.groups.values().map(|g| g.questions.len()).sum()
    }

    pub fn area_count(&self) -> usize {
        self.groups.values().map(|g| g.areas.len()).sum()
    }
}

/// Recorded answer of one question.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum QuestionResponse {
    /// No mark was accepted for the question.
    NoResponse,
    /// Filled points by name, in scan space.
    Marked(BTreeMap<String, Point2<f64>>),
}

impl QuestionResponse {
    pub fn is_no_response(&self) -> bool {
        matches!(self, QuestionResponse::NoResponse)
    }

    /// Names of the marked points in ascending order; empty for `NoResponse`.
    pub fn marked_names(&self) -> Vec<&str> {
        match self {
            QuestionResponse::NoResponse => Vec::new(),
            QuestionResponse::Marked(points) => points.keys().map(String::as_str).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilledQuestion {
    pub name: String,
    pub field_type: FieldType,
    pub multiple: bool,
    pub reject_multiple: bool,
    pub response: QuestionResponse,
}

impl FilledQuestion {
    /// Empty result carrying the template's name, type and flags.
    pub fn from_template(question: &TemplateQuestion) -> Self {
        Self {
            name: question.name.clone(),
            field_type: question.field_type,
            multiple: question.multiple,
            reject_multiple: question.reject_multiple,
            response: QuestionResponse::NoResponse,
        }
    }

    /// Record a filled point, replacing the sentinel if needed.
    pub fn record(&mut self, point_name: &str, p: Point2<f64>) {
        match &mut self.response {
            QuestionResponse::Marked(points) => {
                points.insert(point_name.to_owned(), p);
            }
            QuestionResponse::NoResponse => {
                let mut points = BTreeMap::new();
                points.insert(point_name.to_owned(), p);
                self.response = QuestionResponse::Marked(points);
            }
        }
    }

    /// Drop every recorded point.
    pub fn clear(&mut self) {
        self.response = QuestionResponse::NoResponse;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilledArea {
    pub name: String,
    pub area_type: AreaType,
    /// Corners in scan space.
    pub corners: Corners,
    /// Decoded content; empty when decoding failed.
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilledGroup {
    pub questions: BTreeMap<String, FilledQuestion>,
    pub areas: BTreeMap<String, FilledArea>,
}

/// Everything extracted from one scanned image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilledForm {
    pub name: String,
    pub groups: BTreeMap<String, FilledGroup>,
}

impl FilledForm {
    pub fn question(&self, group: &str, name: &str) -> Option<&FilledQuestion> {
        self.groups.get(group)?.questions.get(name)
    }

    pub fn area(&self, group: &str, name: &str) -> Option<&FilledArea> {
        self.groups.get(group)?.areas.get(name)
    }
}
