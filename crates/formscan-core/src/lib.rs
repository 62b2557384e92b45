//! Core types and utilities for optical mark recognition on scanned forms.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any feature detector, barcode decoder or image codec.

mod form;
mod homography;
mod image;
mod logger;

pub use form::{
    AreaType, Corner, Corners, FieldType, FilledArea, FilledForm, FilledGroup, FilledQuestion,
    FormGroup, FormTemplate, QuestionResponse, TemplateArea, TemplateQuestion,
};
pub use homography::{homography_from_4pt, Homography, HomographyError};
pub use image::{GrayImage, GrayImageView, ImageError, ImageSource};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
