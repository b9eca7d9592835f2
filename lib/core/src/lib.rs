//! # mane Core
//!
//! Core library for the mane recommendation engine.
//!
//! This crate provides the fundamental data structures shared by the
//! inference and recommendation layers:
//!
//! - [`SurveyRecord`] - A raw questionnaire response with [`FieldLookup`]
//!   access for both typed and mapping representations
//! - [`FeatureEncoder`] / [`EncoderState`] - The fitted survey-to-vector
//!   transform with a canonical column layout
//! - [`ModelKind`] - The four frozen classifiers with their shared label
//!   maps, rule names and model ids
//! - [`Error`] / [`Result`] - The crate-wide error taxonomy
//!
//! ## Example
//!
//! ```rust
//! use mane_core::{FeatureEncoder, FeatureSchema, SurveyRecord};
//!
//! let schema = FeatureSchema {
//!     numeric: vec!["water".to_string()],
//!     ordinal: vec!["porosity".to_string()],
//!     nominal: vec![],
//!     binary: vec![],
//!     target: None,
//! };
//!
//! let rows = vec![
//!     SurveyRecord::new(1, 1).with_field("water", 2.0).with_field("porosity", "low"),
//!     SurveyRecord::new(2, 1).with_field("water", 3.0).with_field("porosity", "high"),
//! ];
//!
//! let mut encoder = FeatureEncoder::new(schema);
//! encoder.fit(&rows).unwrap();
//! let vector = encoder.transform(&rows[0]).unwrap();
//! assert_eq!(vector.len(), encoder.feature_columns().unwrap().len());
//! ```

pub mod encoder;
pub mod error;
pub mod labels;
pub mod survey;

pub use encoder::{EncoderState, FeatureEncoder, FeatureSchema, ORDINAL_UNKNOWN};
pub use error::{Error, Result};
pub use labels::ModelKind;
pub use survey::{FieldLookup, SurveyRecord};
