//! JSON loaders for datasets and narratives.
//!
//! A dataset looks like:
//!
//! ```json
//! {"parameters": [
//!   {"id": "CRP", "unit": "mg/dl", "range": {"high": 0.5},
//!    "observations": [{"date": "2025-07-24", "value": 14.3}]}
//! ]}
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::document::{Labels, Narrative};
use crate::error::Error;
use crate::model::RichText;
use crate::observation::{Observation, ObservationModel, Parameter, ReferenceRange};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DatasetFile {
    parameters: Vec<ParameterRecord>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ParameterRecord {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    decimals: Option<usize>,
    #[serde(default)]
    range: RangeRecord,
    observations: Vec<ObservationRecord>,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RangeRecord {
    low: Option<f64>,
    high: Option<f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ObservationRecord {
    date: NaiveDate,
    value: f64,
}

/// Narrative text as stored on disk. Rich text fields use the `<b>`/`<br/>`
/// markup understood by [`RichText::parse`].
#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct NarrativeFile {
    title: String,
    subtitle: String,
    commentary_heading: String,
    commentary: String,
    summary_heading: String,
    detail_heading: String,
    closing_heading: String,
    closing: String,
    labels: Labels,
}

/// Parse a dataset and validate every series through [`ObservationModel::add_series`].
pub fn parse_dataset(text: &str) -> Result<ObservationModel, Error> {
    let file: DatasetFile =
        serde_json::from_str(text).map_err(|e| Error::Input(format!("dataset: {e}")))?;
    let mut model = ObservationModel::new();
    for record in file.parameters {
        let mut parameter = Parameter::new(record.id, record.unit);
        if let Some(label) = record.label {
            parameter = parameter.with_label(label);
        }
        if let Some(decimals) = record.decimals {
            parameter = parameter.with_decimals(decimals);
        }
        let range = ReferenceRange {
            low: record.range.low,
            high: record.range.high,
        };
        let observations = record
            .observations
            .into_iter()
            .map(|o| Observation::new(o.date, o.value))
            .collect();
        model.add_series(parameter, range, observations)?;
    }
    log::debug!("parse_dataset: {} parameters", model.len());
    Ok(model)
}

pub fn load_dataset(path: &Path) -> Result<ObservationModel, Error> {
    let text = std::fs::read_to_string(path)?;
    parse_dataset(&text)
}

pub fn parse_narrative(text: &str) -> Result<Narrative, Error> {
    let file: NarrativeFile =
        serde_json::from_str(text).map_err(|e| Error::Input(format!("narrative: {e}")))?;
    Ok(Narrative {
        title: file.title,
        subtitle: file.subtitle,
        commentary_heading: file.commentary_heading,
        commentary: RichText::parse(&file.commentary),
        summary_heading: file.summary_heading,
        detail_heading: file.detail_heading,
        closing_heading: file.closing_heading,
        closing: RichText::parse(&file.closing),
        labels: file.labels,
    })
}

pub fn load_narrative(path: &Path) -> Result<Narrative, Error> {
    let text = std::fs::read_to_string(path)?;
    parse_narrative(&text)
}
