use serde::Deserialize;

use crate::observation::{ReferenceRange, Series};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Improving,
    Monitor,
    Low,
    High,
    Stable,
}

/// Legend group a status is drawn in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorTag {
    Positive,
    Caution,
    Alert,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Improving,
        Status::Monitor,
        Status::Low,
        Status::High,
        Status::Stable,
    ];

    pub fn color_tag(self) -> ColorTag {
        match self {
            Status::Improving | Status::Stable => ColorTag::Positive,
            Status::Monitor => ColorTag::Caution,
            Status::Low | Status::High => ColorTag::Alert,
        }
    }
}

impl ColorTag {
    pub fn css_class(self) -> &'static str {
        match self {
            ColorTag::Positive => "status-positive",
            ColorTag::Caution => "status-caution",
            ColorTag::Alert => "status-alert",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Width of the band just below `low`, as a fraction of `high - low`,
    /// in which an out-of-range value is reported as `Monitor` instead of `Low`.
    pub near_boundary_fraction: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            near_boundary_fraction: 0.10,
        }
    }
}

/// Classify a value sequence (oldest first) against its reference range.
///
/// Rules, first match wins:
/// 1. last value in range, first value out of range → `Improving`
/// 2. last value in range → `Stable`
/// 3. last value below `low` but within the near band → `Monitor`
/// 4. last value below `low` → `Low`
/// 5. otherwise (above `high`) → `High`
///
/// An empty slice is treated as in range.
pub fn classify(values: &[f64], range: &ReferenceRange, config: &ClassifierConfig) -> Status {
    let (Some(&first), Some(&last)) = (values.first(), values.last()) else {
        return Status::Stable;
    };

    if range.contains(last) {
        // v1 above high can only have approached from above, v1 below low from below.
        if values.len() > 1 && !range.contains(first) {
            return Status::Improving;
        }
        return Status::Stable;
    }

    if range.is_below(last) {
        if let (Some(low), Some(width)) = (range.low, range.width()) {
            let band = width * config.near_boundary_fraction.max(0.0);
            if low - last <= band {
                return Status::Monitor;
            }
        }
        return Status::Low;
    }

    Status::High
}

pub fn classify_series(series: &Series, config: &ClassifierConfig) -> Status {
    let values: Vec<f64> = series.values().collect();
    classify(&values, &series.range, config)
}
