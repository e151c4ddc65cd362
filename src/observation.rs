use chrono::NaiveDate;

use crate::error::Error;

/// Inclusive reference interval. A missing bound is open (−∞ / +∞).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl ReferenceRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            low: Some(low),
            high: Some(high),
        }
    }

    pub fn at_least(low: f64) -> Self {
        Self {
            low: Some(low),
            high: None,
        }
    }

    pub fn at_most(high: f64) -> Self {
        Self {
            low: None,
            high: Some(high),
        }
    }

    pub fn is_below(&self, value: f64) -> bool {
        self.low.is_some_and(|low| value < low)
    }

    pub fn is_above(&self, value: f64) -> bool {
        self.high.is_some_and(|high| value > high)
    }

    pub fn contains(&self, value: f64) -> bool {
        !self.is_below(value) && !self.is_above(value)
    }

    /// `high - low`, or `None` when either side is open.
    pub fn width(&self) -> Option<f64> {
        match (self.low, self.high) {
            (Some(low), Some(high)) => Some(high - low),
            _ => None,
        }
    }

    /// Printable form as used in the reference column, e.g. `3.5-5.2`, `< 35`.
    pub fn display(&self, decimals: Option<usize>) -> String {
        let fmt = |v: f64| format_value(v, decimals);
        match (self.low, self.high) {
            (Some(low), Some(high)) => format!("{}-{}", fmt(low), fmt(high)),
            (Some(low), None) => format!("> {}", fmt(low)),
            (None, Some(high)) => format!("< {}", fmt(high)),
            (None, None) => "-".to_string(),
        }
    }

    fn validate(&self, parameter: &str) -> Result<(), Error> {
        for bound in [self.low, self.high].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(Error::invalid_series(parameter, "reference bound is not finite"));
            }
        }
        if let (Some(low), Some(high)) = (self.low, self.high)
            && low > high
        {
            return Err(Error::invalid_series(
                parameter,
                format!("reference range is inverted ({low} > {high})"),
            ));
        }
        Ok(())
    }
}

pub(crate) fn format_value(value: f64, decimals: Option<usize>) -> String {
    match decimals {
        Some(d) => format!("{value:.d$}"),
        None => format!("{value}"),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub id: String,
    pub label: String,
    pub unit: String,
    /// Fixed number of decimals when printing values; `None` prints the shortest form.
    pub decimals: Option<usize>,
}

impl Parameter {
    pub fn new(id: impl Into<String>, unit: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            unit: unit.into(),
            decimals: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Row header text, e.g. `CRP (mg/dl)`.
    pub fn caption(&self) -> String {
        if self.unit.is_empty() {
            self.label.clone()
        } else {
            format!("{} ({})", self.label, self.unit)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// A parameter with its reference range and date-ordered observations.
#[derive(Clone, Debug)]
pub struct Series {
    pub parameter: Parameter,
    pub range: ReferenceRange,
    observations: Vec<Observation>,
}

impl Series {
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.value)
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.observations
            .binary_search_by_key(&date, |o| o.date)
            .ok()
            .map(|i| self.observations[i].value)
    }

    pub fn first(&self) -> &Observation {
        &self.observations[0]
    }

    pub fn last(&self) -> &Observation {
        &self.observations[self.observations.len() - 1]
    }
}

/// Validated collection of series, kept in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ObservationModel {
    series: Vec<Series>,
}

impl ObservationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_series(
        &mut self,
        parameter: Parameter,
        range: ReferenceRange,
        observations: Vec<Observation>,
    ) -> Result<(), Error> {
        let id = parameter.id.as_str();
        if self.series.iter().any(|s| s.parameter.id == id) {
            return Err(Error::invalid_series(id, "parameter already present"));
        }
        if observations.is_empty() {
            return Err(Error::invalid_series(id, "series has no observations"));
        }
        range.validate(id)?;
        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(Error::invalid_series(
                id,
                format!("non-finite value on {}", bad.date),
            ));
        }
        if let Some(pair) = observations.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(Error::invalid_series(
                id,
                format!("dates not strictly increasing ({} then {})", pair[0].date, pair[1].date),
            ));
        }

        log::debug!("add_series: {id} ({} observations)", observations.len());
        self.series.push(Series {
            parameter,
            range,
            observations,
        });
        Ok(())
    }

    pub fn series(&self, parameter_id: &str) -> Result<&Series, Error> {
        self.series
            .iter()
            .find(|s| s.parameter.id == parameter_id)
            .ok_or_else(|| Error::UnknownParameter(parameter_id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.iter()
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.series.iter().map(|s| &s.parameter)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Sorted union of every observation date.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .series
            .iter()
            .flat_map(|s| s.observations.iter().map(|o| o.date))
            .collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }
}
