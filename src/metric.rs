//! Metric and descriptor types emitted by collectors.
//!
//! A [`Desc`] carries the structural metadata of a metric family (fully-qualified
//! name, help text, variable label names). A [`Metric`] pairs a shared descriptor
//! with its label values and a numeric sample.

use std::fmt;
use std::sync::Arc;

use strum_macros::{AsRefStr, Display};

/// Kind of value a metric carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// Descriptor of a metric family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desc {
    fq_name: String,
    help: String,
    variable_labels: Vec<String>,
}

impl Desc {
    /// Create a descriptor with the given fully-qualified name, help text and label names.
    pub fn new(fq_name: impl Into<String>, help: impl Into<String>, labels: &[&str]) -> Self {
        Self {
            fq_name: fq_name.into(),
            help: help.into(),
            variable_labels: labels.iter().map(|l| (*l).to_string()).collect(),
        }
    }

    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn variable_labels(&self) -> &[String] {
        &self.variable_labels
    }

    /// Label names rendered as `{a,b}`, or `{}` when there are none.
    pub fn label_list(&self) -> String {
        format!("{{{}}}", self.variable_labels.join(","))
    }
}

impl fmt::Display for Desc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Desc{{fqName: {:?}, help: {:?}, constLabels: {{}}, variableLabels: {}}}",
            self.fq_name,
            self.help,
            self.label_list()
        )
    }
}

/// A single sample for a descriptor.
#[derive(Debug, Clone)]
pub struct Metric {
    desc: Arc<Desc>,
    kind: MetricKind,
    label_values: Vec<String>,
    value: f64,
}

impl Metric {
    /// Create a gauge sample.
    ///
    /// Label values are matched positionally against the descriptor's label names.
    pub fn gauge(desc: &Arc<Desc>, value: f64, label_values: &[&str]) -> Self {
        Self::new(desc, MetricKind::Gauge, value, label_values)
    }

    /// Create a counter sample.
    pub fn counter(desc: &Arc<Desc>, value: f64, label_values: &[&str]) -> Self {
        Self::new(desc, MetricKind::Counter, value, label_values)
    }

    fn new(desc: &Arc<Desc>, kind: MetricKind, value: f64, label_values: &[&str]) -> Self {
        debug_assert_eq!(
            desc.variable_labels().len(),
            label_values.len(),
            "label cardinality mismatch for {}",
            desc.fq_name()
        );
        Self {
            desc: Arc::clone(desc),
            kind,
            label_values: label_values.iter().map(|v| (*v).to_string()).collect(),
            value,
        }
    }

    pub fn desc(&self) -> &Arc<Desc> {
        &self.desc
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desc_accessors() {
        let desc = Desc::new(
            "ipmi_fan_speed_rpm",
            "Fan speed in rotations per minute.",
            &["id", "name"],
        );
        assert_eq!(desc.fq_name(), "ipmi_fan_speed_rpm");
        assert_eq!(desc.help(), "Fan speed in rotations per minute.");
        assert_eq!(desc.variable_labels(), ["id".to_string(), "name".to_string()]);
        assert_eq!(desc.label_list(), "{id,name}");
    }

    #[test]
    fn test_desc_display() {
        let desc = Desc::new("ipmi_up", "'1' if scrape succeeded.", &[]);
        assert_eq!(
            desc.to_string(),
            r#"Desc{fqName: "ipmi_up", help: "'1' if scrape succeeded.", constLabels: {}, variableLabels: {}}"#
        );
    }

    #[test]
    fn test_metric_shares_descriptor() {
        let desc = Arc::new(Desc::new(
            "ipmi_sel_logs_count",
            "Current number of log entries.",
            &[],
        ));
        let a = Metric::gauge(&desc, 3.0, &[]);
        let b = Metric::counter(&desc, 4.0, &[]);
        assert!(Arc::ptr_eq(a.desc(), b.desc()));
        assert_eq!(a.kind(), MetricKind::Gauge);
        assert_eq!(b.kind().as_ref(), "counter");
        assert_eq!(b.value(), 4.0);
    }
}
