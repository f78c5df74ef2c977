//! Exported metric families and their text rendering.
//!
//! A [`Family`] is the accumulator for one registration: a map from label
//! values (in the registration's label order) to a counter, gauge, or
//! histogram series. Families are rebuilt from scratch on every scrape, so no
//! atomics are needed; the exporter owns them for the duration of one fold.

use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::sync::Arc;

use tally_core::{Result, TallyError};

use crate::registry::MetricRegistration;

/// Buckets used when a histogram registration does not configure its own.
pub const DEFAULT_BUCKETS: [f64; 11] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Exported metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
        }
    }
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

#[derive(Debug, Clone)]
struct HistogramSeries {
    /// Cumulative: `buckets[i]` counts observations `<= bounds[i]`.
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

#[derive(Debug, Clone)]
enum Series {
    Counter(f64),
    Gauge(f64),
    Histogram(HistogramSeries),
}

/// Accumulator for one registration.
#[derive(Debug)]
pub struct Family {
    registration: Arc<MetricRegistration>,
    bounds: Vec<f64>,
    series: BTreeMap<Vec<String>, Series>,
}

impl Family {
    /// Empty family for a registration.
    pub fn new(registration: Arc<MetricRegistration>) -> Self {
        let bounds = match (&registration.metric_type, &registration.buckets) {
            (MetricType::Histogram, Some(b)) => b.clone(),
            (MetricType::Histogram, None) => DEFAULT_BUCKETS.to_vec(),
            _ => Vec::new(),
        };
        Self {
            registration,
            bounds,
            series: BTreeMap::new(),
        }
    }

    pub fn registration(&self) -> &Arc<MetricRegistration> {
        &self.registration
    }

    /// Number of distinct label combinations seen so far.
    pub fn series_len(&self) -> usize {
        self.series.len()
    }

    /// Counter: increment by 1.
    pub fn inc(&mut self, labels: &[&str]) -> Result<()> {
        self.inc_by(labels, 1.0)
    }

    /// Counter: increment by a non-negative delta.
    pub fn inc_by(&mut self, labels: &[&str], delta: f64) -> Result<()> {
        self.expect_type(MetricType::Counter)?;
        if !delta.is_finite() || delta < 0.0 {
            return Err(self.fold_err(format!("counter delta must be finite and >= 0, got {delta}")));
        }
        let key = self.key(labels)?;
        if let Series::Counter(v) = self.series.entry(key).or_insert(Series::Counter(0.0)) {
            *v += delta;
        }
        Ok(())
    }

    /// Gauge: overwrite the value, last write wins.
    pub fn set(&mut self, labels: &[&str], value: f64) -> Result<()> {
        self.expect_type(MetricType::Gauge)?;
        if !value.is_finite() {
            return Err(self.fold_err(format!("gauge value must be finite, got {value}")));
        }
        let key = self.key(labels)?;
        self.series.insert(key, Series::Gauge(value));
        Ok(())
    }

    /// Histogram: observe one measurement (already in exported units).
    pub fn observe(&mut self, labels: &[&str], value: f64) -> Result<()> {
        self.expect_type(MetricType::Histogram)?;
        if !value.is_finite() {
            return Err(self.fold_err(format!("histogram observation must be finite, got {value}")));
        }
        let key = self.key(labels)?;
        let empty = HistogramSeries {
            buckets: vec![0; self.bounds.len()],
            sum: 0.0,
            count: 0,
        };
        if let Series::Histogram(h) = self.series.entry(key).or_insert(Series::Histogram(empty)) {
            h.count += 1;
            h.sum += value;
            // Cumulative buckets: increment every bucket whose bound covers the value.
            for (i, &le) in self.bounds.iter().enumerate() {
                if value <= le {
                    h.buckets[i] += 1;
                }
            }
        }
        Ok(())
    }

    fn expect_type(&self, wanted: MetricType) -> Result<()> {
        if self.registration.metric_type == wanted {
            Ok(())
        } else {
            Err(self.fold_err(format!(
                "{} family cannot accept a {} update",
                self.registration.metric_type.as_str(),
                wanted.as_str()
            )))
        }
    }

    fn key(&self, labels: &[&str]) -> Result<Vec<String>> {
        let expected = self.registration.labels.len();
        if labels.len() != expected {
            return Err(self.fold_err(format!(
                "expected {expected} label values, got {}",
                labels.len()
            )));
        }
        Ok(labels.iter().map(|v| v.to_string()).collect())
    }

    fn fold_err(&self, reason: String) -> TallyError {
        TallyError::fold(self.registration.kind, reason)
    }

    fn label_str(&self, values: &[String]) -> String {
        self.registration
            .labels
            .iter()
            .zip(values)
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self, out: &mut impl Write) -> fmt::Result {
        let name = self.registration.name.as_str();
        writeln!(out, "# HELP {} {}", name, escape_help(&self.registration.help))?;
        writeln!(out, "# TYPE {} {}", name, self.registration.metric_type.as_str())?;

        // Unlabeled families always expose a value, even before any update.
        if self.series.is_empty() && self.registration.labels.is_empty() {
            return match self.registration.metric_type {
                MetricType::Counter | MetricType::Gauge => writeln!(out, "{} 0", name),
                MetricType::Histogram => {
                    let empty = HistogramSeries {
                        buckets: vec![0; self.bounds.len()],
                        sum: 0.0,
                        count: 0,
                    };
                    self.render_histogram(name, "", &empty, out)
                }
            };
        }

        for (values, series) in &self.series {
            let label_str = self.label_str(values);
            match series {
                Series::Counter(v) | Series::Gauge(v) => {
                    if label_str.is_empty() {
                        writeln!(out, "{} {}", name, v)?;
                    } else {
                        writeln!(out, "{}{{{}}} {}", name, label_str, v)?;
                    }
                }
                Series::Histogram(h) => self.render_histogram(name, &label_str, h, out)?,
            }
        }
        Ok(())
    }

    fn render_histogram(
        &self,
        name: &str,
        label_str: &str,
        h: &HistogramSeries,
        out: &mut impl Write,
    ) -> fmt::Result {
        let prefix = if label_str.is_empty() {
            String::new()
        } else {
            format!("{},", label_str)
        };
        for (le, count) in self.bounds.iter().zip(&h.buckets) {
            writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count)?;
        }
        writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, h.count)?;
        if label_str.is_empty() {
            writeln!(out, "{}_sum {}", name, h.sum)?;
            writeln!(out, "{}_count {}", name, h.count)
        } else {
            writeln!(out, "{}_sum{{{}}} {}", name, label_str, h.sum)?;
            writeln!(out, "{}_count{{{}}} {}", name, label_str, h.count)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use tally_core::{MetricKind, MetricPayload};

    fn noop(_: &mut Family, _: &MetricPayload) -> Result<()> {
        Ok(())
    }

    fn family(metric_type: MetricType, labels: &[&str], buckets: Option<Vec<f64>>) -> Family {
        let mut reg =
            MetricRegistration::new(MetricKind::FeatureUsed, "t_metric", "Test", metric_type, noop)
                .with_labels(labels);
        if let Some(b) = buckets {
            reg = reg.with_buckets(b);
        }
        Family::new(Arc::new(reg))
    }

    fn rendered(f: &Family) -> String {
        let mut out = String::new();
        f.render(&mut out).unwrap();
        out
    }

    #[test]
    fn counter_folds_per_label_combination() {
        let mut f = family(MetricType::Counter, &["feature"], None);
        f.inc(&["a"]).unwrap();
        f.inc(&["a"]).unwrap();
        f.inc_by(&["b"], 3.0).unwrap();
        let out = rendered(&f);
        assert!(out.contains("# TYPE t_metric counter"));
        assert!(out.contains("t_metric{feature=\"a\"} 2\n"));
        assert!(out.contains("t_metric{feature=\"b\"} 3\n"));
    }

    #[test]
    fn gauge_last_write_wins() {
        let mut f = family(MetricType::Gauge, &["event"], None);
        f.set(&["x"], 10.0).unwrap();
        f.set(&["x"], 2.5).unwrap();
        assert_eq!(f.series_len(), 1);
        assert!(rendered(&f).contains("t_metric{event=\"x\"} 2.5\n"));
    }

    #[test]
    fn histogram_buckets_are_cumulative() {
        let mut f = family(MetricType::Histogram, &["op"], Some(vec![0.1, 1.0]));
        f.observe(&["q"], 0.0625).unwrap();
        f.observe(&["q"], 0.5).unwrap();
        f.observe(&["q"], 7.0).unwrap();
        let out = rendered(&f);
        assert!(out.contains("t_metric_bucket{op=\"q\",le=\"0.1\"} 1\n"));
        assert!(out.contains("t_metric_bucket{op=\"q\",le=\"1\"} 2\n"));
        assert!(out.contains("t_metric_bucket{op=\"q\",le=\"+Inf\"} 3\n"));
        assert!(out.contains("t_metric_count{op=\"q\"} 3\n"));
        assert!(out.contains("t_metric_sum{op=\"q\"} 7.5625\n"));
    }

    #[test]
    fn unlabeled_empty_family_renders_zero() {
        let f = family(MetricType::Gauge, &[], None);
        assert!(rendered(&f).ends_with("t_metric 0\n"));
    }

    #[test]
    fn label_values_are_escaped() {
        let mut f = family(MetricType::Counter, &["path"], None);
        f.inc(&["a\"b\\c\nd"]).unwrap();
        assert!(rendered(&f).contains(r#"t_metric{path="a\"b\\c\nd"} 1"#));
    }

    #[test]
    fn wrong_shape_is_a_fold_error() {
        let mut f = family(MetricType::Counter, &["feature"], None);
        assert!(f.inc(&[]).is_err());
        assert!(f.set(&["a"], 1.0).is_err());
        assert!(f.inc_by(&["a"], -1.0).is_err());
        assert_eq!(f.series_len(), 0);
    }
}
