//! Alignment metrics collection
//!
//! Records and aggregates per-context alignment statistics from
//! [`ContextReport`] values.

use contracts::ContextReport;
use metrics::{counter, gauge, histogram};

/// Record metrics from one context report
///
/// Call once per registered sync context.
pub fn record_context_report(report: &ContextReport) {
    counter!("aligner_contexts_total").increment(1);

    gauge!(
        "aligner_match_ratio",
        "context" => report.context.to_string()
    )
    .set(report.match_ratio());

    histogram!("aligner_match_ratio_hist").record(report.match_ratio());

    if report.unmatched_anchors > 0 {
        counter!(
            "aligner_unmatched_anchors_total",
            "context" => report.context.to_string()
        )
        .increment(report.unmatched_anchors as u64);
    }

    if let Some(cost) = report.mean_path_cost {
        histogram!(
            "aligner_mean_path_cost",
            "context" => report.context.to_string()
        )
        .record(cost);
    }

    if report.warnings > 0 {
        counter!(
            "aligner_context_warnings_total",
            "context" => report.context.to_string()
        )
        .increment(report.warnings as u64);
    }

    let failed = report.segments_total - report.segments_mapped;
    gauge!(
        "aligner_segments_unmapped",
        "context" => report.context.to_string()
    )
    .set(failed as f64);
}

/// Record final table assembly
pub fn record_table_assembled(rows: usize, contexts: usize) {
    counter!("aligner_tables_total").increment(1);
    gauge!("aligner_table_rows_last").set(rows as f64);
    gauge!("aligner_table_contexts_last").set(contexts as f64);
}

/// Alignment metrics aggregator
///
/// Aggregates context reports in memory for a run summary.
#[derive(Debug, Clone, Default)]
pub struct AlignmentMetricsAggregator {
    /// Contexts seen
    pub total_contexts: u64,

    /// Matched anchors across contexts
    pub total_matched: u64,

    /// Unmatched anchors across contexts
    pub total_unmatched: u64,

    /// (segment, context) pairs that could not be mapped
    pub total_unmapped_pairs: u64,

    /// Warnings across contexts
    pub total_warnings: u64,

    /// Match-ratio statistics
    pub match_ratio_stats: RunningStats,

    /// Mean-path-cost statistics
    pub cost_stats: RunningStats,

    /// Warning counts per context
    pub warnings_by_context: std::collections::HashMap<String, u64>,
}

impl AlignmentMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one context report into the aggregate
    pub fn update(&mut self, report: &ContextReport) {
        self.total_contexts += 1;
        self.total_matched += report.matched_anchors as u64;
        self.total_unmatched += report.unmatched_anchors as u64;
        self.total_unmapped_pairs += (report.segments_total - report.segments_mapped) as u64;
        self.total_warnings += report.warnings as u64;

        self.match_ratio_stats.push(report.match_ratio());
        if let Some(cost) = report.mean_path_cost {
            self.cost_stats.push(cost);
        }

        if report.warnings > 0 {
            *self
                .warnings_by_context
                .entry(report.context.to_string())
                .or_insert(0) += report.warnings as u64;
        }
    }

    /// Produce a summary report
    pub fn summary(&self) -> MetricsSummary {
        let total_anchors = self.total_matched + self.total_unmatched;
        MetricsSummary {
            total_contexts: self.total_contexts,
            total_matched: self.total_matched,
            total_unmatched: self.total_unmatched,
            total_unmapped_pairs: self.total_unmapped_pairs,
            total_warnings: self.total_warnings,
            unmatched_rate: if total_anchors > 0 {
                self.total_unmatched as f64 / total_anchors as f64 * 100.0
            } else {
                0.0
            },
            match_ratio: StatsSummary::from(&self.match_ratio_stats),
            mean_path_cost: StatsSummary::from(&self.cost_stats),
            warnings_by_context: self.warnings_by_context.clone(),
        }
    }

    /// Reset the aggregate
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aggregated run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_contexts: u64,
    pub total_matched: u64,
    pub total_unmatched: u64,
    pub total_unmapped_pairs: u64,
    pub total_warnings: u64,
    pub unmatched_rate: f64,
    pub match_ratio: StatsSummary,
    pub mean_path_cost: StatsSummary,
    pub warnings_by_context: std::collections::HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Alignment Metrics Summary ===")?;
        writeln!(f, "Contexts: {}", self.total_contexts)?;
        writeln!(
            f,
            "Unmatched anchors: {} ({:.2}%)",
            self.total_unmatched, self.unmatched_rate
        )?;
        writeln!(f, "Unmapped (segment, context) pairs: {}", self.total_unmapped_pairs)?;
        writeln!(f, "Warnings: {}", self.total_warnings)?;
        writeln!(f, "Match ratio: {}", self.match_ratio)?;
        writeln!(f, "Mean path cost: {}", self.mean_path_cost)?;

        if !self.warnings_by_context.is_empty() {
            writeln!(f, "Warnings per context:")?;
            for (context, count) in &self.warnings_by_context {
                writeln!(f, "  {}: {}", context, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
