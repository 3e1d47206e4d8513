use super::{format_thresholds, AnalysisReport, ThresholdReport};

/// `[run] entity label: latest (N alerts)`, one line per label.
pub(super) fn analysis(report: &AnalysisReport) -> String {
    let mut out = String::new();
    for entity in &report.entities {
        for label in &entity.output.labels {
            let s = &label.summary;
            out.push_str(&format!(
                "[{}] {} {}: {} ({} alerts){}\n",
                report.run_id,
                entity.display_name(),
                s.label,
                s.latest_state,
                s.alerts,
                if s.latest_alert { " ALERT" } else { "" }
            ));
        }
    }
    out
}

pub(super) fn thresholds(report: &ThresholdReport) -> String {
    match report.spans.last() {
        Some(last) => format!(
            "[{}] {} spans over {} points; latest ({}): {}\n",
            report.run_id,
            report.spans.len(),
            report.series_len,
            last.method,
            format_thresholds(last.thresholds.as_slice())
        ),
        None => format!(
            "[{}] no spans: series of {} points is shorter than the warm-up\n",
            report.run_id, report.series_len
        ),
    }
}
