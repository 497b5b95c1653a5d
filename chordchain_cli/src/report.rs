// Plain-text rendering of training and analysis results for stdout.

use crate::pipeline::AnalysisReport;
use chordchain_core::training::TrainingSummary;

fn element_type(n: usize) -> String {
    if n == 1 { "chords".to_string() } else { format!("{n}-grams") }
}

pub fn format_training_summary(summary: &TrainingSummary) -> String {
    let mut out = String::new();
    for t in &summary.trained {
        out.push_str(&format!(
            "saved {} {}-gram: {} {}, {} transitions ({})\n",
            t.genre,
            t.n,
            t.vocabulary_size,
            element_type(t.n),
            t.non_zero,
            if t.sparse { "sparse" } else { "dense" },
        ));
    }
    for (genre, n) in &summary.skipped {
        out.push_str(&format!("skipped {genre} {n}-gram: not enough data\n"));
    }
    out
}

pub fn format_analysis(report: &AnalysisReport) -> String {
    let mut out = String::new();
    if report.stats.is_empty() {
        out.push_str("no trained models found\n");
        return out;
    }

    out.push_str("MATRIX SPARSITY\n");
    for s in &report.stats {
        out.push_str(&format!(
            "{:<12} {}-gram  {}x{}  density {:.4}%  active {}/{}\n",
            s.genre.name(),
            s.n,
            s.rows,
            s.cols,
            s.density * 100.0,
            s.active_ngrams,
            s.total_ngrams,
        ));
    }

    out.push_str("\nPER ORDER\n");
    for o in &report.summaries {
        out.push_str(&format!(
            "{}-gram: {} matrices, average size {:.1}, average density {:.4}%\n",
            o.n,
            o.matrices,
            o.average_size,
            o.average_density * 100.0,
        ));
    }

    if !report.comparisons.is_empty() {
        out.push_str("\nORDER COMPARISON\n");
        for c in &report.comparisons {
            out.push_str(&format!(
                "{:<12} {}-gram vs {}-gram: size {:+.1}%, density {:+.1}%, {} {} -> {} {}\n",
                c.genre.name(),
                c.n1,
                c.n2,
                c.size_change * 100.0,
                c.density_change * 100.0,
                c.elements1,
                element_type(c.n1),
                c.elements2,
                element_type(c.n2),
            ));
        }
    }
    out
}
