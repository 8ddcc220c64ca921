//! Standalone HTML summary of a training run for one descriptor.
use std::fs;
use std::path::{Path, PathBuf};

use maud::{html, Markup, PreEscaped, DOCTYPE};
use serde::Serialize;

use crate::error::{PetalError, Result};
use crate::stats::Evaluation;
use crate::trainer::TrainingOutcome;

const STYLE: &str = "
body { font-family: sans-serif; margin: 2em; color: #222; }
table { border-collapse: collapse; margin-bottom: 1.5em; }
th, td { border: 1px solid #ccc; padding: 4px 10px; text-align: right; }
th:first-child, td:first-child { text-align: left; }
.code-container {
    background-color: #f5f5f5;
    padding: 10px;
    border-radius: 5px;
    overflow-x: auto;
    font-family: monospace;
    white-space: pre-wrap;
}
";

/// A titled block of HTML.
pub struct ReportSection {
    title: String,
    content: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            content: Vec::new(),
        }
    }

    pub fn add_content(&mut self, markup: Markup) {
        self.content.push(markup);
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.content {
                    (block)
                }
            }
        }
    }
}

pub struct Report {
    title: String,
    subtitle: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str, subtitle: &str) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    h1 { (self.title) }
                    p { (self.subtitle) }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render().into_string()).map_err(|e| PetalError::io(path, e))
    }
}

fn evaluation_tables(evaluation: &Evaluation) -> Markup {
    let report = &evaluation.report;
    html! {
        table {
            tr { th { "class" } th { "precision" } th { "recall" } th { "f1-score" } th { "support" } }
            @for c in &report.classes {
                tr {
                    td { (c.label) }
                    td { (format!("{:.2}", c.precision)) }
                    td { (format!("{:.2}", c.recall)) }
                    td { (format!("{:.2}", c.f1_score)) }
                    td { (c.support) }
                }
            }
            tr {
                td { "accuracy" } td {} td {}
                td { (format!("{:.2}", report.accuracy)) }
                td { (report.macro_avg.support) }
            }
            @for (name, avg) in [("macro avg", &report.macro_avg), ("weighted avg", &report.weighted_avg)] {
                tr {
                    td { (name) }
                    td { (format!("{:.2}", avg.precision)) }
                    td { (format!("{:.2}", avg.recall)) }
                    td { (format!("{:.2}", avg.f1_score)) }
                    td { (avg.support) }
                }
            }
        }
        h3 { "Confusion matrix" }
        p { "Rows are true classes, columns predicted classes." }
        table {
            tr {
                th {}
                @for label in &evaluation.confusion.labels { th { (label) } }
            }
            @for (label, row) in evaluation.confusion.labels.iter().zip(evaluation.confusion.counts.rows()) {
                tr {
                    td { (label) }
                    @for count in row { td { (count) } }
                }
            }
        }
    }
}

/// Build the report for `outcome`. `config` is embedded verbatim as JSON.
pub fn training_report<C: Serialize>(outcome: &TrainingOutcome, config: &C) -> Result<Report> {
    let config_json = serde_json::to_string_pretty(config)
        .map_err(|e| PetalError::InvalidConfig(format!("cannot serialize configuration: {}", e)))?;

    let mut report = Report::new(
        &format!("Petal {} SVM Training Report", outcome.bundle.signature.kind),
        &format!("Generated {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")),
    );

    let model = &outcome.bundle.model;
    let mut overview = ReportSection::new("Overview");
    overview.add_content(html! {
        ul {
            li { "Descriptor: " (outcome.bundle.signature.kind.display_name()) }
            li { "Feature length: " (outcome.bundle.signature.feature_len) }
            li { "Classes: " (outcome.bundle.encoder.n_classes()) }
            li { "Training samples: " (outcome.n_train) }
            li { "Test samples: " (outcome.n_test) }
            li { "Accuracy: " (format!("{:.4}", outcome.evaluation.accuracy)) }
            @if let Some(eps) = model.kernel_eps() {
                li { "Gaussian kernel width: " (format!("{:.4}", eps)) }
            }
        }
    });
    report.add_section(overview);

    let mut evaluation = ReportSection::new("Evaluation");
    evaluation.add_content(evaluation_tables(&outcome.evaluation));
    report.add_section(evaluation);

    let mut artifacts = ReportSection::new("Artifacts");
    artifacts.add_content(html! {
        ul {
            @for path in outcome.paths.iter() {
                li { code { (path.display().to_string()) } }
            }
        }
    });
    report.add_section(artifacts);

    let mut config_section = ReportSection::new("Configuration");
    config_section.add_content(html! {
        div class="code-container" {
            pre { code { (config_json) } }
        }
    });
    report.add_section(config_section);

    Ok(report)
}

/// Write `<dir>/<name>_report.html` and return its path.
pub fn write_training_report<C: Serialize, P: AsRef<Path>>(
    outcome: &TrainingOutcome,
    config: &C,
    dir: P,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| PetalError::io(dir, e))?;
    let path = dir.join(format!("{}_report.html", outcome.name));
    training_report(outcome, config)?.save_to_file(&path)?;
    Ok(path)
}
