//! Evaluation metrics for multi-class predictions.
//!
//! Only classes that occur in either the true or the predicted labels are
//! reported. Precision, recall and F1 are set to zero when their
//! denominator is zero.
use std::collections::BTreeSet;
use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{PetalError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

/// Rows are true classes, columns predicted classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub counts: Array2<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
}

pub fn accuracy_score(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

fn present_codes(y_true: &[usize], y_pred: &[usize]) -> Vec<usize> {
    y_true
        .iter()
        .chain(y_pred)
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn check_inputs(y_true: &[usize], y_pred: &[usize], class_names: &[String]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(PetalError::ShapeMismatch {
            what: "predictions per true label",
            expected: y_true.len(),
            found: y_pred.len(),
        });
    }
    if let Some(&bad) = y_true.iter().chain(y_pred).find(|&&c| c >= class_names.len()) {
        return Err(PetalError::UnknownClassCode(bad));
    }
    Ok(())
}

pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], class_names: &[String]) -> Result<ConfusionMatrix> {
    check_inputs(y_true, y_pred, class_names)?;
    let codes = present_codes(y_true, y_pred);
    let position = |code: usize| codes.binary_search(&code).unwrap_or_default();

    let mut counts = Array2::<usize>::zeros((codes.len(), codes.len()));
    for (&t, &p) in y_true.iter().zip(y_pred) {
        counts[[position(t), position(p)]] += 1;
    }
    Ok(ConfusionMatrix {
        labels: codes.iter().map(|&c| class_names[c].clone()).collect(),
        counts,
    })
}

pub fn classification_report(
    y_true: &[usize],
    y_pred: &[usize],
    class_names: &[String],
) -> Result<ClassificationReport> {
    let confusion = confusion_matrix(y_true, y_pred, class_names)?;
    Ok(report_from_confusion(&confusion))
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn report_from_confusion(confusion: &ConfusionMatrix) -> ClassificationReport {
    let counts = &confusion.counts;
    let n = confusion.labels.len();
    let total: usize = counts.sum();

    let mut classes = Vec::with_capacity(n);
    for (i, label) in confusion.labels.iter().enumerate() {
        let tp = counts[[i, i]];
        let support = counts.row(i).sum();
        let predicted = counts.column(i).sum();
        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        classes.push(ClassMetrics {
            label: label.clone(),
            precision,
            recall,
            f1_score,
            support,
        });
    }

    let correct: usize = (0..n).map(|i| counts[[i, i]]).sum();
    let mean = |f: fn(&ClassMetrics) -> f64| {
        if n == 0 {
            0.0
        } else {
            classes.iter().map(f).sum::<f64>() / n as f64
        }
    };
    let weighted = |f: fn(&ClassMetrics) -> f64| {
        if total == 0 {
            0.0
        } else {
            classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
        }
    };

    let macro_avg = AverageMetrics {
        precision: mean(|c| c.precision),
        recall: mean(|c| c.recall),
        f1_score: mean(|c| c.f1_score),
        support: total,
    };
    let weighted_avg = AverageMetrics {
        precision: weighted(|c| c.precision),
        recall: weighted(|c| c.recall),
        f1_score: weighted(|c| c.f1_score),
        support: total,
    };

    ClassificationReport {
        classes,
        accuracy: ratio(correct, total),
        macro_avg,
        weighted_avg,
    }
}

/// Report, confusion matrix and accuracy for one held-out partition.
pub fn evaluate(y_true: &[usize], y_pred: &[usize], class_names: &[String]) -> Result<Evaluation> {
    let confusion = confusion_matrix(y_true, y_pred, class_names)?;
    let report = report_from_confusion(&confusion);
    Ok(Evaluation {
        accuracy: accuracy_score(y_true, y_pred),
        report,
        confusion,
    })
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support",
            width = width
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1_score, c.support,
                width = width
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support,
            width = width
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1_score, avg.support,
                width = width
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.counts.rows() {
            let cells: Vec<String> = row.iter().map(|c| format!("{:>4}", c)).collect();
            writeln!(f, "[{}]", cells.join(""))?;
        }
        Ok(())
    }
}
