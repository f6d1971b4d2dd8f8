//! Held-out evaluation: accuracy, confusion matrix and per-class report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows are true classes, columns predicted classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(actual: &[usize], predicted: &[usize], n_classes: usize) -> Self {
        let n = actual
            .iter()
            .chain(predicted)
            .copied()
            .max()
            .map_or(n_classes, |m| n_classes.max(m + 1));
        let mut counts = vec![vec![0; n]; n];
        for (&a, &p) in actual.iter().zip(predicted) {
            counts[a][p] += 1;
        }
        Self { counts }
    }

    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.n_classes()).map(|i| self.counts[i][i]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f64 / total as f64,
        }
    }

    pub fn class_metrics(&self, class: usize) -> ClassMetrics {
        let tp = self.counts[class][class] as f64;
        let support: usize = self.counts[class].iter().sum();
        let predicted: usize = self.counts.iter().map(|row| row[class]).sum();

        let precision = if predicted == 0 { 0.0 } else { tp / predicted as f64 };
        let recall = if support == 0 { 0.0 } else { tp / support as f64 };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        ClassMetrics {
            class,
            precision,
            recall,
            f1,
            support,
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.counts {
            let cells: Vec<String> = row.iter().map(|c| format!("{:>5}", c)).collect();
            writeln!(f, "[{} ]", cells.join(""))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub support: usize,
    pub macro_avg: Averages,
    pub weighted_avg: Averages,
}

impl ClassificationReport {
    pub fn from_confusion(confusion: &ConfusionMatrix) -> Self {
        let classes: Vec<ClassMetrics> = (0..confusion.n_classes())
            .map(|c| confusion.class_metrics(c))
            .collect();
        let support = confusion.total();
        let k = classes.len().max(1) as f64;

        let macro_avg = Averages {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / k,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / k,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / k,
        };
        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            if support == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|c| metric(c) * c.support as f64)
                    .sum::<f64>()
                    / support as f64
            }
        };
        let weighted_avg = Averages {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
        };

        Self {
            accuracy: confusion.accuracy(),
            classes,
            support,
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.class, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}

/// Everything the train stage reports about the held-out rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
}

impl Evaluation {
    pub fn new(actual: &[usize], predicted: &[usize], n_classes: usize) -> Self {
        let confusion = ConfusionMatrix::new(actual, predicted, n_classes);
        let report = ClassificationReport::from_confusion(&confusion);
        Self {
            accuracy: confusion.accuracy(),
            confusion,
            report,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(f)?;
        writeln!(f, "Classification Report:")?;
        write!(f, "{}", self.report)?;
        writeln!(f)?;
        writeln!(f, "Confusion Matrix:")?;
        write!(f, "{}", self.confusion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_and_accuracy() {
        let actual = [0, 0, 0, 1, 1];
        let predicted = [0, 1, 0, 1, 0];

        let confusion = ConfusionMatrix::new(&actual, &predicted, 2);

        assert_eq!(confusion.counts, vec![vec![2, 1], vec![1, 1]]);
        assert!((confusion.accuracy() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_class_metrics() {
        let confusion = ConfusionMatrix::new(&[0, 0, 0, 1, 1], &[0, 1, 0, 1, 0], 2);

        let winner = confusion.class_metrics(1);
        assert!((winner.precision - 0.5).abs() < 1e-12);
        assert!((winner.recall - 0.5).abs() < 1e-12);
        assert!((winner.f1 - 0.5).abs() < 1e-12);
        assert_eq!(winner.support, 2);
    }

    #[test]
    fn test_report_averages() {
        let evaluation = Evaluation::new(&[0, 0, 0, 1], &[0, 0, 0, 0], 2);

        assert!((evaluation.accuracy - 0.75).abs() < 1e-12);
        let report = &evaluation.report;
        // class 1 is never predicted: precision 0 rather than NaN
        assert_eq!(report.classes[1].precision, 0.0);
        assert!((report.macro_avg.recall - 0.5).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 0.75).abs() < 1e-12);

        let text = evaluation.to_string();
        assert!(text.contains("Accuracy: 0.7500"));
        assert!(text.contains("weighted avg"));
    }

    #[test]
    fn test_empty_evaluation() {
        let evaluation = Evaluation::new(&[], &[], 2);
        assert_eq!(evaluation.accuracy, 0.0);
        assert_eq!(evaluation.report.support, 0);
    }
}
