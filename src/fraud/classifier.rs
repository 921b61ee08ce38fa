// src/fraud/classifier.rs
use serde::{Deserialize, Serialize};

/// Per-feature standardization fit on the training fold. Zero-variance
/// features get a unit scale so transforming them is a no-op instead of a
/// division by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let feature_count = rows.first().map_or(0, Vec::len);
        let mut means = vec![0.0; feature_count];
        let mut stds = vec![1.0; feature_count];
        if rows.is_empty() {
            return Self { means, stds };
        }

        let n = rows.len() as f64;
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        for (feature, std) in stds.iter_mut().enumerate() {
            let variance = rows
                .iter()
                .map(|row| {
                    let delta = row[feature] - means[feature];
                    delta * delta
                })
                .sum::<f64>()
                / n;
            let deviation = variance.sqrt();
            *std = if deviation == 0.0 { 1.0 } else { deviation };
        }

        Self { means, stds }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(value, (mean, std))| (value - mean) / std)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}

/// Logistic regression trained by full-batch gradient descent on log loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudClassifier {
    weights: Vec<f64>,
    bias: f64,
    learning_rate: f64,
    max_iter: usize,
}

impl FraudClassifier {
    /// Initializes the model with zero weights.
    pub fn new(feature_count: usize, learning_rate: f64, max_iter: usize) -> Self {
        Self {
            weights: vec![0.0; feature_count],
            bias: 0.0,
            learning_rate,
            max_iter,
        }
    }

    /// P(label = 1) for one standardized feature row.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let logit: f64 = self.bias
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(weight, feature)| weight * feature)
                .sum::<f64>();
        1.0 / (1.0 + (-logit).exp())
    }

    pub fn classify(&self, features: &[f64]) -> u8 {
        if self.predict_proba(features) >= 0.5 {
            1
        } else {
            0
        }
    }

    pub fn fit(&mut self, rows: &[Vec<f64>], labels: &[f64]) {
        let n = rows.len();
        if n == 0 {
            return;
        }
        for _ in 0..self.max_iter {
            let mut weight_gradients = vec![0.0; self.weights.len()];
            let mut bias_gradient = 0.0;
            for (row, &label) in rows.iter().zip(labels) {
                let error = label - self.predict_proba(row);
                for (gradient, &feature) in weight_gradients.iter_mut().zip(row) {
                    *gradient += error * feature;
                }
                bias_gradient += error;
            }
            for (weight, gradient) in self.weights.iter_mut().zip(&weight_gradients) {
                *weight += self.learning_rate * gradient / n as f64;
            }
            self.bias += self.learning_rate * bias_gradient / n as f64;
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }
}

/// Confusion counts and derived metrics for the binary screening task.
/// Class 1 is the fraud class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ClassificationReport {
    pub fn from_predictions(actual: &[u8], predicted: &[u8]) -> Self {
        let mut report = Self {
            true_negatives: 0,
            false_positives: 0,
            false_negatives: 0,
            true_positives: 0,
        };
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a, p) {
                (0, 0) => report.true_negatives += 1,
                (0, _) => report.false_positives += 1,
                (_, 0) => report.false_negatives += 1,
                _ => report.true_positives += 1,
            }
        }
        report
    }

    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_negatives + self.true_positives) as f64 / total as f64
    }

    pub fn precision(&self, class: u8) -> f64 {
        let (correct, predicted) = match class {
            0 => (
                self.true_negatives,
                self.true_negatives + self.false_negatives,
            ),
            _ => (
                self.true_positives,
                self.true_positives + self.false_positives,
            ),
        };
        ratio(correct, predicted)
    }

    pub fn recall(&self, class: u8) -> f64 {
        let (correct, actual) = match class {
            0 => (
                self.true_negatives,
                self.true_negatives + self.false_positives,
            ),
            _ => (
                self.true_positives,
                self.true_positives + self.false_negatives,
            ),
        };
        ratio(correct, actual)
    }

    pub fn f1(&self, class: u8) -> f64 {
        let precision = self.precision(class);
        let recall = self.recall(class);
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }

    pub fn support(&self, class: u8) -> usize {
        match class {
            0 => self.true_negatives + self.false_positives,
            _ => self.true_positives + self.false_negatives,
        }
    }

    /// Per-class metric table plus the confusion matrix, in the classic
    /// classification-report shape.
    pub fn display(&self) -> String {
        let mut output = String::from("Class      | Precision | Recall | F1     | Support\n");
        output.push_str("-----------|-----------|--------|--------|--------\n");
        for (name, class) in [("Real (0)", 0u8), ("Fake (1)", 1u8)] {
            output.push_str(&format!(
                "{:<10} |    {:.4} | {:.4} | {:.4} | {}\n",
                name,
                self.precision(class),
                self.recall(class),
                self.f1(class),
                self.support(class)
            ));
        }
        output.push_str(&format!("\nAccuracy: {:.4} ({} rows)\n", self.accuracy(), self.total()));
        output.push_str(&format!(
            "Confusion matrix [[tn fp] [fn tp]]: [[{} {}] [{} {}]]\n",
            self.true_negatives, self.false_positives, self.false_negatives, self.true_positives
        ));
        output
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
