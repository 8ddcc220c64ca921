use linfa::dataset::Pr;
use linfa::traits::Predict;
use linfa::Dataset;
use linfa_svm::Svm;
use linfa_svm::SvmParams;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::config::{Kernel, ModelConfig};
use crate::error::{PetalError, Result};

/// Multi-class SVM built from one Platt-calibrated class-vs-rest machine per
/// class. Class probabilities are the calibrated scores normalised to sum to
/// one, and `predict` is their arg-max.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    params: ModelConfig,
    n_features: usize,
    /// Resolved gaussian width, recorded for reporting.
    kernel_eps: Option<f64>,
    models: Vec<Svm<f64, Pr>>,
}

impl SVMClassifier {
    pub fn new(params: ModelConfig) -> Self {
        SVMClassifier {
            params,
            n_features: 0,
            kernel_eps: None,
            models: Vec::new(),
        }
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    pub fn n_classes(&self) -> usize {
        self.models.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_fitted(&self) -> bool {
        !self.models.is_empty()
    }

    /// Width of the gaussian kernel actually used, if any.
    pub fn kernel_eps(&self) -> Option<f64> {
        self.kernel_eps
    }

    /// Fit on rows of `x` with encoded labels `y` in `0..n_classes`.
    ///
    /// Every class must have at least one sample in `y`.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        self.params.validate()?;
        if x.nrows() != y.len() {
            return Err(PetalError::ShapeMismatch {
                what: "labels per feature row",
                expected: x.nrows(),
                found: y.len(),
            });
        }
        if n_classes < 2 {
            return Err(PetalError::TooFewClasses(n_classes));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(PetalError::UnknownClassCode(bad));
        }

        let kernel_eps = match self.params.kernel {
            Kernel::Gaussian { eps } => Some(eps.unwrap_or_else(|| scale_heuristic(x))),
            _ => None,
        };
        let params = self.svm_params(kernel_eps);

        let mut models = Vec::with_capacity(n_classes);
        for class in 0..n_classes {
            let targets: Array1<bool> = y.iter().map(|&c| c == class).collect();
            let positives = targets.iter().filter(|&&t| t).count();
            if positives == 0 {
                return Err(PetalError::InsufficientSamples(format!(
                    "class code {} has no training samples",
                    class
                )));
            }

            let dataset = Dataset::new(x.to_owned(), targets);
            let model = <SvmParams<f64, Pr> as linfa::traits::Fit<_, _, _>>::fit(&params, &dataset)
                .map_err(|e| PetalError::Svm(e.to_string()))?;
            log::debug!(
                "Fitted class {} vs rest ({} positives / {} samples)",
                class,
                positives,
                y.len()
            );
            models.push(model);
        }

        self.n_features = x.ncols();
        self.kernel_eps = kernel_eps;
        self.models = models;
        Ok(())
    }

    fn svm_params(&self, kernel_eps: Option<f64>) -> SvmParams<f64, Pr> {
        let (c1, c2) = self.params.c;
        let model: SvmParams<f64, Pr> = Svm::<f64, Pr>::params()
            .eps(self.params.eps)
            .pos_neg_weights(c1, c2);

        // Chain the kernel configuration based on the kernel type
        match &self.params.kernel {
            Kernel::Linear => model.linear_kernel(),
            Kernel::Gaussian { eps } => model.gaussian_kernel(kernel_eps.or(*eps).unwrap_or(1.0)),
            Kernel::Polynomial { constant, degree } => model.polynomial_kernel(*constant, *degree),
        }
    }

    /// Class probabilities, one row per sample and one column per class code.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted() {
            return Err(PetalError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(PetalError::ShapeMismatch {
                what: "classifier input width",
                expected: self.n_features,
                found: x.ncols(),
            });
        }

        let mut proba = Array2::<f64>::zeros((x.nrows(), self.models.len()));
        for (class, model) in self.models.iter().enumerate() {
            let scores: Array1<Pr> = model.predict(x);
            for (row, p) in scores.iter().enumerate() {
                let p: f32 = **p;
                proba[[row, class]] = f64::from(p);
            }
        }

        let n_classes = self.models.len() as f64;
        for mut row in proba.axis_iter_mut(Axis(0)) {
            let total = row.sum();
            if total > 0.0 && total.is_finite() {
                row /= total;
            } else {
                row.fill(1.0 / n_classes);
            }
        }
        Ok(proba)
    }

    /// Most probable class code per row.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.axis_iter(Axis(0)).map(|row| argmax(row.iter())).collect())
    }
}

/// Index of the largest value; ties resolve to the lowest index.
pub(crate) fn argmax<'a>(values: impl Iterator<Item = &'a f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &v) in values.enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

/// `n_features * var(x)`: the radial-basis width that makes the kernel
/// invariant to the overall scale of the features.
fn scale_heuristic(x: &Array2<f64>) -> f64 {
    if x.is_empty() {
        return 1.0;
    }
    let eps = x.ncols() as f64 * x.var(0.0);
    if eps > 0.0 && eps.is_finite() {
        eps
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn three_blobs() -> (Array2<f64>, Vec<usize>) {
        let x = array![
            [0.0, 0.0],
            [0.2, 0.1],
            [0.1, 0.3],
            [-0.2, 0.1],
            [5.0, 5.0],
            [5.2, 4.9],
            [4.8, 5.1],
            [5.1, 5.3],
            [0.0, 5.0],
            [0.2, 5.2],
            [-0.1, 4.8],
            [0.1, 5.1],
        ];
        let y = vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];
        (x, y)
    }

    #[test]
    fn test_svm_classifier_separates_blobs() {
        let (x, y) = three_blobs();
        let mut classifier = SVMClassifier::new(ModelConfig::default());
        classifier.fit(&x, &y, 3).unwrap();
        assert_eq!(classifier.n_classes(), 3);
        assert!(classifier.kernel_eps().unwrap() > 0.0);

        let predictions = classifier.predict(&x).unwrap();
        assert_eq!(predictions, y);

        let proba = classifier.predict_proba(&x).unwrap();
        for row in proba.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn linear_kernel_fits() {
        let (x, y) = three_blobs();
        let params = ModelConfig {
            kernel: Kernel::Linear,
            ..ModelConfig::default()
        };
        let mut classifier = SVMClassifier::new(params);
        classifier.fit(&x, &y, 3).unwrap();
        assert_eq!(classifier.predict(&array![[5.0, 5.1]]).unwrap(), vec![1]);
    }

    #[test]
    fn fit_rejects_single_class() {
        let mut classifier = SVMClassifier::new(ModelConfig::default());
        let err = classifier.fit(&array![[0.0], [1.0]], &[0, 0], 1).unwrap_err();
        assert!(matches!(err, PetalError::TooFewClasses(1)));
    }

    #[test]
    fn fit_rejects_class_without_samples() {
        let mut classifier = SVMClassifier::new(ModelConfig::default());
        let err = classifier
            .fit(&array![[0.0], [1.0], [2.0]], &[0, 0, 1], 3)
            .unwrap_err();
        assert!(matches!(err, PetalError::InsufficientSamples(_)));
    }

    #[test]
    fn predict_requires_fit_and_matching_width() {
        let (x, y) = three_blobs();
        let mut classifier = SVMClassifier::new(ModelConfig::default());
        assert!(matches!(classifier.predict(&x), Err(PetalError::NotFitted)));
        classifier.fit(&x, &y, 3).unwrap();
        assert!(matches!(
            classifier.predict(&array![[1.0, 2.0, 3.0]]),
            Err(PetalError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax([0.2, 0.5, 0.5].iter()), 1);
        assert_eq!(argmax([0.0].iter()), 0);
    }

    #[test]
    fn gaussian_width_scales_with_feature_count() {
        // var = 1.25 over all entries, 2 columns
        let x = array![[0.0, 1.0], [2.0, 3.0]];
        assert!((scale_heuristic(&x) - 2.5).abs() < 1e-12);
        assert_eq!(scale_heuristic(&Array2::zeros((3, 2))), 1.0);
        assert_eq!(scale_heuristic(&Array2::zeros((0, 2))), 1.0);
    }
}
