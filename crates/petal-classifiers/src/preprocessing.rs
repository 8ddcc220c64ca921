//! Label encoding and feature standardization.
//!
//! Both transforms are fitted once at training time, persisted next to the
//! model and re-applied unchanged at inference time.

use std::collections::BTreeSet;

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PetalError, Result};

/// Bijection between class labels and contiguous codes `0..n_classes`.
/// Codes follow the sorted order of the labels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let classes: BTreeSet<&str> = labels.iter().map(|l| l.as_ref()).collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| PetalError::UnknownLabel(label.to_string()))
    }

    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    pub fn decode(&self, code: usize) -> Result<&str> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(PetalError::UnknownClassCode(code))
    }

    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<String>> {
        codes
            .iter()
            .map(|&c| self.decode(c).map(str::to_string))
            .collect()
    }
}

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Columns whose standard deviation falls below this are centred but
    /// left unscaled.
    const MIN_STD: f64 = 1e-12;

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}

/// Fit a `Scaler` from an `Array2<f64>` where rows are samples and
/// columns are features.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler> {
    let (nrows, ncols) = x.dim();
    if nrows == 0 || ncols == 0 {
        return Err(PetalError::InvalidConfig(format!(
            "fit_scaler requires a non-empty matrix, got {}x{}",
            nrows, ncols
        )));
    }

    let mean = x.mean_axis(Axis(0)).ok_or(PetalError::NotFitted)?;
    let std = x
        .std_axis(Axis(0), 0.0)
        .mapv(|s| if s < Scaler::MIN_STD { 1.0 } else { s });

    Ok(Scaler {
        mean: mean.to_vec(),
        std: std.to_vec(),
    })
}

/// Transform all rows using the provided `Scaler` and return a new `Array2<f64>`.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>> {
    if x.ncols() != sc.n_features() {
        return Err(PetalError::ShapeMismatch {
            what: "scaler input width",
            expected: sc.n_features(),
            found: x.ncols(),
        });
    }
    let mut out = x.to_owned();
    out -= &ArrayView1::from(&sc.mean[..]);
    out /= &ArrayView1::from(&sc.std[..]);
    Ok(out)
}

/// Convenience: fit a scaler and return it with the transformed matrix.
pub fn fit_transform(x: &Array2<f64>) -> Result<(Scaler, Array2<f64>)> {
    let sc = fit_scaler(x)?;
    let out = transform_all(x, &sc)?;
    Ok((sc, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn encoder_sorts_and_dedups() {
        let enc = LabelEncoder::fit(&["tulip", "daisy", "tulip", "rose"]);
        assert_eq!(enc.classes(), &["daisy", "rose", "tulip"]);
        assert_eq!(enc.encode("rose").unwrap(), 1);
        assert!(matches!(enc.encode("lily"), Err(PetalError::UnknownLabel(_))));
        assert!(matches!(enc.decode(3), Err(PetalError::UnknownClassCode(3))));
    }

    #[test]
    fn encoder_round_trips_every_fitted_label() {
        let labels = ["tulip", "Rosé", "daisy", "tulip", "向日葵", "daisy", "class_010"];
        let enc = LabelEncoder::fit(&labels);
        assert_eq!(enc.n_classes(), 5);

        let codes = enc.transform(&labels).unwrap();
        assert!(codes.iter().all(|&c| c < enc.n_classes()));
        assert_eq!(codes[0], codes[3]);
        assert_eq!(enc.inverse_transform(&codes).unwrap(), labels);

        for class in enc.classes() {
            assert_eq!(enc.decode(enc.encode(class).unwrap()).unwrap(), class);
        }
    }

    #[test]
    fn constant_column_is_centred_not_scaled() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let (sc, t) = fit_transform(&x).unwrap();
        assert_eq!(sc.std[1], 1.0);
        assert_eq!(t[[0, 1]], 0.0);
        assert!((t[[0, 0]] + 1.0).abs() < 1e-12);
        assert!((t[[1, 0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn transform_rejects_wrong_width() {
        let sc = fit_scaler(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            transform_all(&array![[1.0, 2.0, 3.0]], &sc),
            Err(PetalError::ShapeMismatch { expected: 2, found: 3, .. })
        ));
    }
}
