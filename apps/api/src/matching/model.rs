//! Trained model artifacts: a small linear regressor over the six pair
//! features, the standardization scaler fitted alongside it, and the TF-IDF
//! vectorizer. All three persist as JSON at fixed paths and are loaded once
//! at startup, read-only for the life of the process.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::matching::tfidf::TfIdfVectorizer;

pub const REGRESSOR_FILE: &str = "regressor.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const VECTORIZER_FILE: &str = "vectorizer.json";

/// Linear model over the scaled feature vector. Six weights and a bias;
/// trained by batch gradient descent on the bootstrap set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearRegressor {
    /// Batch gradient descent on mean squared error.
    pub fn fit(features: &[Vec<f64>], labels: &[f64], epochs: usize, learning_rate: f64) -> Self {
        let dims = features.first().map(Vec::len).unwrap_or(0);
        let mut weights = vec![0.0; dims];
        let mut bias = 0.0;
        let n = features.len().max(1) as f64;

        for _ in 0..epochs {
            let mut grad_w = vec![0.0; dims];
            let mut grad_b = 0.0;
            for (x, &y) in features.iter().zip(labels) {
                let error = dot(&weights, x) + bias - y;
                for (g, xi) in grad_w.iter_mut().zip(x) {
                    *g += error * xi;
                }
                grad_b += error;
            }
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= learning_rate * g / n;
            }
            bias -= learning_rate * grad_b / n;
        }

        Self { weights, bias }
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        dot(&self.weights, features) + self.bias
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Per-dimension standardization. Zero-variance dimensions are centered but
/// not divided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl FeatureScaler {
    pub fn fit(features: &[Vec<f64>]) -> Self {
        let dims = features.first().map(Vec::len).unwrap_or(0);
        let n = features.len().max(1) as f64;

        let mut means = vec![0.0; dims];
        for x in features {
            for (m, xi) in means.iter_mut().zip(x) {
                *m += xi;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut stds = vec![0.0; dims];
        for x in features {
            for ((s, xi), m) in stds.iter_mut().zip(x).zip(&means) {
                *s += (xi - m) * (xi - m);
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
        }

        Self { means, stds }
    }

    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(x, (m, s))| if *s > 0.0 { (x - m) / s } else { x - m })
            .collect()
    }
}

/// The persisted trio backing the model scoring path. Absence on disk is not
/// an error at this layer; the caller decides whether to bootstrap or fall
/// back to rule-based scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifacts {
    pub regressor: LinearRegressor,
    pub scaler: FeatureScaler,
    pub vectorizer: TfIdfVectorizer,
}

impl ModelArtifacts {
    pub fn load(dir: &Path) -> Result<Self> {
        let regressor = read_json(&dir.join(REGRESSOR_FILE))?;
        let scaler = read_json(&dir.join(SCALER_FILE))?;
        let vectorizer = read_json(&dir.join(VECTORIZER_FILE))?;
        info!("Loaded model artifacts from {}", dir.display());
        Ok(Self {
            regressor,
            scaler,
            vectorizer,
        })
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create model directory {}", dir.display()))?;
        write_json(&dir.join(REGRESSOR_FILE), &self.regressor)?;
        write_json(&dir.join(SCALER_FILE), &self.scaler)?;
        write_json(&dir.join(VECTORIZER_FILE), &self.vectorizer)?;
        info!("Saved model artifacts to {}", dir.display());
        Ok(())
    }

    pub fn exists(dir: &Path) -> bool {
        dir.join(REGRESSOR_FILE).exists()
            && dir.join(SCALER_FILE).exists()
            && dir.join(VECTORIZER_FILE).exists()
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read artifact {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse artifact {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    fs::write(path, raw).with_context(|| format!("Failed to write artifact {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regressor_learns_linear_relationship() {
        // y = 0.5 * x0 + 0.25, exactly representable.
        let features: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 / 20.0]).collect();
        let labels: Vec<f64> = features.iter().map(|x| 0.5 * x[0] + 0.25).collect();

        let model = LinearRegressor::fit(&features, &labels, 2000, 0.5);
        for (x, &y) in features.iter().zip(&labels) {
            assert!((model.predict(x) - y).abs() < 0.01);
        }
    }

    #[test]
    fn test_regressor_empty_training_set_predicts_zero() {
        let model = LinearRegressor::fit(&[], &[], 100, 0.1);
        assert_eq!(model.predict(&[]), 0.0);
    }

    #[test]
    fn test_scaler_standardizes_to_zero_mean() {
        let features = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]];
        let scaler = FeatureScaler::fit(&features);

        let transformed: Vec<Vec<f64>> =
            features.iter().map(|x| scaler.transform(x)).collect();
        for dim in 0..2 {
            let mean: f64 =
                transformed.iter().map(|x| x[dim]).sum::<f64>() / transformed.len() as f64;
            assert!(mean.abs() < 1e-9, "mean of dim {dim} was {mean}");
        }
    }

    #[test]
    fn test_scaler_zero_variance_dimension_only_centers() {
        let features = vec![vec![0.5], vec![0.5], vec![0.5]];
        let scaler = FeatureScaler::fit(&features);
        let out = scaler.transform(&[0.5]);
        assert_eq!(out, vec![0.0]);
    }

    #[test]
    fn test_artifacts_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ModelArtifacts {
            regressor: LinearRegressor {
                weights: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
                bias: 0.05,
            },
            scaler: FeatureScaler {
                means: vec![0.5; 6],
                stds: vec![0.2; 6],
            },
            vectorizer: crate::matching::tfidf::TfIdfVectorizer::fit(&[
                "rust engineer".to_string(),
                "python developer".to_string(),
            ]),
        };

        artifacts.save(dir.path()).unwrap();
        assert!(ModelArtifacts::exists(dir.path()));

        let restored = ModelArtifacts::load(dir.path()).unwrap();
        assert_eq!(restored.regressor.weights, artifacts.regressor.weights);
        assert_eq!(restored.regressor.bias, artifacts.regressor.bias);
        assert_eq!(restored.scaler.means, artifacts.scaler.means);
        let x = vec![0.3, 0.8, 0.5, 1.0, 0.3, 0.75];
        assert_eq!(
            artifacts.regressor.predict(&artifacts.scaler.transform(&x)),
            restored.regressor.predict(&restored.scaler.transform(&x))
        );
    }

    #[test]
    fn test_load_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!ModelArtifacts::exists(dir.path()));
        assert!(ModelArtifacts::load(&dir.path().join("absent")).is_err());
    }
}
