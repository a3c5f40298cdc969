//! Bootstrap training from synthetic labels.
//!
//! This path exists only so a fresh deployment with no historical outcome
//! data can stand up the model scoring path. The labels are synthesized, not
//! observed; every bootstrap logs a prominent warning and a production
//! deployment should replace this with a real-outcome training pipeline.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::matching::features::{ExperienceLevel, JobFeatures, ResumeFeatures};
use crate::matching::model::{FeatureScaler, LinearRegressor, ModelArtifacts};
use crate::matching::scoring::{
    build_feature_vector, education_match, experience_match, model_location_match, skill_jaccard,
};
use crate::matching::tfidf::TfIdfVectorizer;

const SKILL_POOL: [&str; 24] = [
    "python",
    "django",
    "flask",
    "javascript",
    "typescript",
    "react",
    "vue.js",
    "node.js",
    "rust",
    "go",
    "java",
    "spring",
    "postgresql",
    "mysql",
    "redis",
    "mongodb",
    "docker",
    "kubernetes",
    "aws",
    "gcp",
    "terraform",
    "kafka",
    "graphql",
    "machine learning",
];

const LOCATION_POOL: [&str; 8] = [
    "new york",
    "san francisco",
    "austin",
    "seattle",
    "boston",
    "chicago",
    "denver",
    "atlanta",
];

const EXPERIENCE_POOL: [ExperienceLevel; 4] = [
    ExperienceLevel::Entry,
    ExperienceLevel::Mid,
    ExperienceLevel::Senior,
    ExperienceLevel::Lead,
];

/// One synthetic (job, resume, score) triple.
#[derive(Debug, Clone)]
pub struct TrainingExample {
    pub resume: ResumeFeatures,
    pub job: JobFeatures,
    pub label: f64,
}

/// Samples labeled pairs from fixed vocabularies. The label is a weighted
/// combination of the same component scores the engine computes, plus noise.
pub struct SyntheticTrainingDataGenerator;

impl SyntheticTrainingDataGenerator {
    pub fn generate(&self, n: usize) -> Vec<TrainingExample> {
        let mut rng = rand::thread_rng();
        (0..n).map(|_| self.sample(&mut rng)).collect()
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> TrainingExample {
        let resume = sample_resume(rng);
        let job = sample_job(rng);

        // Fixed ground-truth formula; the text component is a random proxy
        // since synthetic texts carry no real lexical signal.
        let text_proxy: f64 = rng.gen_range(0.0..1.0);
        let raw = 0.4 * skill_jaccard(&resume, &job)
            + 0.25 * experience_match(&resume, &job)
            + 0.1 * model_location_match(&resume, &job)
            + 0.15 * education_match(&resume, &job)
            + 0.1 * text_proxy;
        let noise: f64 = rng.gen_range(-0.1..0.1);
        let label = (raw + noise).clamp(0.0, 1.0);

        TrainingExample { resume, job, label }
    }
}

fn sample_skills<R: Rng>(rng: &mut R, min: usize, max: usize) -> BTreeSet<String> {
    let count = rng.gen_range(min..=max);
    SKILL_POOL
        .choose_multiple(rng, count)
        .map(|s| s.to_string())
        .collect()
}

fn sample_resume<R: Rng>(rng: &mut R) -> ResumeFeatures {
    let skills = sample_skills(rng, 3, 8);
    let total_experience_years = rng.gen_range(0..=15);
    let declared = EXPERIENCE_POOL
        .choose(rng)
        .copied()
        .unwrap_or(ExperienceLevel::Mid);
    let experience_level = declared.max(ExperienceLevel::from_years(total_experience_years));
    let location = LOCATION_POOL.choose(rng).copied().unwrap_or("remote").to_string();
    let raw_text = format!(
        "{} professional with experience in {}",
        experience_level.label(),
        skills.iter().cloned().collect::<Vec<_>>().join(" ")
    );

    ResumeFeatures {
        skills,
        experience_level,
        total_experience_years,
        education_level: rng.gen_range(1..=5),
        location,
        raw_text,
    }
}

fn sample_job<R: Rng>(rng: &mut R) -> JobFeatures {
    let skills_required = sample_skills(rng, 2, 6);
    let experience_level = EXPERIENCE_POOL
        .choose(rng)
        .copied()
        .unwrap_or(ExperienceLevel::Mid);
    let location = LOCATION_POOL.choose(rng).copied().unwrap_or("remote").to_string();
    let remote_allowed = rng.gen_bool(0.3);
    let salary_min = rng.gen_range(60_000..120_000);
    let raw_text = format!(
        "{} engineer role requiring {}",
        experience_level.label(),
        skills_required.iter().cloned().collect::<Vec<_>>().join(" ")
    );

    JobFeatures {
        skills_required,
        experience_level,
        total_experience_years: 0,
        education_level: rng.gen_range(1..=5),
        location,
        remote_allowed,
        salary_min: Some(salary_min),
        salary_max: Some(salary_min + rng.gen_range(10_000..60_000)),
        raw_text,
    }
}

const BOOTSTRAP_EXAMPLES: usize = 500;
const TRAINING_EPOCHS: usize = 1500;
const LEARNING_RATE: f64 = 0.1;

/// Generates a synthetic corpus, fits the vectorizer and scaler, trains the
/// regressor, and persists all three artifacts to `model_dir`.
///
/// The artifact write is not guarded against concurrent initialization from
/// multiple processes; last writer wins.
pub fn bootstrap(model_dir: &Path) -> Result<ModelArtifacts> {
    warn!(
        "No trained model artifacts in {}; bootstrapping from SYNTHETIC labels. \
         Replace with real outcome data before trusting model scores.",
        model_dir.display()
    );

    let generator = SyntheticTrainingDataGenerator;
    let examples = generator.generate(BOOTSTRAP_EXAMPLES);

    let mut corpus = Vec::with_capacity(examples.len() * 2);
    for example in &examples {
        corpus.push(example.resume.raw_text.clone());
        corpus.push(example.job.raw_text.clone());
    }
    let vectorizer = TfIdfVectorizer::fit(&corpus);

    let features: Vec<Vec<f64>> = examples
        .iter()
        .map(|e| build_feature_vector(&e.resume, &e.job, Some(&vectorizer)))
        .collect();
    let labels: Vec<f64> = examples.iter().map(|e| e.label).collect();

    let scaler = FeatureScaler::fit(&features);
    let scaled: Vec<Vec<f64>> = features.iter().map(|x| scaler.transform(x)).collect();
    let regressor = LinearRegressor::fit(&scaled, &labels, TRAINING_EPOCHS, LEARNING_RATE);

    let artifacts = ModelArtifacts {
        regressor,
        scaler,
        vectorizer,
    };
    artifacts.save(model_dir)?;
    info!(
        "Bootstrap training complete: {} examples, {} epochs",
        examples.len(),
        TRAINING_EPOCHS
    );
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_returns_requested_count() {
        let examples = SyntheticTrainingDataGenerator.generate(50);
        assert_eq!(examples.len(), 50);
    }

    #[test]
    fn test_labels_are_clamped_to_unit_interval() {
        for example in SyntheticTrainingDataGenerator.generate(200) {
            assert!(
                (0.0..=1.0).contains(&example.label),
                "label out of range: {}",
                example.label
            );
        }
    }

    #[test]
    fn test_sampled_features_are_well_formed() {
        for example in SyntheticTrainingDataGenerator.generate(50) {
            assert!(!example.resume.skills.is_empty());
            assert!(!example.job.skills_required.is_empty());
            assert!((1..=5).contains(&example.resume.education_level));
            assert!((1..=5).contains(&example.job.education_level));
            assert!(!example.resume.location.is_empty());
            assert!(example.job.salary_min.unwrap() < example.job.salary_max.unwrap());
        }
    }

    #[test]
    fn test_bootstrap_writes_artifacts_and_scores_sanely() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = bootstrap(dir.path()).unwrap();
        assert!(ModelArtifacts::exists(dir.path()));

        // A trained regressor should produce finite, roughly-unit-interval
        // predictions for in-distribution inputs.
        let example = &SyntheticTrainingDataGenerator.generate(1)[0];
        let features =
            build_feature_vector(&example.resume, &example.job, Some(&artifacts.vectorizer));
        let prediction = artifacts.regressor.predict(&artifacts.scaler.transform(&features));
        assert!(prediction.is_finite());
        assert!((-0.5..=1.5).contains(&prediction), "prediction {prediction}");
    }

    #[test]
    fn test_bootstrap_artifacts_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let trained = bootstrap(dir.path()).unwrap();
        let reloaded = ModelArtifacts::load(dir.path()).unwrap();
        assert_eq!(trained.regressor.weights, reloaded.regressor.weights);
        assert_eq!(trained.scaler.means, reloaded.scaler.means);
    }
}
