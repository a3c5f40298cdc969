//! Match scoring. Two interchangeable strategies behind one entry point:
//! the trained linear model when artifacts are available, and a weighted
//! rule-based fallback when they are not (or when forced by config).
//!
//! Both strategies emit the same `MatchResult` contract; they differ only in
//! `method`, `confidence`, and the numeric score. Failures never escape
//! `score`; they surface as `success: false` in the typed result.

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::matching::features::{JobFeatures, ResumeFeatures};
use crate::matching::model::ModelArtifacts;
use crate::matching::tfidf::{cosine_similarity, token_set_similarity, TfIdfVectorizer};

/// The model path consumes exactly this many feature dimensions.
pub const FEATURE_DIMS: usize = 6;

/// Neutral filler for feature dimensions that could not be computed.
const NEUTRAL_FEATURE: f64 = 0.5;

/// Fixed confidence constants per scoring method. Not statistically derived.
const MODEL_CONFIDENCE: f64 = 0.85;
const RULE_CONFIDENCE: f64 = 0.75;

/// Rule-based combination weights. Sum to 1.0.
const RULE_WEIGHT_SKILLS: f64 = 0.4;
const RULE_WEIGHT_EXPERIENCE: f64 = 0.25;
const RULE_WEIGHT_EDUCATION: f64 = 0.15;
const RULE_WEIGHT_LOCATION: f64 = 0.1;
const RULE_WEIGHT_TEXT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    MlModel,
    RuleBased,
}

impl MatchMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMethod::MlModel => "ml_model",
            MatchMethod::RuleBased => "rule_based",
        }
    }
}

/// Explainable breakdown attached to every result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub experience_analysis: String,
    pub location_analysis: String,
    pub recommendations: Vec<String>,
}

/// The engine's output contract, also the persisted analysis payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub success: bool,
    pub match_score: f64,
    pub confidence: f64,
    pub method: MatchMethod,
    pub analysis: MatchAnalysis,
    pub processing_time: f64,
    pub timestamp: f64,
    #[serde(default)]
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The scoring model. Constructed once at startup with whatever artifacts
/// were loaded or bootstrapped; owned immutably thereafter.
pub struct ScoringEngine {
    artifacts: Option<ModelArtifacts>,
    force_rule_based: bool,
}

impl ScoringEngine {
    pub fn new(artifacts: Option<ModelArtifacts>, force_rule_based: bool) -> Self {
        Self {
            artifacts,
            force_rule_based,
        }
    }

    /// The strategy the engine will use for the next score call.
    pub fn method(&self) -> MatchMethod {
        if self.force_rule_based || self.artifacts.is_none() {
            MatchMethod::RuleBased
        } else {
            MatchMethod::MlModel
        }
    }

    /// Scores a resume against a job. Never panics and never returns an
    /// error; any internal failure is folded into `success: false`.
    pub fn score(&self, resume: &ResumeFeatures, job: &JobFeatures) -> MatchResult {
        let started = Instant::now();
        let method = self.method();

        let scored = match method {
            MatchMethod::MlModel => self.score_with_model(resume, job),
            MatchMethod::RuleBased => Ok(self.score_rule_based(resume, job)),
        };

        let processing_time = started.elapsed().as_secs_f64();
        let timestamp = Utc::now().timestamp_millis() as f64 / 1000.0;
        let analysis = build_analysis(resume, job);

        match scored {
            Ok(match_score) => MatchResult {
                success: true,
                match_score,
                confidence: match method {
                    MatchMethod::MlModel => MODEL_CONFIDENCE,
                    MatchMethod::RuleBased => RULE_CONFIDENCE,
                },
                method,
                analysis,
                processing_time,
                timestamp,
                cached: false,
                error: None,
            },
            Err(err) => {
                warn!("Scoring failed, returning unsuccessful result: {err:#}");
                MatchResult {
                    success: false,
                    match_score: 0.0,
                    confidence: 0.0,
                    method,
                    analysis,
                    processing_time,
                    timestamp,
                    cached: false,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn score_with_model(
        &self,
        resume: &ResumeFeatures,
        job: &JobFeatures,
    ) -> anyhow::Result<f64> {
        let artifacts = self
            .artifacts
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("model artifacts unavailable"))?;

        let features = build_feature_vector(resume, job, Some(&artifacts.vectorizer));
        let scaled = artifacts.scaler.transform(&features);
        let raw = artifacts.regressor.predict(&scaled);
        if !raw.is_finite() {
            anyhow::bail!("regressor produced a non-finite prediction");
        }
        Ok(raw.clamp(0.0, 1.0) * 100.0)
    }

    fn score_rule_based(&self, resume: &ResumeFeatures, job: &JobFeatures) -> f64 {
        let skill = skill_jaccard(resume, job);
        let experience = experience_match(resume, job);
        let education = education_match(resume, job);
        let location = rule_location_match(resume, job);
        let text = token_set_similarity(&job.raw_text, &resume.raw_text);

        let combined = skill * RULE_WEIGHT_SKILLS
            + experience * RULE_WEIGHT_EXPERIENCE
            + education * RULE_WEIGHT_EDUCATION
            + location * RULE_WEIGHT_LOCATION
            + text * RULE_WEIGHT_TEXT;

        (combined * 100.0).clamp(0.0, 100.0)
    }
}

/// The fixed six-dimension vector consumed by the model path:
/// [text_similarity, skill_jaccard, skill_coverage, experience_match,
///  location_match, education_match]. Short vectors are padded with the
/// neutral value rather than failing the scorer.
pub fn build_feature_vector(
    resume: &ResumeFeatures,
    job: &JobFeatures,
    vectorizer: Option<&TfIdfVectorizer>,
) -> Vec<f64> {
    let text_similarity = match vectorizer {
        Some(v) if v.is_fitted() => cosine_similarity(
            &v.transform(&job.raw_text),
            &v.transform(&resume.raw_text),
        ),
        _ => token_set_similarity(&job.raw_text, &resume.raw_text),
    };

    let mut features = vec![
        text_similarity,
        skill_jaccard(resume, job),
        skill_coverage(resume, job),
        experience_match(resume, job),
        model_location_match(resume, job),
        education_match(resume, job),
    ];

    if features.len() < FEATURE_DIMS {
        warn!(
            "Feature vector has {} of {} dimensions, padding with neutral values",
            features.len(),
            FEATURE_DIMS
        );
        features.resize(FEATURE_DIMS, NEUTRAL_FEATURE);
    }
    features
}

/// |resume ∩ job| / |resume ∪ job|. Both sets empty reads as unknown, not
/// as zero overlap.
pub fn skill_jaccard(resume: &ResumeFeatures, job: &JobFeatures) -> f64 {
    if resume.skills.is_empty() && job.skills_required.is_empty() {
        return NEUTRAL_FEATURE;
    }
    let intersection = resume.skills.intersection(&job.skills_required).count() as f64;
    let union = resume.skills.union(&job.skills_required).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Share of the job's required skills the resume covers.
pub fn skill_coverage(resume: &ResumeFeatures, job: &JobFeatures) -> f64 {
    if job.skills_required.is_empty() {
        if resume.skills.is_empty() {
            return NEUTRAL_FEATURE;
        }
        return 0.0;
    }
    let intersection = resume.skills.intersection(&job.skills_required).count() as f64;
    intersection / job.skills_required.len() as f64
}

/// 1 minus the ordinal distance over the maximum possible distance of 3.
pub fn experience_match(resume: &ResumeFeatures, job: &JobFeatures) -> f64 {
    let distance =
        (job.experience_level.ordinal() as f64 - resume.experience_level.ordinal() as f64).abs();
    (1.0 - distance / 3.0).max(0.0)
}

/// Meets-or-exceeds reads as full credit, otherwise proportional.
pub fn education_match(resume: &ResumeFeatures, job: &JobFeatures) -> f64 {
    if resume.education_level >= job.education_level {
        1.0
    } else {
        resume.education_level as f64 / job.education_level as f64
    }
}

/// Model-path location feature: remote or identical string, else the flat
/// different-location score. No partial credit on this path.
pub fn model_location_match(resume: &ResumeFeatures, job: &JobFeatures) -> f64 {
    if job.remote_allowed || resume.location == job.location {
        1.0
    } else {
        0.3
    }
}

/// Rule-path location component. Unlike the model path this grants partial
/// credit when the two location strings share a token (city vs city-state
/// spellings). The divergence between the two paths is longstanding and is
/// preserved as-is; see DESIGN.md.
pub fn rule_location_match(resume: &ResumeFeatures, job: &JobFeatures) -> f64 {
    if job.remote_allowed || resume.location == job.location {
        return 1.0;
    }
    let resume_tokens: Vec<&str> = resume.location.split_whitespace().collect();
    let job_tokens: Vec<&str> = job.location.split_whitespace().collect();
    let overlaps = !resume.location.is_empty()
        && !job.location.is_empty()
        && (resume.location.contains(&job.location)
            || job.location.contains(&resume.location)
            || resume_tokens.iter().any(|t| job_tokens.contains(t)));
    if overlaps {
        0.6
    } else {
        0.3
    }
}

/// Builds the explainable analysis block shared by both scoring paths.
pub fn build_analysis(resume: &ResumeFeatures, job: &JobFeatures) -> MatchAnalysis {
    let matching_skills: Vec<String> = resume
        .skills
        .intersection(&job.skills_required)
        .cloned()
        .collect();
    let missing_skills: Vec<String> = job
        .skills_required
        .difference(&resume.skills)
        .cloned()
        .collect();

    let experience_analysis = if resume.experience_level >= job.experience_level {
        format!(
            "Candidate seniority ({}) meets the {} requirement.",
            resume.experience_level.label(),
            job.experience_level.label()
        )
    } else {
        format!(
            "Candidate seniority ({}) is below the {} requirement.",
            resume.experience_level.label(),
            job.experience_level.label()
        )
    };

    let location_analysis = if job.remote_allowed {
        "Remote role, candidate location is not a constraint.".to_string()
    } else if resume.location == job.location {
        if resume.location.is_empty() {
            "No location information on either side.".to_string()
        } else {
            format!("Candidate is local to {}.", resume.location)
        }
    } else {
        format!(
            "Candidate location '{}' differs from job location '{}'.",
            resume.location, job.location
        )
    };

    let mut recommendations = Vec::new();
    if !missing_skills.is_empty() {
        let top: Vec<&str> = missing_skills.iter().take(3).map(String::as_str).collect();
        recommendations.push(format!("Consider developing: {}.", top.join(", ")));
    }
    if !matching_skills.is_empty() {
        let top: Vec<&str> = matching_skills.iter().take(3).map(String::as_str).collect();
        recommendations.push(format!("Strong existing alignment on {}.", top.join(", ")));
    }

    MatchAnalysis {
        matching_skills,
        missing_skills,
        experience_analysis,
        location_analysis,
        recommendations,
    }
}
