use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::matching::scoring::MatchResult;

/// Audit row tying one scoring computation to its (resume, job) pair.
/// Append-only: written once per successful computation, never updated or
/// deleted by the engine. Retention is an external concern.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub job_id: Uuid,
    pub match_score: f64,
    pub confidence: f64,
    pub method: String,
    pub analysis: Value,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn from_result(resume_id: Uuid, job_id: Uuid, result: &MatchResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            resume_id,
            job_id,
            match_score: result.match_score,
            confidence: result.confidence,
            method: result.method.as_str().to_string(),
            analysis: serde_json::to_value(&result.analysis).unwrap_or(Value::Null),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scoring::{MatchAnalysis, MatchMethod};

    #[test]
    fn test_record_snapshots_the_result() {
        let result = MatchResult {
            success: true,
            match_score: 81.25,
            confidence: 0.85,
            method: MatchMethod::MlModel,
            analysis: MatchAnalysis {
                matching_skills: vec!["rust".to_string()],
                missing_skills: vec!["kafka".to_string()],
                experience_analysis: "meets".to_string(),
                location_analysis: "local".to_string(),
                recommendations: vec![],
            },
            processing_time: 0.002,
            timestamp: 1_700_000_000.0,
            cached: false,
            error: None,
        };

        let resume_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();
        let record = AnalysisRecord::from_result(resume_id, job_id, &result);

        assert_eq!(record.resume_id, resume_id);
        assert_eq!(record.job_id, job_id);
        assert_eq!(record.match_score, 81.25);
        assert_eq!(record.method, "ml_model");
        assert_eq!(record.analysis["matching_skills"][0], "rust");
    }
}
