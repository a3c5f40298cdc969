//! Feature extraction. Normalizes raw resume/job payloads into canonical,
//! fully-defaulted feature structs so the scorer never sees a missing field.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Skills arrive from collaborators either as a comma-separated string or as
/// a list. The shape is resolved exactly once here; everything downstream
/// works on a normalized set.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    Csv(String),
    List(Vec<String>),
}

impl SkillsInput {
    /// Reads a skills field off a JSON payload. Mis-typed or absent fields
    /// become the empty list, never an error.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => SkillsInput::Csv(s.clone()),
            Some(Value::Array(items)) => SkillsInput::List(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => SkillsInput::List(Vec::new()),
        }
    }

    /// Lowercases, trims, and deduplicates into a sorted set.
    pub fn normalize(self) -> BTreeSet<String> {
        let items: Vec<String> = match self {
            SkillsInput::Csv(s) => s.split(',').map(str::to_string).collect(),
            SkillsInput::List(items) => items,
        };
        items
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Seniority band, ordinal 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Lead,
}

impl ExperienceLevel {
    pub fn ordinal(self) -> u8 {
        match self {
            ExperienceLevel::Entry => 1,
            ExperienceLevel::Mid => 2,
            ExperienceLevel::Senior => 3,
            ExperienceLevel::Lead => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
        }
    }

    /// Case-insensitive parse of a declared level. Unknown strings read as Mid.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "entry" | "junior" => ExperienceLevel::Entry,
            "mid" | "middle" | "intermediate" => ExperienceLevel::Mid,
            "senior" => ExperienceLevel::Senior,
            "lead" | "principal" | "staff" => ExperienceLevel::Lead,
            _ => ExperienceLevel::Mid,
        }
    }

    /// Band derived from total years of experience.
    pub fn from_years(years: u32) -> Self {
        match years {
            0..=2 => ExperienceLevel::Entry,
            3..=5 => ExperienceLevel::Mid,
            6..=10 => ExperienceLevel::Senior,
            _ => ExperienceLevel::Lead,
        }
    }
}

/// Maps a free-text education string onto a fixed ordinal lexicon.
/// Absent or unrecognized input reads as bachelor-equivalent (3).
pub fn education_ordinal(text: Option<&str>) -> u8 {
    let text = match text {
        Some(t) => t.to_lowercase(),
        None => return 3,
    };
    if text.contains("phd") || text.contains("doctor") {
        5
    } else if text.contains("master") {
        4
    } else if text.contains("bachelor") {
        3
    } else if text.contains("associate") {
        2
    } else if text.contains("high school") {
        1
    } else {
        3
    }
}

/// Canonical resume-side features. Derived, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeFeatures {
    pub skills: BTreeSet<String>,
    pub experience_level: ExperienceLevel,
    pub total_experience_years: u32,
    pub education_level: u8,
    pub location: String,
    pub raw_text: String,
}

/// Canonical job-side features.
#[derive(Debug, Clone, Serialize)]
pub struct JobFeatures {
    pub skills_required: BTreeSet<String>,
    pub experience_level: ExperienceLevel,
    pub total_experience_years: u32,
    pub education_level: u8,
    pub location: String,
    pub remote_allowed: bool,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub raw_text: String,
}

/// Buckets an external resume parser may have populated. Unioned with the
/// top-level skills field.
const RESUME_SKILL_BUCKETS: [&str; 4] = [
    "technical_skills",
    "programming_languages",
    "frameworks",
    "tools",
];

/// Extracts resume features from a parsed-resume payload. Pure and total:
/// every field has a default, malformed types fall back to it.
pub fn extract_resume(payload: &Value) -> ResumeFeatures {
    let mut skills = SkillsInput::from_value(payload.get("skills")).normalize();
    for bucket in RESUME_SKILL_BUCKETS {
        skills.extend(SkillsInput::from_value(payload.get(bucket)).normalize());
    }

    let total_experience_years = read_years(payload.get("total_experience_years"));
    let declared = payload
        .get("experience_level")
        .and_then(Value::as_str)
        .map(ExperienceLevel::parse)
        .unwrap_or(ExperienceLevel::Mid);
    // Effective level is the max of declared and years-derived.
    let experience_level = declared.max(ExperienceLevel::from_years(total_experience_years));

    let education_level = education_ordinal(payload.get("education").and_then(Value::as_str));
    let location = read_location(payload.get("location"));

    let body = payload
        .get("parsed_text")
        .or_else(|| payload.get("raw_text"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let raw_text = join_text(body, &skills);

    ResumeFeatures {
        skills,
        experience_level,
        total_experience_years,
        education_level,
        location,
        raw_text,
    }
}

/// Extracts job features from a job-posting payload. Same totality contract
/// as `extract_resume`.
pub fn extract_job(payload: &Value) -> JobFeatures {
    let skills_required = SkillsInput::from_value(payload.get("skills_required")).normalize();

    let total_experience_years = read_years(payload.get("total_experience_years"));
    let declared = payload
        .get("experience_level")
        .and_then(Value::as_str)
        .map(ExperienceLevel::parse)
        .unwrap_or(ExperienceLevel::Mid);
    let experience_level = declared.max(ExperienceLevel::from_years(total_experience_years));

    let education_level = education_ordinal(payload.get("education").and_then(Value::as_str));
    let location = read_location(payload.get("location"));
    let remote_allowed = payload
        .get("remote_allowed")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let salary_min = payload.get("salary_min").and_then(Value::as_i64);
    let salary_max = payload.get("salary_max").and_then(Value::as_i64);

    let mut body = String::new();
    for field in ["title", "description", "requirements"] {
        if let Some(text) = payload.get(field).and_then(Value::as_str) {
            body.push_str(text);
            body.push(' ');
        }
    }
    let raw_text = join_text(body.trim_end(), &skills_required);

    JobFeatures {
        skills_required,
        experience_level,
        total_experience_years,
        education_level,
        location,
        remote_allowed,
        salary_min,
        salary_max,
        raw_text,
    }
}

fn read_years(value: Option<&Value>) -> u32 {
    match value {
        Some(v) => v
            .as_u64()
            .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0) as u32,
        None => 0,
    }
}

fn read_location(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default()
}

fn join_text(body: &str, skills: &BTreeSet<String>) -> String {
    let skills_text = skills.iter().cloned().collect::<Vec<_>>().join(" ");
    if body.is_empty() {
        skills_text
    } else if skills_text.is_empty() {
        body.to_string()
    } else {
        format!("{body} {skills_text}")
    }
}
