//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::catalog::{DefinitionView, ReadStatus};
use crate::domain::{AttemptStatus, Challenge, ChallengeAttempt, Difficulty, Identity, Session};

/// Summary card for the challenge list (no solution).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeSummaryOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub language: String,
    pub topic: String,
}

/// Full challenge page. The solution is included; the frontend hides it until asked.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDetailOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub language: String,
    pub topic: String,
    pub starter_code: String,
    pub solution: String,
    pub test_cases: serde_json::Value,
}

pub fn to_summary(c: &Challenge) -> ChallengeSummaryOut {
    ChallengeSummaryOut {
        id: c.id.clone(),
        title: c.title.clone(),
        description: c.description.clone(),
        difficulty: c.difficulty,
        language: c.language.clone(),
        topic: c.topic.clone(),
    }
}

pub fn to_detail(c: Challenge) -> ChallengeDetailOut {
    ChallengeDetailOut {
        id: c.id,
        title: c.title,
        description: c.description,
        difficulty: c.difficulty,
        language: c.language,
        topic: c.topic,
        starter_code: c.starter_code,
        solution: c.solution,
        test_cases: c.test_cases,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChallengeQuery {
    pub language: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOut {
    pub id: String,
    pub code: String,
    pub status: AttemptStatus,
    pub created_at: Option<String>,
}

pub fn to_attempt_out(a: ChallengeAttempt) -> AttemptOut {
    AttemptOut {
        id: a.id,
        code: a.code,
        status: a.status,
        created_at: a.created_at.map(|t| t.to_rfc3339()),
    }
}

//
// Submission endpoints
//

#[derive(Debug, Deserialize)]
pub struct RunCodeIn {
    pub code: String,
    /// Absent id resolves to no challenge (404), not a body error.
    #[serde(rename = "challengeId", default)]
    pub challenge_id: String,
}

#[derive(Debug, Serialize)]
pub struct RunCodeOut {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ExecuteErrorOut {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
}

//
// Definitions
//

#[derive(Debug, Default, Deserialize)]
pub struct DefinitionQuery {
    pub language: Option<String>,
    #[serde(default)]
    pub status: ReadStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionSummaryOut {
    pub id: String,
    pub title: String,
    pub language: String,
    pub difficulty: Option<String>,
    pub is_read: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionDetailOut {
    pub id: String,
    pub title: String,
    pub language: String,
    pub difficulty: Option<String>,
    pub definition_content: String,
    pub comparison: Option<String>,
    pub code_example: Option<String>,
    pub is_read: bool,
}

pub fn to_definition_summary(v: DefinitionView) -> DefinitionSummaryOut {
    let d = v.definition;
    DefinitionSummaryOut { id: d.id, title: d.title, language: d.language, difficulty: d.difficulty, is_read: v.is_read }
}

pub fn to_definition_detail(v: DefinitionView) -> DefinitionDetailOut {
    let d = v.definition;
    DefinitionDetailOut {
        id: d.id,
        title: d.title,
        language: d.language,
        difficulty: d.difficulty,
        definition_content: d.definition_content,
        comparison: d.comparison,
        code_example: d.code_example,
        is_read: v.is_read,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadStateOut {
    pub is_read: bool,
}

//
// Auth
//

#[derive(Deserialize)]
pub struct CredentialsIn {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOut {
    pub user_id: String,
    pub email: String,
}

impl From<Identity> for UserOut {
    fn from(i: Identity) -> Self {
        Self { user_id: i.user_id, email: i.email }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub access_token: String,
    pub user: UserOut,
}

impl From<Session> for SessionOut {
    fn from(s: Session) -> Self {
        Self { access_token: s.access_token, user: s.identity.into() }
    }
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
