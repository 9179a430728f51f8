use anyhow::{bail, Context};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{NewProject, NewSurveyResponse, Pagination, SurveyProject, SurveyResponse};
use crate::nps::NpsCategory;
use crate::projects;
use crate::validation;

const RESPONSE_COLUMNS: &str = "id, project_id, respondent_name, respondent_organization, \
     is_anonymous, value_objectives_delivered, value_organisation_created, \
     capability_skills_built, capability_applied, experience_satisfaction, experience_nps, \
     experience_nps_reason, sustainability_confidence, sustainability_readiness, \
     consent_use_as_testimonial, completed_at";

const PROJECT_COLUMNS: &str = "p.id, p.project_name, p.sow_number, p.client_name, \
     p.engagement_date, p.engagement_type, p.is_active, p.created_at, \
     COUNT(r.id) AS response_count";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let sample_projects = vec![
        NewProject {
            project_name: "Digital Transformation Strategy".to_string(),
            sow_number: "SOW-2024-001".to_string(),
            client_name: Some("Sample Organization".to_string()),
            engagement_date: Some(NaiveDate::from_ymd_opt(2024, 1, 15).context("invalid date")?),
            engagement_type: Some("Strategic Consulting".to_string()),
        },
        NewProject {
            project_name: "Innovation Workshop Series".to_string(),
            sow_number: "SOW-2024-002".to_string(),
            client_name: Some("Tech Startup Co".to_string()),
            engagement_date: Some(NaiveDate::from_ymd_opt(2024, 2, 20).context("invalid date")?),
            engagement_type: Some("Workshop Facilitation".to_string()),
        },
    ];

    for project in &sample_projects {
        let id = projects::validate_project(project)?;
        sqlx::query(
            r#"
            INSERT INTO survey_analytics.projects
            (id, project_name, sow_number, client_name, engagement_date, engagement_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET project_name = EXCLUDED.project_name, client_name = EXCLUDED.client_name
            "#,
        )
        .bind(&id)
        .bind(&project.project_name)
        .bind(&project.sow_number)
        .bind(&project.client_name)
        .bind(project.engagement_date)
        .bind(&project.engagement_type)
        .execute(pool)
        .await?;
    }

    // (source key, project, respondent, nps, [value x2, capability x2, sustainability x2],
    //  satisfaction, testimonial consent, days ago, nps reason)
    let responses = vec![
        (
            "seed-001",
            "sow-2024-001",
            "Jane Smith",
            10,
            [5, 5, 5, 4, 4, 4],
            5,
            true,
            3,
            "Exceptional expertise and a genuine partnership approach.",
        ),
        (
            "seed-002",
            "sow-2024-001",
            "Marcus Chen",
            8,
            [4, 4, 3, 3, 3, 4],
            4,
            false,
            11,
            "Strong facilitation, implementation support could go further.",
        ),
        (
            "seed-003",
            "sow-2024-001",
            "Priya Nair",
            6,
            [3, 3, 3, 2, 2, 3],
            3,
            false,
            19,
            "Useful roadmap but momentum faded after handover.",
        ),
        (
            "seed-004",
            "sow-2024-002",
            "Tom Okafor",
            9,
            [4, 5, 5, 5, 4, 4],
            5,
            true,
            6,
            "The workshops changed how our team plans product work.",
        ),
        (
            "seed-005",
            "sow-2024-002",
            "Lena Fischer",
            10,
            [5, 4, 4, 4, 5, 5],
            5,
            true,
            25,
            "Practical, energising and tailored to our stage.",
        ),
    ];

    for (source_key, project_id, name, nps, ratings, satisfaction, consent, days_ago, reason) in
        responses
    {
        let submission = NewSurveyResponse {
            project_id: project_id.to_string(),
            respondent_name: Some(name.to_string()),
            respondent_email: None,
            respondent_organization: None,
            is_anonymous: false,
            privacy_policy_accepted: true,
            consent_to_feedback: true,
            value_objectives_delivered: ratings[0],
            value_organisation_created: ratings[1],
            value_tangible_changes: None,
            capability_skills_built: ratings[2],
            capability_applied: ratings[3],
            capability_new_ability: None,
            experience_satisfaction: satisfaction,
            experience_nps: nps,
            experience_nps_reason: Some(reason.to_string()),
            experience_most_valuable: None,
            experience_could_improve: None,
            sustainability_confidence: ratings[4],
            sustainability_readiness: ratings[5],
            sustainability_barriers: None,
            consent_use_as_testimonial: consent,
            attribution_preference: consent.then(|| "name_role".to_string()),
            usage_permissions: consent.then(|| "website;proposals".to_string()),
            testimonial_release_accepted: true,
            time_taken_seconds: Some(600),
            completed_at: Some(Utc::now() - Duration::days(days_ago)),
            source_key: Some(source_key.to_string()),
        };
        insert_response(pool, &submission).await?;
    }

    Ok(())
}

/// The analytics working set, optionally scoped to one project.
pub async fn fetch_responses(
    pool: &PgPool,
    project_id: Option<&str>,
) -> anyhow::Result<Vec<SurveyResponse>> {
    let query = format!(
        "SELECT {RESPONSE_COLUMNS} FROM survey_analytics.responses \
         WHERE ($1::text IS NULL OR project_id = $1)"
    );

    let rows = sqlx::query(&query)
        .bind(project_id)
        .fetch_all(pool)
        .await
        .context("failed to load survey responses")?;

    debug!(count = rows.len(), project = ?project_id, "loaded survey responses");
    Ok(rows.iter().map(response_from_row).collect())
}

/// Newest responses first, filtered by project and NPS category.
pub async fn fetch_response_page(
    pool: &PgPool,
    project_id: Option<&str>,
    category: Option<NpsCategory>,
    page: i64,
    limit: i64,
) -> anyhow::Result<(Vec<SurveyResponse>, Pagination)> {
    let (low, high) = match category.map(NpsCategory::score_range) {
        Some((low, high)) => (Some(low), Some(high)),
        None => (None, None),
    };
    let filter = "WHERE ($1::text IS NULL OR project_id = $1) \
                  AND ($2::int IS NULL OR experience_nps BETWEEN $2 AND $3)";

    let total: i64 = sqlx::query(&format!(
        "SELECT COUNT(*) AS total FROM survey_analytics.responses {filter}"
    ))
    .bind(project_id)
    .bind(low)
    .bind(high)
    .fetch_one(pool)
    .await
    .context("failed to count survey responses")?
    .get("total");

    let pagination = Pagination::new(total, page, limit);
    let rows = sqlx::query(&format!(
        "SELECT {RESPONSE_COLUMNS} FROM survey_analytics.responses {filter} \
         ORDER BY completed_at DESC LIMIT $4 OFFSET $5"
    ))
    .bind(project_id)
    .bind(low)
    .bind(high)
    .bind(pagination.limit)
    .bind(pagination.offset())
    .fetch_all(pool)
    .await
    .context("failed to load survey responses")?;

    Ok((rows.iter().map(response_from_row).collect(), pagination))
}

pub async fn create_project(pool: &PgPool, project: &NewProject) -> anyhow::Result<SurveyProject> {
    let id = projects::validate_project(project)?;

    let row = sqlx::query(
        r#"
        INSERT INTO survey_analytics.projects
        (id, project_name, sow_number, client_name, engagement_date, engagement_type)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT DO NOTHING
        RETURNING created_at
        "#,
    )
    .bind(&id)
    .bind(project.project_name.trim())
    .bind(project.sow_number.trim())
    .bind(&project.client_name)
    .bind(project.engagement_date)
    .bind(&project.engagement_type)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to create project '{id}'"))?;

    let created_at = created_or_conflict(&id, row.map(|row| row.get("created_at")))?;

    info!(project = %id, "created survey project");
    Ok(SurveyProject {
        id,
        project_name: project.project_name.trim().to_string(),
        sow_number: project.sow_number.trim().to_string(),
        client_name: project.client_name.clone(),
        engagement_date: project.engagement_date,
        engagement_type: project.engagement_type.clone(),
        is_active: true,
        created_at,
        response_count: 0,
    })
}

pub async fn list_projects(pool: &PgPool) -> anyhow::Result<Vec<SurveyProject>> {
    let query = format!(
        "SELECT {PROJECT_COLUMNS} FROM survey_analytics.projects p \
         LEFT JOIN survey_analytics.responses r ON r.project_id = p.id \
         GROUP BY p.id ORDER BY p.created_at DESC"
    );

    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .context("failed to list projects")?;

    Ok(rows.iter().map(project_from_row).collect())
}

pub async fn find_project(pool: &PgPool, project_id: &str) -> anyhow::Result<Option<SurveyProject>> {
    let query = format!(
        "SELECT {PROJECT_COLUMNS} FROM survey_analytics.projects p \
         LEFT JOIN survey_analytics.responses r ON r.project_id = p.id \
         WHERE p.id = $1 GROUP BY p.id"
    );

    let row = sqlx::query(&query)
        .bind(project_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to load project '{project_id}'"))?;

    Ok(row.as_ref().map(project_from_row))
}

/// Deletes a project and, through the foreign key cascade, its responses.
pub async fn delete_project(pool: &PgPool, project_id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM survey_analytics.projects WHERE id = $1")
        .bind(project_id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to delete project '{project_id}'"))?;

    Ok(result.rows_affected() > 0)
}

/// Stores a validated submission; returns `None` when its source key was already imported.
pub async fn insert_response(
    pool: &PgPool,
    submission: &NewSurveyResponse,
) -> anyhow::Result<Option<Uuid>> {
    validation::validate_submission(submission)?;

    match find_project(pool, &submission.project_id).await? {
        Some(project) if project.is_active => {}
        Some(_) => bail!("project '{}' is no longer active", submission.project_id),
        None => bail!("project '{}' does not exist", submission.project_id),
    }

    let id = Uuid::new_v4();
    let completed_at = submission.completed_at.unwrap_or_else(Utc::now);
    let result = sqlx::query(
        r#"
        INSERT INTO survey_analytics.responses
        (id, project_id, respondent_name, respondent_email, respondent_organization,
         is_anonymous, privacy_policy_accepted, consent_to_feedback,
         value_objectives_delivered, value_organisation_created, value_tangible_changes,
         capability_skills_built, capability_applied, capability_new_ability,
         experience_satisfaction, experience_nps, experience_nps_reason,
         experience_most_valuable, experience_could_improve,
         sustainability_confidence, sustainability_readiness, sustainability_barriers,
         consent_use_as_testimonial, attribution_preference, usage_permissions,
         testimonial_release_accepted, time_taken_seconds, source_key, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(&submission.project_id)
    .bind(&submission.respondent_name)
    .bind(&submission.respondent_email)
    .bind(&submission.respondent_organization)
    .bind(submission.is_anonymous)
    .bind(submission.privacy_policy_accepted)
    .bind(submission.consent_to_feedback)
    .bind(submission.value_objectives_delivered)
    .bind(submission.value_organisation_created)
    .bind(&submission.value_tangible_changes)
    .bind(submission.capability_skills_built)
    .bind(submission.capability_applied)
    .bind(&submission.capability_new_ability)
    .bind(submission.experience_satisfaction)
    .bind(submission.experience_nps)
    .bind(&submission.experience_nps_reason)
    .bind(&submission.experience_most_valuable)
    .bind(&submission.experience_could_improve)
    .bind(submission.sustainability_confidence)
    .bind(submission.sustainability_readiness)
    .bind(&submission.sustainability_barriers)
    .bind(submission.consent_use_as_testimonial)
    .bind(&submission.attribution_preference)
    .bind(submission.usage_permission_list())
    .bind(submission.testimonial_release_accepted)
    .bind(submission.time_taken_seconds)
    .bind(&submission.source_key)
    .bind(completed_at)
    .execute(pool)
    .await
    .context("failed to store survey response")?;

    if result.rows_affected() == 0 {
        warn!(source_key = ?submission.source_key, "response already imported, skipping");
        return Ok(None);
    }
    Ok(Some(id))
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (index, result) in reader.deserialize::<NewSurveyResponse>().enumerate() {
        // header is line 1
        let line = index + 2;
        let mut submission = result.with_context(|| format!("malformed row on line {line}"))?;
        if submission.source_key.is_none() {
            submission.source_key = Some(format!("import-{}", Uuid::new_v4()));
        }

        let stored = insert_response(pool, &submission)
            .await
            .with_context(|| format!("rejected row on line {line}"))?;

        if stored.is_some() {
            inserted += 1;
        }
    }

    info!(inserted, path = %csv_path.display(), "csv import finished");
    Ok(inserted)
}

/// `None` means the insert hit an existing project id or SOW number.
fn created_or_conflict(
    id: &str,
    created_at: Option<DateTime<Utc>>,
) -> anyhow::Result<DateTime<Utc>> {
    match created_at {
        Some(created_at) => Ok(created_at),
        None => bail!("a project with id '{id}' or the same SOW number already exists"),
    }
}

fn response_from_row(row: &PgRow) -> SurveyResponse {
    SurveyResponse {
        id: row.get("id"),
        project_id: row.get("project_id"),
        respondent_name: row.get("respondent_name"),
        respondent_organization: row.get("respondent_organization"),
        is_anonymous: row.get("is_anonymous"),
        value_objectives_delivered: row.get("value_objectives_delivered"),
        value_organisation_created: row.get("value_organisation_created"),
        capability_skills_built: row.get("capability_skills_built"),
        capability_applied: row.get("capability_applied"),
        experience_satisfaction: row.get("experience_satisfaction"),
        experience_nps: row.get("experience_nps"),
        experience_nps_reason: row.get("experience_nps_reason"),
        sustainability_confidence: row.get("sustainability_confidence"),
        sustainability_readiness: row.get("sustainability_readiness"),
        consent_use_as_testimonial: row.get("consent_use_as_testimonial"),
        completed_at: row.get("completed_at"),
    }
}

fn project_from_row(row: &PgRow) -> SurveyProject {
    SurveyProject {
        id: row.get("id"),
        project_name: row.get("project_name"),
        sow_number: row.get("sow_number"),
        client_name: row.get("client_name"),
        engagement_date: row.get("engagement_date"),
        engagement_type: row.get("engagement_type"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        response_count: row.get("response_count"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn conflicting_project_insert_is_reported() {
        let error = created_or_conflict("sow-2024-001", None).unwrap_err();
        assert_eq!(
            error.to_string(),
            "a project with id 'sow-2024-001' or the same SOW number already exists"
        );
    }

    #[test]
    fn inserted_project_keeps_its_timestamp() {
        let created_at = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();
        assert_eq!(created_or_conflict("sow-2024-001", Some(created_at)).unwrap(), created_at);
    }
}
