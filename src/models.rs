use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored survey response, as read back for analytics and listings.
#[derive(Debug, Clone)]
pub struct SurveyResponse {
    pub id: Uuid,
    pub project_id: String,
    pub respondent_name: Option<String>,
    pub respondent_organization: Option<String>,
    pub is_anonymous: bool,
    pub value_objectives_delivered: i32,
    pub value_organisation_created: i32,
    pub capability_skills_built: i32,
    pub capability_applied: i32,
    pub experience_satisfaction: i32,
    pub experience_nps: i32,
    pub experience_nps_reason: Option<String>,
    pub sustainability_confidence: i32,
    pub sustainability_readiness: i32,
    pub consent_use_as_testimonial: bool,
    pub completed_at: DateTime<Utc>,
}

impl SurveyResponse {
    /// Name shown in listings; anonymous respondents are never named.
    pub fn display_name(&self) -> &str {
        if self.is_anonymous {
            return "Anonymous";
        }
        self.respondent_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Unnamed respondent")
    }
}

#[derive(Debug, Clone)]
pub struct SurveyProject {
    pub id: String,
    pub project_name: String,
    pub sow_number: String,
    pub client_name: Option<String>,
    pub engagement_date: Option<NaiveDate>,
    pub engagement_type: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub response_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub project_name: String,
    pub sow_number: String,
    pub client_name: Option<String>,
    pub engagement_date: Option<NaiveDate>,
    pub engagement_type: Option<String>,
}

/// A survey submission before it is stored.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSurveyResponse {
    pub project_id: String,
    pub respondent_name: Option<String>,
    pub respondent_email: Option<String>,
    pub respondent_organization: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub privacy_policy_accepted: bool,
    pub consent_to_feedback: bool,
    pub value_objectives_delivered: i32,
    pub value_organisation_created: i32,
    pub value_tangible_changes: Option<String>,
    pub capability_skills_built: i32,
    pub capability_applied: i32,
    pub capability_new_ability: Option<String>,
    pub experience_satisfaction: i32,
    pub experience_nps: i32,
    pub experience_nps_reason: Option<String>,
    pub experience_most_valuable: Option<String>,
    pub experience_could_improve: Option<String>,
    pub sustainability_confidence: i32,
    pub sustainability_readiness: i32,
    pub sustainability_barriers: Option<String>,
    #[serde(default)]
    pub consent_use_as_testimonial: bool,
    pub attribution_preference: Option<String>,
    /// Semicolon separated in CSV input, e.g. `website;proposals`.
    pub usage_permissions: Option<String>,
    pub testimonial_release_accepted: bool,
    pub time_taken_seconds: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Idempotency key; a second import of the same key is skipped.
    pub source_key: Option<String>,
}

impl NewSurveyResponse {
    pub fn usage_permission_list(&self) -> Vec<String> {
        self.usage_permissions
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NpsBreakdown {
    pub promoters: usize,
    pub passives: usize,
    pub detractors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_responses: usize,
    pub nps: i32,
    pub nps_breakdown: NpsBreakdown,
    pub testimonial_consent_rate: i32,
    pub testimonial_consent_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactDimensions {
    pub value_realised: f64,
    pub capability_uplift: f64,
    pub experience_quality: f64,
    pub sustainability: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueMetrics {
    pub objectives_delivered: f64,
    pub organisation_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityMetrics {
    pub skills_built: f64,
    pub applied: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SustainabilityMetrics {
    pub confidence: f64,
    pub readiness: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailedMetrics {
    pub value: ValueMetrics,
    pub capability: CapabilityMetrics,
    pub sustainability: SustainabilityMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyNps {
    pub week: String,
    pub nps: i32,
    pub responses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub overview: Overview,
    pub impact_dimensions: ImpactDimensions,
    pub detailed_metrics: DetailedMetrics,
    pub nps_trend: Vec<WeeklyNps>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

pub const MAX_PAGE_SIZE: i64 = 100;

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let total_rows = total.max(0);
        Self {
            total,
            page,
            limit,
            total_pages: total_rows / limit + i64::from(total_rows % limit != 0),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_total_pages_up() {
        let pagination = Pagination::new(41, 3, 20);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.offset(), 40);
    }

    #[test]
    fn pagination_clamps_page_and_limit() {
        let pagination = Pagination::new(0, 0, 0);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 1);
        assert_eq!(pagination.total_pages, 0);
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn pagination_survives_extreme_options() {
        let wide = Pagination::new(5, 1, i64::MAX);
        assert_eq!(wide.limit, MAX_PAGE_SIZE);
        assert_eq!(wide.total_pages, 1);

        let far = Pagination::new(5, i64::MAX, 20);
        assert_eq!(far.offset(), i64::MAX);
        assert_eq!(far.total_pages, 1);

        let huge_total = Pagination::new(i64::MAX, 1, 100);
        assert_eq!(huge_total.total_pages, i64::MAX / 100 + 1);
    }

    fn response(name: Option<&str>, is_anonymous: bool) -> SurveyResponse {
        SurveyResponse {
            id: Uuid::new_v4(),
            project_id: "sow-2024-001".to_string(),
            respondent_name: name.map(str::to_string),
            respondent_organization: None,
            is_anonymous,
            value_objectives_delivered: 4,
            value_organisation_created: 4,
            capability_skills_built: 4,
            capability_applied: 4,
            experience_satisfaction: 4,
            experience_nps: 8,
            experience_nps_reason: None,
            sustainability_confidence: 4,
            sustainability_readiness: 4,
            consent_use_as_testimonial: false,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn display_name_falls_back_for_missing_names() {
        assert_eq!(response(Some("Jane Smith"), false).display_name(), "Jane Smith");
        assert_eq!(response(Some("   "), false).display_name(), "Unnamed respondent");
        assert_eq!(response(None, false).display_name(), "Unnamed respondent");
        assert_eq!(response(Some("Jane Smith"), true).display_name(), "Anonymous");
    }
}
