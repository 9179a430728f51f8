use chrono::{DateTime, Duration, Utc};

use crate::models::{
    AnalyticsReport, CapabilityMetrics, DetailedMetrics, ImpactDimensions, NpsBreakdown,
    Overview, SurveyResponse, SustainabilityMetrics, ValueMetrics, WeeklyNps,
};
use crate::nps::rounded_percent;

pub const TREND_WINDOW_DAYS: i64 = 30;
pub const TREND_WEEKS: i64 = 4;
pub const TREND_BUCKET_DAYS: i64 = 7;

/// Responses belonging to `project_id`, or all of them when no project is given.
pub fn filter_by_project<'a>(
    responses: &'a [SurveyResponse],
    project_id: Option<&str>,
) -> Vec<&'a SurveyResponse> {
    responses
        .iter()
        .filter(|response| project_id.map_or(true, |id| response.project_id == id))
        .collect()
}

pub fn compute_analytics<'a, I>(responses: I) -> AnalyticsReport
where
    I: IntoIterator<Item = &'a SurveyResponse>,
{
    compute_analytics_at(responses, Utc::now())
}

/// Aggregates the dashboard metrics, bucketing the trend relative to `now`.
pub fn compute_analytics_at<'a, I>(responses: I, now: DateTime<Utc>) -> AnalyticsReport
where
    I: IntoIterator<Item = &'a SurveyResponse>,
{
    let responses: Vec<&SurveyResponse> = responses.into_iter().collect();
    let total = responses.len();

    let breakdown = NpsBreakdown::tally(responses.iter().map(|r| r.experience_nps));
    let consent_count = responses
        .iter()
        .filter(|r| r.consent_use_as_testimonial)
        .count();

    let detailed = DetailedMetrics {
        value: ValueMetrics {
            objectives_delivered: mean(&responses, |r| r.value_objectives_delivered),
            organisation_value: mean(&responses, |r| r.value_organisation_created),
        },
        capability: CapabilityMetrics {
            skills_built: mean(&responses, |r| r.capability_skills_built),
            applied: mean(&responses, |r| r.capability_applied),
        },
        sustainability: SustainabilityMetrics {
            confidence: mean(&responses, |r| r.sustainability_confidence),
            readiness: mean(&responses, |r| r.sustainability_readiness),
        },
    };

    let impact = ImpactDimensions {
        value_realised: pair_mean(
            detailed.value.objectives_delivered,
            detailed.value.organisation_value,
        ),
        capability_uplift: pair_mean(detailed.capability.skills_built, detailed.capability.applied),
        experience_quality: mean(&responses, |r| r.experience_satisfaction),
        sustainability: pair_mean(
            detailed.sustainability.confidence,
            detailed.sustainability.readiness,
        ),
    };

    AnalyticsReport {
        overview: Overview {
            total_responses: total,
            nps: breakdown.score(),
            nps_breakdown: breakdown,
            testimonial_consent_rate: rounded_percent(consent_count, total),
            testimonial_consent_count: consent_count,
        },
        impact_dimensions: impact,
        detailed_metrics: detailed,
        nps_trend: weekly_trend_at(&responses, now),
    }
}

/// Start of the trailing trend window.
pub fn trend_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(TREND_WINDOW_DAYS)
}

/// Four fixed 7-day buckets from `now - 30 days`, each half-open `[start, end)`.
///
/// The buckets end two days short of `now`; responses in that tail are not
/// part of any week.
pub fn weekly_trend_at(responses: &[&SurveyResponse], now: DateTime<Utc>) -> Vec<WeeklyNps> {
    let window_start = trend_window_start(now);

    (0..TREND_WEEKS)
        .map(|week| {
            let start = window_start + Duration::days(week * TREND_BUCKET_DAYS);
            let end = start + Duration::days(TREND_BUCKET_DAYS);
            let breakdown = NpsBreakdown::tally(
                responses
                    .iter()
                    .filter(|r| r.completed_at >= start && r.completed_at < end)
                    .map(|r| r.experience_nps),
            );

            WeeklyNps {
                week: format!("Week {}", week + 1),
                nps: breakdown.score(),
                responses: breakdown.total(),
            }
        })
        .collect()
}

fn mean<F>(responses: &[&SurveyResponse], rating: F) -> f64
where
    F: Fn(&SurveyResponse) -> i32,
{
    if responses.is_empty() {
        return 0.0;
    }
    let sum: i64 = responses.iter().map(|&r| rating(r) as i64).sum();
    sum as f64 / responses.len() as f64
}

fn pair_mean(first: f64, second: f64) -> f64 {
    (first + second) / 2.0
}
