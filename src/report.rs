use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{AnalyticsReport, SurveyResponse};
use crate::nps::NpsCategory;

pub fn to_json(report: &AnalyticsReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn build_report(
    project: Option<&str>,
    generated_at: DateTime<Utc>,
    report: &AnalyticsReport,
    responses: &[SurveyResponse],
) -> String {
    let mut output = String::new();
    let project_label = project.unwrap_or("all projects");
    let overview = &report.overview;

    let _ = writeln!(output, "# Survey Impact Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        project_label,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");

    if overview.total_responses == 0 {
        let _ = writeln!(output, "No survey responses recorded for this project yet.");
        return output;
    }

    let breakdown = &overview.nps_breakdown;
    let _ = writeln!(output, "- Responses: {}", overview.total_responses);
    let _ = writeln!(output, "- Net Promoter Score: {}", signed_score(overview.nps));
    let _ = writeln!(
        output,
        "- Promoters {} / Passives {} / Detractors {}",
        breakdown.promoters, breakdown.passives, breakdown.detractors
    );
    let _ = writeln!(
        output,
        "- Testimonial consent: {}% ({})",
        overview.testimonial_consent_rate,
        response_count(overview.testimonial_consent_count)
    );

    let impact = &report.impact_dimensions;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Impact Dimensions");
    for (label, value) in [
        ("Value Realised", impact.value_realised),
        ("Capability Uplift", impact.capability_uplift),
        ("Experience Quality", impact.experience_quality),
        ("Sustainability", impact.sustainability),
    ] {
        let _ = writeln!(output, "- {label}: {value:.1} / 5");
    }

    let detailed = &report.detailed_metrics;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Detailed Metrics");
    let _ = writeln!(
        output,
        "- Value: objectives delivered {:.1}, organisational value {:.1}",
        detailed.value.objectives_delivered, detailed.value.organisation_value
    );
    let _ = writeln!(
        output,
        "- Capability: skills built {:.1}, applied {:.1}",
        detailed.capability.skills_built, detailed.capability.applied
    );
    let _ = writeln!(
        output,
        "- Sustainability: confidence {:.1}, readiness {:.1}",
        detailed.sustainability.confidence, detailed.sustainability.readiness
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## NPS Trend (last 30 days)");
    for week in &report.nps_trend {
        if week.responses == 0 {
            let _ = writeln!(output, "- {}: no responses", week.week);
        } else {
            let _ = writeln!(
                output,
                "- {}: NPS {} across {}",
                week.week,
                signed_score(week.nps),
                response_count(week.responses)
            );
        }
    }

    let mut recent: Vec<&SurveyResponse> = responses.iter().collect();
    recent.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Responses");
    for response in recent.iter().take(5) {
        let _ = write!(
            output,
            "- {} ({}, {}) on {}",
            response.display_name(),
            NpsCategory::classify(response.experience_nps),
            response.experience_nps,
            response.completed_at.date_naive()
        );
        match response.experience_nps_reason.as_deref() {
            Some(reason) if !reason.trim().is_empty() => {
                let _ = writeln!(output, ": {}", reason.trim());
            }
            _ => {
                let _ = writeln!(output);
            }
        }
    }

    output
}

fn signed_score(score: i32) -> String {
    if score > 0 {
        format!("+{score}")
    } else {
        score.to_string()
    }
}

fn response_count(count: usize) -> String {
    if count == 1 {
        "1 response".to_string()
    } else {
        format!("{count} responses")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::compute_analytics_at;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 31, 9, 30, 0).unwrap()
    }

    fn response(name: &str, nps: i32, days_ago: i64, reason: Option<&str>) -> SurveyResponse {
        SurveyResponse {
            id: Uuid::new_v4(),
            project_id: "sow-2024-001".to_string(),
            respondent_name: Some(name.to_string()),
            respondent_organization: None,
            is_anonymous: false,
            value_objectives_delivered: 5,
            value_organisation_created: 4,
            capability_skills_built: 4,
            capability_applied: 4,
            experience_satisfaction: 5,
            experience_nps: nps,
            experience_nps_reason: reason.map(str::to_string),
            sustainability_confidence: 3,
            sustainability_readiness: 4,
            consent_use_as_testimonial: true,
            completed_at: generated_at() - Duration::days(days_ago),
        }
    }

    #[test]
    fn empty_report_says_so() {
        let responses: Vec<SurveyResponse> = Vec::new();
        let report = compute_analytics_at(&responses, generated_at());

        let output = build_report(Some("sow-2024-001"), generated_at(), &report, &responses);

        assert!(output.contains("Generated for sow-2024-001 on 2026-03-31 09:30 UTC"));
        assert!(output.contains("No survey responses recorded"));
        assert!(!output.contains("## Impact Dimensions"));
    }

    #[test]
    fn renders_metrics_and_recent_responses() {
        let mut anonymous = response("Hidden Person", 4, 2, None);
        anonymous.is_anonymous = true;
        let responses = vec![
            response("Jane Smith", 10, 10, Some("Genuine partnership")),
            anonymous,
        ];
        let report = compute_analytics_at(&responses, generated_at());

        let output = build_report(None, generated_at(), &report, &responses);

        assert!(output.contains("Generated for all projects"));
        assert!(output.contains("- Net Promoter Score: 0\n"));
        assert!(output.contains("- Value Realised: 4.5 / 5"));
        assert!(output.contains("- Testimonial consent: 100% (2 responses)"));
        assert!(output.contains("- Week 3: NPS +100 across 1 response\n"));
        assert!(output.contains("- Week 1: no responses"));
        assert!(!output.contains("Hidden Person"));

        let anonymous_line = output.find("- Anonymous (detractor, 4)").unwrap();
        let jane_line = output
            .find("- Jane Smith (promoter, 10) on 2026-03-21: Genuine partnership")
            .unwrap();
        assert!(anonymous_line < jane_line);
    }

    #[test]
    fn scores_and_counts_read_naturally() {
        assert_eq!(signed_score(0), "0");
        assert_eq!(signed_score(40), "+40");
        assert_eq!(signed_score(-13), "-13");
        assert_eq!(response_count(1), "1 response");
        assert_eq!(response_count(3), "3 responses");
    }

    #[test]
    fn json_uses_dashboard_field_names() {
        let responses = vec![response("Jane Smith", 9, 1, None)];
        let report = compute_analytics_at(&responses, generated_at());

        let json: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();

        assert_eq!(json["overview"]["totalResponses"], 1);
        assert_eq!(json["overview"]["npsBreakdown"]["promoters"], 1);
        assert_eq!(json["overview"]["testimonialConsentRate"], 100);
        assert_eq!(json["impactDimensions"]["experienceQuality"], 5.0);
        assert_eq!(json["detailedMetrics"]["value"]["organisationValue"], 4.0);
        assert_eq!(json["detailedMetrics"]["capability"]["skillsBuilt"], 4.0);
        assert_eq!(json["npsTrend"].as_array().unwrap().len(), 4);
        assert_eq!(json["npsTrend"][0]["week"], "Week 1");
    }
}
