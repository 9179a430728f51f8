use thiserror::Error;

use crate::models::NewSurveyResponse;

pub const ATTRIBUTION_PREFERENCES: [&str; 8] = [
    "full",
    "name_role",
    "role_company",
    "role_only",
    "company_only",
    "first_name_only",
    "industry_only",
    "anonymous",
];

pub const USAGE_PERMISSIONS: [&str; 7] = [
    "edit_with_approval",
    "excerpt",
    "website",
    "proposals",
    "social_media",
    "case_studies",
    "reference_calls",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i32,
        max: i32,
        value: i32,
    },
    #[error("{0} must be accepted")]
    ConsentRequired(&'static str),
    #[error("respondent_email '{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("unknown attribution preference '{0}'")]
    UnknownAttribution(String),
    #[error("unknown usage permission '{0}'")]
    UnknownUsagePermission(String),
}

/// Every problem found in a submission, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("survey submission is invalid: {}", join_errors(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

pub fn validate_submission(submission: &NewSurveyResponse) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    let ratings = [
        ("value_objectives_delivered", submission.value_objectives_delivered),
        ("value_organisation_created", submission.value_organisation_created),
        ("capability_skills_built", submission.capability_skills_built),
        ("capability_applied", submission.capability_applied),
        ("experience_satisfaction", submission.experience_satisfaction),
        ("sustainability_confidence", submission.sustainability_confidence),
        ("sustainability_readiness", submission.sustainability_readiness),
    ];
    for (field, value) in ratings {
        check_range(&mut errors, field, value, 1, 5);
    }
    check_range(&mut errors, "experience_nps", submission.experience_nps, 0, 10);

    let consents = [
        ("privacy_policy_accepted", submission.privacy_policy_accepted),
        ("consent_to_feedback", submission.consent_to_feedback),
        ("testimonial_release_accepted", submission.testimonial_release_accepted),
    ];
    for (field, accepted) in consents {
        if !accepted {
            errors.push(FieldError::ConsentRequired(field));
        }
    }

    if let Some(email) = submission
        .respondent_email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
    {
        if !looks_like_email(email) {
            errors.push(FieldError::InvalidEmail(email.to_string()));
        }
    }

    if let Some(preference) = submission.attribution_preference.as_deref() {
        if !ATTRIBUTION_PREFERENCES.contains(&preference) {
            errors.push(FieldError::UnknownAttribution(preference.to_string()));
        }
    }

    for permission in submission.usage_permission_list() {
        if !USAGE_PERMISSIONS.contains(&permission.as_str()) {
            errors.push(FieldError::UnknownUsagePermission(permission));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn check_range(errors: &mut Vec<FieldError>, field: &'static str, value: i32, min: i32, max: i32) {
    if !(min..=max).contains(&value) {
        errors.push(FieldError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_submission() -> NewSurveyResponse {
        NewSurveyResponse {
            project_id: "sow-2024-017".to_string(),
            respondent_name: Some("Jane Smith".to_string()),
            respondent_email: Some("jane.smith@example.com".to_string()),
            respondent_organization: Some("Sample Organization".to_string()),
            is_anonymous: false,
            privacy_policy_accepted: true,
            consent_to_feedback: true,
            value_objectives_delivered: 5,
            value_organisation_created: 5,
            value_tangible_changes: None,
            capability_skills_built: 5,
            capability_applied: 4,
            capability_new_ability: None,
            experience_satisfaction: 5,
            experience_nps: 10,
            experience_nps_reason: Some("Genuine partnership".to_string()),
            experience_most_valuable: None,
            experience_could_improve: None,
            sustainability_confidence: 4,
            sustainability_readiness: 4,
            sustainability_barriers: None,
            consent_use_as_testimonial: true,
            attribution_preference: Some("full".to_string()),
            usage_permissions: Some("website;proposals".to_string()),
            testimonial_release_accepted: true,
            time_taken_seconds: Some(720),
            completed_at: None,
            source_key: None,
        }
    }

    #[test]
    fn accepts_complete_submission() {
        assert_eq!(validate_submission(&valid_submission()), Ok(()));
    }

    #[test]
    fn blank_email_is_treated_as_missing() {
        let mut submission = valid_submission();
        submission.respondent_email = Some("  ".to_string());
        assert!(validate_submission(&submission).is_ok());
    }

    #[test]
    fn collects_every_range_violation() {
        let mut submission = valid_submission();
        submission.capability_applied = 0;
        submission.sustainability_readiness = 6;
        submission.experience_nps = 11;

        let error = validate_submission(&submission).unwrap_err();

        assert_eq!(error.errors.len(), 3);
        assert!(error.errors.contains(&FieldError::OutOfRange {
            field: "experience_nps",
            min: 0,
            max: 10,
            value: 11,
        }));
    }

    #[test]
    fn nps_accepts_full_scale() {
        for score in [0, 10] {
            let mut submission = valid_submission();
            submission.experience_nps = score;
            assert!(validate_submission(&submission).is_ok(), "score {score}");
        }
    }

    #[test]
    fn requires_consents() {
        let mut submission = valid_submission();
        submission.privacy_policy_accepted = false;
        submission.testimonial_release_accepted = false;

        let error = validate_submission(&submission).unwrap_err();

        assert_eq!(
            error.errors,
            vec![
                FieldError::ConsentRequired("privacy_policy_accepted"),
                FieldError::ConsentRequired("testimonial_release_accepted"),
            ]
        );
        assert!(error.to_string().contains("privacy_policy_accepted must be accepted"));
    }

    #[test]
    fn rejects_malformed_email() {
        for email in ["jane", "jane@", "@example.com", "jane@example", "ja ne@example.com"] {
            let mut submission = valid_submission();
            submission.respondent_email = Some(email.to_string());
            assert!(validate_submission(&submission).is_err(), "{email}");
        }
    }

    #[test]
    fn rejects_unknown_testimonial_options() {
        let mut submission = valid_submission();
        submission.attribution_preference = Some("nickname".to_string());
        submission.usage_permissions = Some("website;billboards".to_string());

        let error = validate_submission(&submission).unwrap_err();

        assert_eq!(
            error.errors,
            vec![
                FieldError::UnknownAttribution("nickname".to_string()),
                FieldError::UnknownUsagePermission("billboards".to_string()),
            ]
        );
    }

    #[test]
    fn usage_permissions_split_on_semicolons() {
        let mut submission = valid_submission();
        submission.usage_permissions = Some("website; proposals;;".to_string());
        assert_eq!(
            submission.usage_permission_list(),
            vec!["website".to_string(), "proposals".to_string()]
        );
    }
}
