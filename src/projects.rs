use thiserror::Error;

use crate::models::NewProject;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    #[error("project name must be at least 3 characters")]
    NameTooShort,
    #[error("SOW number is required")]
    MissingSow,
    #[error("SOW number '{0}' does not contain any letters or digits")]
    EmptySlug(String),
}

/// URL-safe project id derived from the SOW number, e.g. `SOW 2024/017` -> `sow-2024-017`.
pub fn project_slug(sow_number: &str) -> Result<String, ProjectError> {
    let mut slug = String::with_capacity(sow_number.len());
    let mut pending_dash = false;

    for ch in sow_number.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        return Err(ProjectError::EmptySlug(sow_number.to_string()));
    }
    Ok(slug)
}

pub fn survey_url(base_url: &str, project_id: &str) -> String {
    format!("{}/survey/{}", base_url.trim_end_matches('/'), project_id)
}

/// Checks a new project and returns the id it will be stored under.
pub fn validate_project(project: &NewProject) -> Result<String, ProjectError> {
    if project.project_name.trim().chars().count() < 3 {
        return Err(ProjectError::NameTooShort);
    }
    if project.sow_number.trim().is_empty() {
        return Err(ProjectError::MissingSow);
    }
    project_slug(&project.sow_number)
}
