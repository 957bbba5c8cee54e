//! Candidate generation and first-match URL resolution.

use tracing::{debug, info, warn};

use crate::api::{ArchiveClient, ProbeOutcome};
use crate::catalog::{render_template, Subject, GENERIC_TEMPLATES};
use crate::domain::{AcademicYear, AppError};

/// Catalog paths for a pair, in probe order.
///
/// Subject-specific templates come first. Generic templates follow, grouped by
/// subject variant so every template is tried with the first spelling before
/// moving on to the next.
pub fn candidate_paths(subject: Subject, year: AcademicYear) -> Vec<String> {
    let year = year.to_string();
    let specific = subject.specific_templates();
    let variants = subject.variants();

    let mut paths = Vec::with_capacity(specific.len() + variants.len() * GENERIC_TEMPLATES.len());
    paths.extend(
        specific
            .iter()
            .map(|template| render_template(template, &year, None)),
    );
    for &variant in variants {
        paths.extend(
            GENERIC_TEMPLATES
                .iter()
                .map(|template| render_template(template, &year, Some(variant))),
        );
    }
    paths
}

/// Probe candidates in order and return the first one the archive serves.
pub async fn resolve(
    client: &ArchiveClient,
    subject: Subject,
    year: AcademicYear,
) -> Result<String, AppError> {
    for path in candidate_paths(subject, year) {
        let url = client.url_for(&path);
        match client.probe(&url).await {
            ProbeOutcome::Hit => {
                info!(%subject, %year, %url, "Found valid URL");
                return Ok(url);
            }
            ProbeOutcome::Miss(reason) => {
                debug!(%url, %reason, "Candidate not available");
            }
        }
    }

    warn!(%subject, %year, "No valid URL found");
    Err(AppError::NotFound {
        subject: subject.to_string(),
        year: year.to_string(),
    })
}
