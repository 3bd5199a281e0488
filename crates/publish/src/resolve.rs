// Path: crates/publish/src/resolve.rs
use daokit_types::error::PublishError;
use daokit_types::VersionTag;
use std::fmt::Display;
use std::future::Future;

/// Builds commonly published on every network, tried after the preferred ones.
const FALLBACK_VERSIONS: [VersionTag; 3] = [
    VersionTag::new(1, 2),
    VersionTag::new(1, 1),
    VersionTag::new(1, 0),
];

/// Ordered, de-duplicated candidates: network preference first, then the
/// plugin's nominal install version, then the common fallbacks.
pub fn version_candidates(preferred: &[VersionTag], install_version: VersionTag) -> Vec<VersionTag> {
    let mut out: Vec<VersionTag> = Vec::with_capacity(preferred.len() + 4);
    for tag in preferred
        .iter()
        .copied()
        .chain(std::iter::once(install_version))
        .chain(FALLBACK_VERSIONS)
    {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub version: VersionTag,
    pub value: T,
    /// Attempts made, including the successful one.
    pub attempts: usize,
}

/// Tries `attempt` with each candidate in order and returns the first success.
///
/// Bounded by the candidate list, never by time. When every candidate fails the
/// error lists all candidates and every failure message in order.
pub async fn resolve_version<T, E, F, Fut>(
    candidates: &[VersionTag],
    mut attempt: F,
) -> Result<Resolved<T>, PublishError>
where
    E: Display,
    F: FnMut(VersionTag) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if candidates.is_empty() {
        return Err(PublishError::NoCandidates);
    }

    let mut errors = Vec::with_capacity(candidates.len());
    for (idx, &version) in candidates.iter().enumerate() {
        match attempt(version).await {
            Ok(value) => {
                tracing::debug!(target: "publish", %version, attempts = idx + 1, "version resolved");
                return Ok(Resolved {
                    version,
                    value,
                    attempts: idx + 1,
                });
            }
            Err(e) => {
                tracing::debug!(target: "publish", %version, error = %e, "candidate rejected");
                errors.push(e.to_string());
            }
        }
    }

    Err(PublishError::VersionResolution {
        candidates: candidates.to_vec(),
        errors,
    })
}
