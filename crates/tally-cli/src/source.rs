//! Bundled default resolution: a seed file next to the project, or a URL.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tally_core::model::Snapshot;
use tally_core::store::{DefaultSource, FileSource, LoadError};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A default snapshot served over HTTP.
///
/// Each fetch appends `t=<millis>` so intermediate caches never serve a
/// stale copy.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl DefaultSource for HttpSource {
    fn fetch(&self) -> Result<Snapshot, LoadError> {
        let fetch_err = |reason: String| LoadError::Fetch {
            location: self.url.clone(),
            reason,
        };

        let response = ureq::get(&self.url)
            .query("t", &Utc::now().timestamp_millis().to_string())
            .set("Accept", "application/json")
            .set("User-Agent", "tally-cli")
            .timeout(FETCH_TIMEOUT)
            .call()
            .map_err(|err| fetch_err(err.to_string()))?;

        let body = response
            .into_string()
            .map_err(|err| fetch_err(err.to_string()))?;

        Ok(Snapshot::from_json(&body)?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

fn is_url(seed: &str) -> bool {
    seed.starts_with("http://") || seed.starts_with("https://")
}

/// Pick the source for a configured seed. Relative paths resolve against
/// the project root.
pub fn resolve_seed(project_root: &Path, seed: &str) -> Box<dyn DefaultSource> {
    if is_url(seed) {
        Box::new(HttpSource::new(seed))
    } else {
        Box::new(FileSource::new(project_root.join(seed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_become_http_sources() {
        let source = resolve_seed(Path::new("/srv/board"), "https://example.org/data.json");
        assert_eq!(source.describe(), "https://example.org/data.json");
    }

    #[test]
    fn relative_paths_join_project_root() {
        let source = resolve_seed(Path::new("/srv/board"), "intramurals_data.json");
        assert_eq!(source.describe(), "/srv/board/intramurals_data.json");
    }

    #[test]
    fn absolute_paths_are_kept() {
        let source = resolve_seed(Path::new("/srv/board"), "/etc/tally/seed.json");
        assert_eq!(source.describe(), "/etc/tally/seed.json");
    }

    #[test]
    fn unreachable_url_is_fetch_failure() {
        let err = HttpSource::new("http://127.0.0.1:9/intramurals_data.json")
            .fetch()
            .unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
    }
}
