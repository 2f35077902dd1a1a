/// Joins a configured base endpoint with a relative API path, collapsing
/// a duplicated leading segment (the `openai` segment named in spec §9)
/// and appending the API version query parameter if missing.
pub fn compose_url(base: &str, relative_path: &str, api_version: &str) -> String {
    let base = base.trim_end_matches('/');
    let relative_path = relative_path.trim_start_matches('/');

    let base_last_segment = base.rsplit('/').next().unwrap_or("");
    let relative_first_segment = relative_path.split('/').next().unwrap_or("");

    let joined = if !base_last_segment.is_empty() && base_last_segment == relative_first_segment {
        match relative_path.splitn(2, '/').nth(1) {
            Some(remainder) if !remainder.is_empty() => format!("{base}/{remainder}"),
            _ => base.to_string(),
        }
    } else {
        format!("{base}/{relative_path}")
    };

    append_api_version(&joined, api_version)
}

fn append_api_version(url: &str, api_version: &str) -> String {
    if url.contains("api-version=") {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}api-version={api_version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_path_when_no_duplicate_segment() {
        let url = compose_url("https://host.example.com", "openai/responses", "v1");
        assert_eq!(url, "https://host.example.com/openai/responses?api-version=v1");
    }

    #[test]
    fn collapses_duplicated_openai_segment() {
        let url = compose_url("https://host.example.com/openai", "openai/responses", "v1");
        assert_eq!(url, "https://host.example.com/openai/responses?api-version=v1");
    }

    #[test]
    fn collapses_duplicated_openai_segment_with_trailing_slash() {
        let url = compose_url("https://host.example.com/openai/", "openai/responses", "v1");
        assert_eq!(url, "https://host.example.com/openai/responses?api-version=v1");
    }

    #[test]
    fn does_not_duplicate_api_version() {
        let url = compose_url("https://host.example.com/openai?api-version=v2", "responses", "v1");
        assert!(url.contains("api-version=v2"));
        assert_eq!(url.matches("api-version=").count(), 1);
    }
}
