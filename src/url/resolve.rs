use crate::TidepoolError;
use url::Url;

/// Parses and checks the seed URL given on the command line
///
/// # Returns
///
/// * `Ok(Url)` - An absolute http(s) URL with a host
/// * `Err(TidepoolError::InvalidSeed)` - Anything else
pub fn parse_seed(seed: &str) -> Result<Url, TidepoolError> {
    let url = Url::parse(seed.trim()).map_err(|e| TidepoolError::InvalidSeed {
        url: seed.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(TidepoolError::InvalidSeed {
            url: seed.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if url.host_str().is_none() {
        return Err(TidepoolError::InvalidSeed {
            url: seed.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// Resolves an href against the URL of the page it was found on
///
/// Absolute hrefs come back normalized; relative ones are joined to `base`.
/// If the href cannot be resolved it is returned untouched, which leaves the
/// candidate filter to reject it.
pub fn resolve_href(href: &str, base: &Url) -> String {
    match base.join(href.trim()) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => href.to_string(),
    }
}
