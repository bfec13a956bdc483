use url::Url;

/// Builds the key used to group connections per host
///
/// The host is lowercased and the effective port is appended, so
/// `http://a.com` and `http://a.com:8080` count against different caps while
/// `http://A.com/x` and `http://a.com:80/y` share one.
///
/// # Returns
///
/// * `Some(String)` - `host:port`
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use tidepool::url::host_key;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com:443".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port_or_known_default() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
