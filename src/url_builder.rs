use anyhow::{Context, Result};
use url::Url;

/// A builder for endpoint URLs from a configured host and a fixed path
///
/// Hosts come from configuration as bare authorities ("api.example.com" or
/// "127.0.0.1:8080"). The scheme is only chosen once the hostname is known.
#[derive(Debug)]
pub struct URLBuilder {
    pub scheme: String,
    pub hostname: String,
    pub port: Option<String>,
    pub path: String,
}

impl URLBuilder {
    /// Returns the URL authority
    ///
    /// The authority is the hostname and port, e.g. "example.com:8080"
    pub fn authority(&self) -> String {
        match &self.port {
            Some(port) => format!("{}:{}", self.hostname, port),
            None => self.hostname.clone(),
        }
    }

    /// Builds the URL from the parts
    pub fn build(&self) -> String {
        format!("{}://{}{}", self.scheme, self.authority(), self.path)
    }

    /// Creates a URL builder from a host authority and an endpoint path
    ///
    /// Hostnames listed in `http_hostnames` are reached over plain http,
    /// everything else over https.
    pub fn from_host(host: &str, path: &str, http_hostnames: &[String]) -> Result<Self> {
        let parsed_url = format!("https://{}", host)
            .parse::<Url>()
            .context("parse host")?;

        let hostname = parsed_url.host_str().context("get host")?.to_string();
        let scheme = get_scheme(&hostname, http_hostnames);
        let path = if path.is_empty() { "/" } else { path };

        Ok(Self {
            scheme,
            port: parsed_url.port().map(|p| p.to_string()),
            hostname,
            path: path.to_string(),
        })
    }
}

fn get_scheme(hostname: &str, http_hostnames: &[String]) -> String {
    if http_hostnames.iter().any(|h| h == hostname) {
        "http".to_string()
    } else {
        "https".to_string()
    }
}
