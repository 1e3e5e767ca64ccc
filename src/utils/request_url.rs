use actix_web::HttpRequest;

/// Scheme, host and port the client used to reach us
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    scheme: String,
    host: String,
    port: u16,
}

impl RequestOrigin {
    #[must_use]
    pub fn new(scheme: &str, host: &str, port: u16) -> Self {
        Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_string(),
            port,
        }
    }

    /// Origin from the connection info, honouring `Forwarded`/`X-Forwarded-*`
    #[must_use]
    pub fn from_request(req: &HttpRequest) -> Self {
        let info = req.connection_info();
        let scheme = info.scheme().to_ascii_lowercase();
        let (host, port) = split_host_port(info.host());
        let port = port.unwrap_or_else(|| default_port(&scheme));
        Self {
            scheme,
            host: host.to_string(),
            port,
        }
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `scheme://host[:port]`, omitting the port when it is the scheme default
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.port == default_port(&self.scheme) {
            format!("{}://{}", self.scheme, self.host)
        } else {
            format!("{}://{}:{}", self.scheme, self.host, self.port)
        }
    }

    /// Absolute URL for a path on this origin
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let mut url = self.base_url();
        url.push_str(path);
        url
    }

    /// Absolute URL including a query string, when there is one
    #[must_use]
    pub fn url_with_query(&self, path: &str, query: &str) -> String {
        let mut url = self.url_for(path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

/// Default port for `http`/`https`; any other scheme has none
#[must_use]
pub fn default_port(scheme: &str) -> u16 {
    match scheme {
        "https" => 443,
        "http" => 80,
        _ => 0,
    }
}

fn split_host_port(authority: &str) -> (&str, Option<u16>) {
    // bracketed IPv6 literal, e.g. [::1]:8080
    if authority.starts_with('[') {
        return match authority.rfind("]:") {
            Some(idx) => match authority[idx + 2..].parse() {
                Ok(port) => (&authority[..=idx], Some(port)),
                Err(_) => (authority, None),
            },
            None => (authority, None),
        };
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host, Some(port)),
            Err(_) => (authority, None),
        },
        None => (authority, None),
    }
}
