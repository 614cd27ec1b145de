use std::collections::HashMap;

/// Port assumed when the `Host` header carries none, or an unparsable one.
pub const DEFAULT_PORT: u16 = 80;

/// Represents a parsed HTTP request from a client.
///
/// Built once by the parser and never mutated afterwards. Header keys are
/// kept exactly as the client sent them; on duplicates the last one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method token, verbatim (e.g. "GET")
    pub method: String,
    /// The request path without the query string, leading slash preserved
    pub path: String,
    /// Protocol token, verbatim (typically "HTTP/1.1")
    pub protocol: String,
    /// Request headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Query parameters; repeated keys keep the last value
    pub params: HashMap<String, String>,
    /// Raw query string, if the target contained a `?`
    pub query: Option<String>,
    /// Host name taken from the `Host` header
    pub host: String,
    /// Port taken from the `Host` header
    pub port: u16,
}

/// Builder for constructing Request objects.
///
/// Mostly useful for exercising handlers without a socket.
pub struct RequestBuilder {
    method: Option<String>,
    path: Option<String>,
    protocol: Option<String>,
    headers: HashMap<String, String>,
    query: Option<String>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            protocol: None,
            headers: HashMap::new(),
            query: None,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Fails if the method, the path or the `Host` header is missing.
    pub fn build(self) -> Result<Request, &'static str> {
        let host_header = find_host(&self.headers).ok_or("host header missing")?;
        let (host, port) = split_host_port(host_header);
        let params = self.query.as_deref().map(parse_query).unwrap_or_default();

        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            protocol: self.protocol.unwrap_or_else(|| "HTTP/1.1".to_string()),
            params,
            query: self.query,
            host,
            port,
            headers: self.headers,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Retrieves a header value by its name as received.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Retrieves a query parameter value.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|v| v.as_str())
    }

    /// The raw query string, without the leading `?`.
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

/// Splits a query string into parameters.
///
/// Pairs are separated by `&` and split on their first `=`; pairs without
/// `=` are dropped. No percent-decoding is applied.
///
/// ```
/// # use vesta::http::request::parse_query;
/// let params = parse_query("a=1&b=x=y&a=2&flag");
/// assert_eq!(params.get("a").map(String::as_str), Some("2"));
/// assert_eq!(params.get("b").map(String::as_str), Some("x=y"));
/// assert!(!params.contains_key("flag"));
/// ```
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Splits a `Host` header value into host name and port.
///
/// The split happens on the last `:`; a missing or non-numeric port yields
/// [`DEFAULT_PORT`]. Bracketed IPv6 literals without a port are left intact.
pub fn split_host_port(value: &str) -> (String, u16) {
    if value.ends_with(']') {
        return (value.to_string(), DEFAULT_PORT);
    }

    match value.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(DEFAULT_PORT)),
        None => (value.to_string(), DEFAULT_PORT),
    }
}

/// Finds the `Host` header, preferring the canonical spelling.
pub(crate) fn find_host(headers: &HashMap<String, String>) -> Option<&str> {
    headers
        .get("Host")
        .or_else(|| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("host"))
                .map(|(_, v)| v)
        })
        .map(|v| v.as_str())
}
