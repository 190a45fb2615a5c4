//! Incoming HTTP request type.

use bytes::Bytes;

/// An incoming HTTP request.
///
/// Method, path and headers are fixed once dispatch begins. Headers are read
/// one name at a time through [`header_value`](Request::header_value). The
/// body is reachable only by consuming the request with
/// [`into_body`](Request::into_body), so it is read at most once.
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
}

impl Request {
    /// Creates a request with no headers and an empty body.
    ///
    /// ```rust
    /// use cardgate::Request;
    ///
    /// let req = Request::new("POST", "/api/v1/create")
    ///     .header("authorization", "tok123")
    ///     .body(r#"{"fullName":"Ada"}"#);
    /// assert_eq!(req.header_value("Authorization"), Some("tok123"));
    /// ```
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Appends a header. Repeated names keep their insertion order.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }

    /// Consumes the request and hands over the body.
    pub fn into_body(self) -> Bytes { self.body }

    /// Case-insensitive header lookup. Returns the first value.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header_values(name).next()
    }

    /// Every value of a header, in the order received.
    pub fn header_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.headers.iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
