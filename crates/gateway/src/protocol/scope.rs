//! Connection scope handling.
//!
//! A [`Scope`] is the description of one inbound connection that the gateway
//! hands over before any message is exchanged. It never changes for the
//! lifetime of the connection it describes.

use bytes::Bytes;

use crate::protocol::Headers;

/// Host and port of the server that accepted the connection.
///
/// The port is absent for unix domain sockets.
pub type ServerAddr = (String, Option<u16>);

/// Host and port of the remote peer of the connection.
pub type ClientAddr = (String, u16);

/// The transport-supplied description of one inbound connection.
///
/// Only `type` is mandatory; every other field may be absent, in which case
/// accessors report `None` instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    scope_type: String,
    path: Option<String>,
    method: Option<String>,
    headers: Option<Headers>,
    scheme: Option<String>,
    server: Option<ServerAddr>,
    client: Option<ClientAddr>,
    root_path: Option<String>,
    query_string: Option<Bytes>,
}

impl Scope {
    /// Creates a scope declaring the given protocol `type` with every other field absent.
    pub fn new(scope_type: impl Into<String>) -> Self {
        Self { scope_type: scope_type.into(), ..Self::default() }
    }

    /// Shorthand for an `http` scope with method and path set.
    pub fn http(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new("http").method(method).path(path)
    }

    /// Shorthand for a `websocket` scope with path set.
    pub fn websocket(path: impl Into<String>) -> Self {
        Self::new("websocket").path(path)
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Appends one header byte-pair, keeping insertion order.
    pub fn header(mut self, name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        self.headers.get_or_insert_with(Vec::new).push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn server(mut self, host: impl Into<String>, port: Option<u16>) -> Self {
        self.server = Some((host.into(), port));
        self
    }

    pub fn client(mut self, host: impl Into<String>, port: u16) -> Self {
        self.client = Some((host.into(), port));
        self
    }

    pub fn root_path(mut self, root_path: impl Into<String>) -> Self {
        self.root_path = Some(root_path.into());
        self
    }

    pub fn query_string(mut self, query_string: impl Into<Bytes>) -> Self {
        self.query_string = Some(query_string.into());
        self
    }

    /// Returns the declared protocol, e.g. `http`.
    #[inline]
    pub fn scope_type(&self) -> &str {
        &self.scope_type
    }

    #[inline]
    pub fn get_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[inline]
    pub fn get_method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    #[inline]
    pub fn get_headers(&self) -> Option<&[(Bytes, Bytes)]> {
        self.headers.as_deref()
    }

    #[inline]
    pub fn get_scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    #[inline]
    pub fn get_server(&self) -> Option<&ServerAddr> {
        self.server.as_ref()
    }

    #[inline]
    pub fn get_client(&self) -> Option<&ClientAddr> {
        self.client.as_ref()
    }

    #[inline]
    pub fn get_root_path(&self) -> Option<&str> {
        self.root_path.as_deref()
    }

    #[inline]
    pub fn get_query_string(&self) -> Option<&[u8]> {
        self.query_string.as_deref()
    }

    /// Splits the URL information of this scope into its components.
    pub fn url(&self) -> Url<'_> {
        Url {
            scheme: self.get_scheme(),
            server: self.get_server(),
            root_path: self.get_root_path(),
            path: self.get_path(),
            query_string: self.get_query_string(),
        }
    }
}

/// The URL components of a scope, each absent when the scope omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Url<'a> {
    pub scheme: Option<&'a str>,
    pub server: Option<&'a ServerAddr>,
    pub root_path: Option<&'a str>,
    pub path: Option<&'a str>,
    pub query_string: Option<&'a [u8]>,
}

/// Named parameters captured from a path pattern such as `/post/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Gets the value of a path parameter by its name
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.params.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { params: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}
