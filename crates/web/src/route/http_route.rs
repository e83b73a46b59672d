use std::collections::HashMap;
use std::fmt;

use http::{Method, StatusCode};
use micro_gateway::connection::{Connection, HttpConnection};
use micro_gateway::response::BodyResponse;

use crate::endpoint::{HttpEndpoint, MethodNotAllowed};
use crate::route::{RouteError, send_terminal_response};

const METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
    Method::PATCH,
];

/// An HTTP route dispatching on the request method.
///
/// Every standard method answers `405 Method Not Allowed` until an endpoint is
/// set for it.
///
/// # Example
///
/// ```
/// use micro_web::endpoint::MethodNotAllowed;
/// use micro_web::route::HttpRoute;
///
/// let route = HttpRoute::new("/create").post(MethodNotAllowed);
/// assert_eq!(route.path(), "/create");
/// ```
pub struct HttpRoute {
    path: String,
    endpoints: HashMap<Method, Box<dyn HttpEndpoint>>,
}

macro_rules! method_endpoint {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Sets the endpoint of `", stringify!($method), "` requests.")]
        pub fn $name<E: HttpEndpoint + 'static>(self, endpoint: E) -> Self {
            self.endpoint(Method::$method, endpoint)
        }
    };
}

impl HttpRoute {
    pub fn new(path: impl Into<String>) -> Self {
        let endpoints = METHODS
            .into_iter()
            .map(|method| (method, Box::new(MethodNotAllowed) as Box<dyn HttpEndpoint>))
            .collect();

        Self { path: path.into(), endpoints }
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sets the endpoint of any method, including extension methods.
    pub fn endpoint<E: HttpEndpoint + 'static>(mut self, method: Method, endpoint: E) -> Self {
        self.endpoints.insert(method, Box::new(endpoint));
        self
    }

    method_endpoint!(get, GET);
    method_endpoint!(head, HEAD);
    method_endpoint!(post, POST);
    method_endpoint!(put, PUT);
    method_endpoint!(delete, DELETE);
    method_endpoint!(connect, CONNECT);
    method_endpoint!(options, OPTIONS);
    method_endpoint!(trace, TRACE);
    method_endpoint!(patch, PATCH);

    /// Resolves the endpoint of a method name, ignoring its case.
    pub fn get_endpoint(&self, name: &str) -> Result<&dyn HttpEndpoint, RouteError> {
        Method::from_bytes(name.to_ascii_uppercase().as_bytes())
            .ok()
            .and_then(|method| self.endpoints.get(&method))
            .map(|endpoint| endpoint.as_ref())
            .ok_or_else(|| RouteError::endpoint_not_found(name.to_ascii_lowercase()))
    }

    /// Receives the request and hands it to the endpoint of the connection method.
    ///
    /// An unknown method is answered with `501 Not Implemented`, a failure to
    /// receive the request or of the endpoint with `500 Internal Server Error`.
    /// The failure is returned afterwards either way.
    pub async fn call(&self, connection: &mut HttpConnection) -> Result<(), RouteError> {
        let method = connection.method().unwrap_or_default().to_owned();
        let endpoint = match self.get_endpoint(&method) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                send_terminal_response(connection, BodyResponse::new(StatusCode::NOT_IMPLEMENTED, "Not Implemented")).await;
                return Err(e);
            }
        };

        let result = match connection.receive_request().await {
            Ok(request) => endpoint.call(connection, request).await.map_err(RouteError::endpoint),
            Err(e) => Err(e.into()),
        };

        if result.is_err() {
            let response = BodyResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            send_terminal_response(connection, response).await;
        }
        result
    }
}

impl fmt::Debug for HttpRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRoute").field("path", &self.path).field("methods", &self.endpoints.keys()).finish()
    }
}
