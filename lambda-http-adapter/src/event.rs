use crate::error::AdapterError;

use aws_lambda_events::apigw::ApiGatewayV2httpRequest;
use backtrace::Backtrace;
use base64::Engine as _;

use std::borrow::Cow;
use std::collections::HashMap;

/// HTTP event received from the hosting runtime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncomingEvent {
  /// Raw request body, if any.
  pub body: Option<String>,
  /// Whether [`body`](IncomingEvent::body) is base64-encoded.
  pub is_base64_encoded: bool,
  /// Path parameters extracted by the API Gateway route (e.g., `{accountId}`).
  pub path_parameters: Option<HashMap<String, String>>,
  /// Query string parameters. Repeated keys are joined with `,`.
  pub query_string_parameters: Option<HashMap<String, String>>,
  /// Request context, indicating whether the request passed through a JWT authorizer.
  pub request_context: RequestContext,
}

impl IncomingEvent {
  /// Construct an unauthenticated event with no body or parameters.
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the raw (plain text) request body.
  pub fn with_body(mut self, body: impl Into<String>) -> Self {
    self.body = Some(body.into());
    self.is_base64_encoded = false;
    self
  }

  /// Set a base64-encoded request body.
  pub fn with_base64_body(mut self, body: impl Into<String>) -> Self {
    self.body = Some(body.into());
    self.is_base64_encoded = true;
    self
  }

  /// Add a path parameter.
  pub fn with_path_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self
      .path_parameters
      .get_or_insert_with(HashMap::new)
      .insert(name.into(), value.into());
    self
  }

  /// Add a query string parameter.
  pub fn with_query_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self
      .query_string_parameters
      .get_or_insert_with(HashMap::new)
      .insert(name.into(), value.into());
    self
  }

  /// Replace the request context.
  pub fn with_request_context(mut self, request_context: RequestContext) -> Self {
    self.request_context = request_context;
    self
  }

  /// Return the request body as text, decoding it first if it is base64-encoded.
  pub fn decoded_body(&self) -> Result<Option<Cow<'_, str>>, AdapterError> {
    let body = match self.body.as_deref() {
      Some(body) => body,
      None => return Ok(None),
    };

    if !self.is_base64_encoded {
      return Ok(Some(Cow::Borrowed(body)));
    }

    let bytes = base64::engine::general_purpose::STANDARD
      .decode(body)
      .map_err(|err| AdapterError::InvalidBodyBase64(Box::new(err), Backtrace::new()))?;
    String::from_utf8(bytes)
      .map(|body| Some(Cow::Owned(body)))
      .map_err(|err| AdapterError::InvalidBodyUtf8(Box::new(err), Backtrace::new()))
  }
}

/// Request context of an [`IncomingEvent`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestContext {
  /// The route has no authorizer, or uses one that doesn't produce JWT claims.
  #[default]
  Unauthenticated,
  /// The request was authorized by an API Gateway JWT authorizer.
  JwtAuthorized(JwtAuthorizer),
}

impl RequestContext {
  /// Construct a JWT-authorized context with the given claims and no scopes.
  pub fn jwt<I, K, V>(claims: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    Self::JwtAuthorized(JwtAuthorizer {
      claims: claims
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect(),
      scopes: Vec::new(),
    })
  }

  /// Whether the request carries authorizer data.
  pub fn has_authorizer(&self) -> bool {
    matches!(self, RequestContext::JwtAuthorized(_))
  }

  /// Authorizer data, if any.
  pub fn authorizer(&self) -> Option<&JwtAuthorizer> {
    match self {
      RequestContext::JwtAuthorized(authorizer) => Some(authorizer),
      RequestContext::Unauthenticated => None,
    }
  }
}

/// Output of an API Gateway JWT authorizer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JwtAuthorizer {
  /// Claims extracted from the validated token.
  pub claims: HashMap<String, String>,
  /// OAuth scopes granted to the token.
  pub scopes: Vec<String>,
}

impl JwtAuthorizer {
  /// Return the value of the named claim.
  pub fn claim(&self, name: &str) -> Option<&str> {
    self.claims.get(name).map(String::as_str)
  }
}

impl From<ApiGatewayV2httpRequest> for IncomingEvent {
  fn from(request: ApiGatewayV2httpRequest) -> Self {
    let request_context = match request
      .request_context
      .authorizer
      .and_then(|authorizer| authorizer.jwt)
    {
      Some(jwt) => RequestContext::JwtAuthorized(JwtAuthorizer {
        claims: jwt.claims,
        scopes: jwt.scopes.unwrap_or_default(),
      }),
      None => RequestContext::Unauthenticated,
    };

    // API Gateway v2 delivers repeated query keys as a single comma-separated value, but
    // `QueryMap` splits them back apart.
    let query_string_parameters = request.query_string_parameters.iter().fold(
      HashMap::<String, String>::new(),
      |mut params, (name, value)| {
        params
          .entry(name.to_string())
          .and_modify(|joined| {
            joined.push(',');
            joined.push_str(value);
          })
          .or_insert_with(|| value.to_string());
        params
      },
    );

    Self {
      body: request.body,
      is_base64_encoded: request.is_base64_encoded,
      path_parameters: Some(request.path_parameters).filter(|params| !params.is_empty()),
      query_string_parameters: Some(query_string_parameters).filter(|params| !params.is_empty()),
      request_context,
    }
  }
}
