use crate::error::{AdapterError, HandlerError};

use backtrace::Backtrace;
use serde_json::Value;

/// Parses the raw request body into a JSON value.
pub trait BodyParser: Send + Sync {
  /// Parse the (already base64-decoded) request body.
  ///
  /// Returning `Ok(None)` means the request has no body.
  fn parse(&self, body: Option<&str>) -> Result<Option<Value>, HandlerError>;
}

/// Default [`BodyParser`], which treats an empty body as absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonBodyParser;

impl BodyParser for JsonBodyParser {
  fn parse(&self, body: Option<&str>) -> Result<Option<Value>, HandlerError> {
    match body {
      None | Some("") => Ok(None),
      Some(body) => serde_json::from_str(body)
        .map(Some)
        .map_err(|err| AdapterError::InvalidBodyJson(Box::new(err), Backtrace::new()).into()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorCode;

  use pretty_assertions::assert_eq;
  use serde_json::json;

  #[test]
  fn test_parse() {
    assert_eq!(JsonBodyParser.parse(None).unwrap(), None);
    assert_eq!(JsonBodyParser.parse(Some("")).unwrap(), None);
    assert_eq!(
      JsonBodyParser.parse(Some(r#"{"id":1}"#)).unwrap(),
      Some(json!({ "id": 1 }))
    );
    assert_eq!(JsonBodyParser.parse(Some("null")).unwrap(), Some(Value::Null));
  }

  #[test]
  fn test_parse_malformed() {
    match JsonBodyParser.parse(Some("{\"id\":")) {
      Err(HandlerError::Application(err)) => assert_eq!(err.code, ErrorCode::InvalidBody),
      other => panic!("unexpected result: {other:?}"),
    }
  }
}
