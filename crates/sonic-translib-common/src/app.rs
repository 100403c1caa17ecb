//! Request model and the application handler trait.
//!
//! The request dispatcher owns the store and picks an [`AppHandler`] by
//! path prefix. Handlers are registered explicitly by whoever builds the
//! dispatcher; there is no implicit discovery.

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::db::ConfigDb;
use crate::error::{TranslibError, TranslibResult};

/// Operation requested on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Create new resources (POST).
    Create,
    /// Replace a resource (PUT).
    Replace,
    /// Merge into a resource (PATCH).
    Update,
    /// Delete a resource (DELETE).
    Delete,
    /// Read a resource (GET).
    Get,
    /// Subscribe to changes.
    Subscribe,
}

impl OpKind {
    /// All operation kinds.
    pub const ALL: [OpKind; 6] = [
        OpKind::Create,
        OpKind::Replace,
        OpKind::Update,
        OpKind::Delete,
        OpKind::Get,
        OpKind::Subscribe,
    ];

    /// Returns the operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Create => "create",
            OpKind::Replace => "replace",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
            OpKind::Get => "get",
            OpKind::Subscribe => "subscribe",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpKind {
    type Err = TranslibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "create" | "post" => OpKind::Create,
            "replace" | "put" => OpKind::Replace,
            "update" | "patch" => OpKind::Update,
            "delete" => OpKind::Delete,
            "get" | "read" => OpKind::Get,
            "subscribe" => OpKind::Subscribe,
            other => {
                return Err(TranslibError::invalid_args(format!(
                    "unknown operation '{}'",
                    other
                )))
            }
        })
    }
}

/// A request addressed to an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRequest {
    /// Concrete request path (e.g., `/vlan/10/member`).
    pub path: String,
    /// Requested operation.
    pub op: OpKind,
    /// Raw request body; empty for reads and deletes.
    pub payload: Vec<u8>,
}

impl AppRequest {
    /// Creates a request.
    pub fn new(path: impl Into<String>, op: OpKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            op,
            payload: payload.into(),
        }
    }

    /// Creates a request without a body.
    pub fn without_payload(path: impl Into<String>, op: OpKind) -> Self {
        Self::new(path, op, Vec::new())
    }
}

/// An application's answer, as a JSON value tree.
///
/// Serializing the tree to bytes is left to the dispatcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppResponse {
    /// Response body; `None` for writes.
    pub payload: Option<serde_json::Value>,
}

impl AppResponse {
    /// Creates an empty response.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a response carrying a body.
    pub fn with_payload(payload: serde_json::Value) -> Self {
        Self {
            payload: Some(payload),
        }
    }
}

/// A translib application serving one path prefix.
#[async_trait]
pub trait AppHandler: Send + Sync {
    /// Returns the application name (for logging).
    fn name(&self) -> &str;

    /// Returns the path prefix this application serves (e.g., `/vlan`).
    fn path_prefix(&self) -> &str;

    /// Returns the path templates this application understands.
    fn templates(&self) -> &[&str];

    /// Returns true if `path` falls under this application's prefix.
    fn handles(&self, path: &str) -> bool {
        let prefix = self.path_prefix();
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Processes one request against `db`.
    async fn process(&self, db: &dyn ConfigDb, request: &AppRequest)
        -> TranslibResult<AppResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoApp;

    #[async_trait]
    impl AppHandler for EchoApp {
        fn name(&self) -> &str {
            "echo"
        }

        fn path_prefix(&self) -> &str {
            "/echo"
        }

        fn templates(&self) -> &[&str] {
            &["/echo"]
        }

        async fn process(
            &self,
            _db: &dyn ConfigDb,
            request: &AppRequest,
        ) -> TranslibResult<AppResponse> {
            Ok(AppResponse::with_payload(serde_json::json!(request.path)))
        }
    }

    #[test]
    fn test_op_kind_from_str() {
        assert_eq!("create".parse::<OpKind>().unwrap(), OpKind::Create);
        assert_eq!("PUT".parse::<OpKind>().unwrap(), OpKind::Replace);
        assert_eq!("patch".parse::<OpKind>().unwrap(), OpKind::Update);
        assert_eq!("get".parse::<OpKind>().unwrap(), OpKind::Get);
        assert!("frobnicate".parse::<OpKind>().is_err());
    }

    #[test]
    fn test_op_kind_display_round_trips() {
        for op in OpKind::ALL {
            assert_eq!(op.to_string().parse::<OpKind>().unwrap(), op);
        }
    }

    #[test]
    fn test_handles_prefix() {
        let app = EchoApp;
        assert!(app.handles("/echo"));
        assert!(app.handles("/echo/1"));
        assert!(!app.handles("/echoes"));
        assert!(!app.handles("/vlan"));
    }

    #[tokio::test]
    async fn test_process_through_trait_object() {
        let app: Box<dyn AppHandler> = Box::new(EchoApp);
        let db = crate::MemoryDb::new();
        let response = app
            .process(&db, &AppRequest::without_payload("/echo", OpKind::Get))
            .await
            .unwrap();
        assert_eq!(response.payload, Some(serde_json::json!("/echo")));
        assert_eq!(app.name(), "echo");
    }
}
