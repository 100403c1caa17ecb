//! VlanApp - translib handler for the `/vlan` path family

use async_trait::async_trait;
use tracing::{debug, instrument};

use sonic_translib_common::{
    AppHandler, AppRequest, AppResponse, ConfigDb, PathInfo, TranslibError, TranslibResult,
};

use crate::router::{dispatch, VLAN_LIST_PATH, VLAN_TEMPLATES};

/// VlanApp serves VLAN and VLAN membership requests
///
/// Request flow:
/// 1. Concrete path → template + variables
/// 2. (template, operation) → reader/writer action
/// 3. Action → CONFIG_DB `VLAN` / `VLAN_MEMBER` operations
#[derive(Debug, Default, Clone, Copy)]
pub struct VlanApp;

impl VlanApp {
    /// Creates a new VlanApp instance
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AppHandler for VlanApp {
    fn name(&self) -> &str {
        "vlanapp"
    }

    fn path_prefix(&self) -> &str {
        VLAN_LIST_PATH
    }

    fn templates(&self) -> &[&str] {
        VLAN_TEMPLATES
    }

    #[instrument(skip(self, db, request), fields(path = %request.path, op = %request.op))]
    async fn process(
        &self,
        db: &dyn ConfigDb,
        request: &AppRequest,
    ) -> TranslibResult<AppResponse> {
        let path = PathInfo::match_path(&request.path, self.templates()).ok_or_else(|| {
            TranslibError::unsupported(format!("no handler for path '{}'", request.path))
        })?;
        debug!("Matched template {}", path.template);

        dispatch(db, &path, request.op, &request.payload).await
    }
}
