use rmcp::serde_json::json;
use rmcp::{
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    schemars::{self, JsonSchema},
    tool, Error as McpError, ServerHandler,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::RagConfig;
use crate::domain::document::{DocumentFormat, SearchQuery};
use crate::domain::document_service::DocumentService;
use crate::domain::error::RagError;

const INITIALIZING_MESSAGE: &str = "The document service is still initializing. Please try again shortly.";

/// Shared slot the background initializer fills once the service is ready.
pub type DocumentServiceState = Arc<Mutex<Option<Arc<dyn DocumentService>>>>;

/// Handler for the MCP server logic.
#[derive(Clone)]
pub struct RagServerHandler {
    pub document_service_state: DocumentServiceState,
    pub config: Arc<RagConfig>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IngestDocumentArgs {
    #[schemars(description = "Path of a .pdf, .docx, .doc or .txt file readable by the server")]
    pub path: String,
    #[schemars(description = "Optional document identity; defaults to the file name of `path`")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryDocumentsArgs {
    #[schemars(description = "Natural language query")]
    pub query: String,
    #[schemars(description = "Maximum number of results (default 5); zero or less returns every document")]
    pub top_k: Option<i64>,
}

fn error_result(error: &RagError) -> CallToolResult {
    let body = json!({ "kind": error.kind(), "message": error.to_string() });
    CallToolResult::error(vec![Content::text(body.to_string())])
}

fn json_result(value: serde_json::Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(value.to_string())])
}

/// `top_k` as received on the wire; anything not positive means "all" (0).
pub fn normalize_top_k(top_k: Option<i64>) -> Option<usize> {
    top_k.map(|k| usize::try_from(k).unwrap_or(0))
}

#[tool(tool_box)]
impl RagServerHandler {
    /// Creates a new handler instance with uninitialized service state.
    pub fn new(config: Arc<RagConfig>) -> Self {
        Self {
            document_service_state: Arc::new(Mutex::new(None)),
            config,
        }
    }

    fn current_service(&self) -> Option<Arc<dyn DocumentService>> {
        match self.document_service_state.lock() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    #[tool(description = "Extract, embed and store a PDF, DOCX, DOC or TXT document. Re-ingesting a name replaces it.")]
    async fn ingest_document(
        &self,
        #[tool(aggr)] args: IngestDocumentArgs,
    ) -> Result<CallToolResult, McpError> {
        let Some(service) = self.current_service() else {
            log::warn!("ingest_document called but the document service is not yet initialized.");
            return Ok(CallToolResult::error(vec![Content::text(INITIALIZING_MESSAGE)]));
        };

        let path = Path::new(&args.path);
        let identity = match args.name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| args.path.clone()),
        };
        log::info!("Executing ingest_document for '{}' from {:?}", identity, path);

        if let Err(e) = DocumentFormat::from_file_name(&identity) {
            log::warn!("Rejected '{}': {}", identity, e);
            return Ok(error_result(&e));
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let error = RagError::Extraction {
                    name: identity,
                    reason: format!("failed to read {}: {}", args.path, e),
                };
                log::error!("{}", error);
                return Ok(error_result(&error));
            }
        };

        match service.ingest_document(&identity, bytes).await {
            Ok(receipt) => Ok(json_result(json!({
                "status": "Document ingested successfully",
                "id": receipt.id,
                "characters": receipt.characters,
            }))),
            Err(e) => Ok(error_result(&e)),
        }
    }

    #[tool(description = "Semantic search over ingested documents, closest first.")]
    async fn query_documents(
        &self,
        #[tool(aggr)] args: QueryDocumentsArgs,
    ) -> Result<CallToolResult, McpError> {
        let Some(service) = self.current_service() else {
            log::warn!("query_documents called but the document service is not yet initialized.");
            return Ok(CallToolResult::error(vec![Content::text(INITIALIZING_MESSAGE)]));
        };

        let top_k = normalize_top_k(args.top_k).or(Some(self.config.query.default_top_k));
        log::info!("Executing query_documents with query: '{}', top_k: {:?}", args.query, top_k);

        match service.query_documents(SearchQuery { text: args.query, top_k }).await {
            Ok(results) => Ok(json_result(json!({ "results": results }))),
            Err(e) => {
                log::error!("Query failed: {}", e);
                Ok(error_result(&e))
            }
        }
    }

    #[tool(description = "Name, size, dimension and distance metric of the document collection.")]
    async fn collection_info(&self) -> Result<CallToolResult, McpError> {
        let Some(service) = self.current_service() else {
            return Ok(CallToolResult::error(vec![Content::text(INITIALIZING_MESSAGE)]));
        };

        match service.collection_stats().await {
            Ok(stats) => Ok(json_result(json!(stats))),
            Err(e) => Ok(error_result(&e)),
        }
    }
}

#[tool(tool_box)]
impl ServerHandler for RagServerHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Ingest PDF, DOCX, DOC and TXT documents and run semantic queries over them.".into(),
            ),
        }
    }
}
