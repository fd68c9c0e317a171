//! Request handlers for sync endpoints.
//!
//! Handlers are synchronous and transport-agnostic: the HTTP layer calls
//! them on a blocking thread, tests and the loopback transport call them
//! directly.

use crate::auth::TokenValidator;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use serde_json::Value;
use std::sync::Arc;
use tillsync_model::EntityClass;
use tillsync_store::{MergeOutcome, ModelRegistry, Store};
use tillsync_sync_protocol::{
    PingResponse, PullRequest, PullResponse, PushPayload, PushResponse, RecordError,
    StatusResponse,
};
use tracing::{info, warn};

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Cloud store (shared across all handlers).
    pub store: Arc<Store>,
    /// Models the server accepts.
    pub registry: ModelRegistry,
    validator: TokenValidator,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: ServerConfig, store: Arc<Store>, registry: ModelRegistry) -> Self {
        let validator = TokenValidator::new(config.token.as_deref());
        Self {
            config,
            store,
            registry,
            validator,
        }
    }
}

/// Handler for sync requests.
#[derive(Clone)]
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Returns the handler context.
    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Checks the token carried by `X-Edge-Token` or `Authorization`.
    pub fn authorize(
        &self,
        edge_token: Option<&str>,
        authorization: Option<&str>,
    ) -> ServerResult<()> {
        self.context
            .validator
            .validate_headers(edge_token, authorization)
    }

    /// Applies a pushed batch.
    ///
    /// Every record is upserted by `external_id` in its own savepoint; a
    /// bad record is reported in `errors` and the rest of the batch still
    /// commits, once, at the end.
    pub fn handle_push(&self, payload: PushPayload) -> ServerResult<PushResponse> {
        let request = payload.into_request();
        let name = request.model.trim();
        if name.is_empty() {
            return Err(ServerError::InvalidRequest("model is required".into()));
        }
        let model = self
            .context
            .registry
            .get(name)
            .ok_or_else(|| ServerError::UnknownModel(name.to_string()))?;
        if model.class() == EntityClass::Reference {
            return Err(ServerError::InvalidRequest(format!(
                "{name} is reference data and cannot be pushed"
            )));
        }
        let max = self.context.config.max_push_records;
        if request.records.len() > max {
            return Err(ServerError::InvalidRequest(format!(
                "too many records: {} > {max}",
                request.records.len()
            )));
        }

        let at = tillsync_codec::now();
        let (created, updated, errors) = self.context.store.transaction(|txn| {
            let mut created = 0u32;
            let mut updated = 0u32;
            let mut errors = Vec::new();

            for record in &request.records {
                let external_id = record
                    .get("external_id")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string);
                if external_id.is_none() {
                    errors.push(RecordError::new(None, "missing external_id"));
                    continue;
                }

                match txn.savepoint(|txn| model.merge(txn, record, at)) {
                    Ok(MergeOutcome::Created) => created += 1,
                    Ok(MergeOutcome::Updated) => updated += 1,
                    Err(err) if err.is_record_error() || err.is_constraint_violation() => {
                        warn!(
                            model = name,
                            external_id = external_id.as_deref().unwrap_or("-"),
                            error = %err,
                            "push record rejected"
                        );
                        errors.push(RecordError::new(external_id, err.to_string()));
                    }
                    Err(err) => return Err(err),
                }
            }
            Ok((created, updated, errors))
        })?;

        info!(
            model = name,
            created,
            updated,
            errors = errors.len(),
            "sync push applied"
        );
        Ok(PushResponse::success(name, created, updated, errors))
    }

    /// Returns records of a model updated strictly after `since`.
    pub fn handle_pull(&self, request: &PullRequest) -> ServerResult<PullResponse> {
        let name = request.model.trim();
        if name.is_empty() {
            return Err(ServerError::InvalidRequest("model parameter required".into()));
        }
        let model = self
            .context
            .registry
            .get(name)
            .ok_or_else(|| ServerError::UnknownModel(name.to_string()))?;

        let timestamp = tillsync_codec::now();
        let limit = self.context.config.max_pull_records;
        let records = self
            .context
            .store
            .transaction(|txn| model.export_since(txn, request.since, limit))?;

        info!(model = name, count = records.len(), "sync pull served");
        Ok(PullResponse::new(name, records, timestamp))
    }

    /// Answers an authorized ping.
    pub fn handle_ping(&self) -> PingResponse {
        PingResponse::ok()
    }

    /// Lists the registered models. Needs no token.
    pub fn handle_status(&self) -> StatusResponse {
        StatusResponse {
            success: true,
            timestamp: tillsync_codec::now(),
            models_available: self
                .context
                .registry
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
