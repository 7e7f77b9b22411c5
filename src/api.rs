//! Request handlers of the collocation endpoints.
//!
//! Routing is left to the embedding HTTP server. A handler takes the
//! corpus identifier from the path and the `w`, `pos` and `maxItems`
//! query arguments and produces a status code with a JSON body:
//!
//! | outcome | status |
//! |---|---|
//! | ranked candidates | 200 |
//! | invalid `maxItems` | 400 |
//! | unknown endpoint | 404 |
//! | missing or empty `w` | 422 |
//! | unknown corpus, storage failure, timeout | 500 |

use std::sync::Arc;
use std::time::Duration;

use log::{error, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::SyncollError;
use crate::query::{QueryEngine, Relation, Word};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_UNPROCESSABLE_ENTITY: u16 = 422;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

/// Query string arguments of a collocation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryArgs {
    pub w: Option<String>,
    pub pos: Option<String>,
    pub max_items: Option<String>,
}

impl QueryArgs {
    /// Collect the known arguments from decoded key/value pairs. Later
    /// values of a repeated key win.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut args = QueryArgs::default();
        for (key, value) in pairs {
            match key {
                "w" => args.w = Some(value.to_string()),
                "pos" => args.pos = Some(value.to_string()),
                "maxItems" => args.max_items = Some(value.to_string()),
                _ => {}
            }
        }
        args
    }

    fn word(&self) -> Word {
        Word::new(self.w.clone().unwrap_or_default()).with_pos(self.pos.clone().unwrap_or_default())
    }

    fn max_items(&self, default: usize) -> Result<usize, String> {
        match self.max_items.as_deref() {
            None | Some("") => Ok(default),
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| format!("invalid value for maxItems: {v}")),
        }
    }
}

/// Status code and JSON body of a handled request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        ApiResponse {
            status: STATUS_OK,
            body,
        }
    }

    pub fn error<S: Into<String>>(status: u16, msg: S) -> Self {
        ApiResponse {
            status,
            body: json!({ "error": msg.into() }),
        }
    }

    pub fn from_error(err: &SyncollError) -> Self {
        let status = match err {
            SyncollError::InvalidArgument(_) => STATUS_UNPROCESSABLE_ENTITY,
            _ => STATUS_INTERNAL_SERVER_ERROR,
        };
        if err.is_client_error() {
            warn!("request rejected: {err}");
        } else {
            error!("request failed: {err}");
        }
        ApiResponse::error(status, err.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Synchronous handlers around a shared [`QueryEngine`].
#[derive(Debug, Clone)]
pub struct Actions {
    engine: Arc<QueryEngine>,
}

impl Actions {
    pub fn new(engine: Arc<QueryEngine>) -> Self {
        Actions { engine }
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Handle one collocation request.
    pub fn collocations(&self, relation: Relation, corpus_id: &str, args: &QueryArgs) -> ApiResponse {
        let word = args.word();
        if !word.is_valid() {
            return ApiResponse::error(STATUS_UNPROCESSABLE_ENTITY, "invalid word value");
        }
        let max_items = match args.max_items(self.engine.query_conf().default_max_items) {
            Ok(v) => v,
            Err(msg) => return ApiResponse::error(STATUS_BAD_REQUEST, msg),
        };
        match self
            .engine
            .rank_candidates_default(corpus_id, &word, relation, max_items)
        {
            Ok(ans) => match serde_json::to_value(&ans) {
                Ok(body) => ApiResponse::ok(body),
                Err(err) => ApiResponse::from_error(&SyncollError::from(err)),
            },
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    /// Dispatch by endpoint name (`noun-modified-by`, `modifiers-of`,
    /// `verbs-subject`, `verbs-object`).
    pub fn dispatch(&self, endpoint: &str, corpus_id: &str, args: &QueryArgs) -> ApiResponse {
        match endpoint.parse::<Relation>() {
            Ok(relation) => self.collocations(relation, corpus_id, args),
            Err(_) => ApiResponse::error(STATUS_NOT_FOUND, format!("unknown action {endpoint}")),
        }
    }

    pub fn nouns_modified_by(&self, corpus_id: &str, args: &QueryArgs) -> ApiResponse {
        self.collocations(Relation::NounsModifiedBy, corpus_id, args)
    }

    pub fn modifiers_of(&self, corpus_id: &str, args: &QueryArgs) -> ApiResponse {
        self.collocations(Relation::ModifiersOf, corpus_id, args)
    }

    pub fn verbs_subject(&self, corpus_id: &str, args: &QueryArgs) -> ApiResponse {
        self.collocations(Relation::VerbsSubject, corpus_id, args)
    }

    pub fn verbs_object(&self, corpus_id: &str, args: &QueryArgs) -> ApiResponse {
        self.collocations(Relation::VerbsObject, corpus_id, args)
    }
}

/// Async front of [`Actions`]. Each request runs on the blocking pool and
/// is bounded by the request timeout; a late request is answered with a
/// server error and is not retried.
#[derive(Debug, Clone)]
pub struct CollocationService {
    actions: Arc<Actions>,
    timeout: Duration,
}

impl CollocationService {
    pub fn new(engine: Arc<QueryEngine>) -> Self {
        let timeout = engine.request_timeout();
        CollocationService {
            actions: Arc::new(Actions::new(engine)),
            timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn handle(&self, endpoint: &str, corpus_id: &str, args: QueryArgs) -> ApiResponse {
        let actions = Arc::clone(&self.actions);
        let endpoint = endpoint.to_string();
        let corpus_id = corpus_id.to_string();
        let task =
            tokio::task::spawn_blocking(move || actions.dispatch(&endpoint, &corpus_id, &args));
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(err)) => ApiResponse::from_error(&SyncollError::ThreadJoinError(err.to_string())),
            Err(_) => ApiResponse::from_error(&SyncollError::timeout(format!(
                "request not finished within {:?}",
                self.timeout
            ))),
        }
    }
}
