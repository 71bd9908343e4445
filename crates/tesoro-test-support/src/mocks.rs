//! Scripted transports implementing the list, detail and mutation seams.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tesoro_api_models::{ListParams, ResourceKind};
use tesoro_ui::core::error::UiError;
use tesoro_ui::features::details::key::DetailKey;
use tesoro_ui::features::lists::transport::{DetailFetcher, ListFetcher, RecordMutator};

/// One recorded list request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchCall {
    /// Resource requested.
    pub resource: ResourceKind,
    /// Parameters sent.
    pub params: ListParams,
}

/// [`ListFetcher`] and [`DetailFetcher`] replaying one queue of responses in call order.
///
/// An exhausted script answers with a network error so tests fail loudly.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    responses: Rc<RefCell<VecDeque<Result<Value, UiError>>>>,
    calls: Rc<RefCell<Vec<FetchCall>>>,
    detail_calls: Rc<RefCell<Vec<DetailKey>>>,
}

impl ScriptedFetcher {
    /// Empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful envelope.
    #[must_use]
    pub fn then_ok(self, body: Value) -> Self {
        self.responses.borrow_mut().push_back(Ok(body));
        self
    }

    /// Queue a failure.
    #[must_use]
    pub fn then_err(self, error: UiError) -> Self {
        self.responses.borrow_mut().push_back(Err(error));
        self
    }

    /// Requests made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.borrow().clone()
    }

    /// Detail keys requested so far.
    #[must_use]
    pub fn detail_calls(&self) -> Vec<DetailKey> {
        self.detail_calls.borrow().clone()
    }

    /// Responses not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

#[async_trait(?Send)]
impl ListFetcher for ScriptedFetcher {
    async fn fetch_list(
        &self,
        resource: ResourceKind,
        params: &ListParams,
    ) -> Result<Value, UiError> {
        self.calls.borrow_mut().push(FetchCall {
            resource,
            params: params.clone(),
        });
        self.next_response()
    }
}

#[async_trait(?Send)]
impl DetailFetcher for ScriptedFetcher {
    async fn fetch_detail(&self, key: &DetailKey) -> Result<Value, UiError> {
        key.request()?;
        self.detail_calls.borrow_mut().push(key.clone());
        self.next_response()
    }
}

impl ScriptedFetcher {
    fn next_response(&self) -> Result<Value, UiError> {
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(UiError::network("no scripted response")))
    }
}

/// One recorded mutation request.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationCall {
    /// Resource targeted.
    pub resource: ResourceKind,
    /// Record id.
    pub id: String,
    /// Partial update sent.
    pub patch: Map<String, Value>,
}

/// [`RecordMutator`] recording calls and answering from a queue, defaulting to success.
#[derive(Clone, Default)]
pub struct RecordingMutator {
    outcomes: Rc<RefCell<VecDeque<Result<Value, UiError>>>>,
    calls: Rc<RefCell<Vec<MutationCall>>>,
}

impl RecordingMutator {
    /// Mutator that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next mutation with `error`.
    #[must_use]
    pub fn then_err(self, error: UiError) -> Self {
        self.outcomes.borrow_mut().push_back(Err(error));
        self
    }

    /// Accept the next mutation.
    #[must_use]
    pub fn then_ok(self) -> Self {
        self.outcomes
            .borrow_mut()
            .push_back(Ok(json!({ "success": true })));
        self
    }

    /// Requests made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<MutationCall> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl RecordMutator for RecordingMutator {
    async fn mutate(
        &self,
        resource: ResourceKind,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<Value, UiError> {
        self.calls.borrow_mut().push(MutationCall {
            resource,
            id: id.to_string(),
            patch: patch.clone(),
        });
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "success": true })))
    }
}
