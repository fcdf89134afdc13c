use std::fmt;

use crate::config::BackendKind;
use crate::error::{CursorError, Result};
use crate::traits::ResultHandle;
use crate::types::Row;

/// What a query runner hands to a cursor after executing a statement.
pub enum RawResult {
    /// A live result from a native driver bridge.
    Handle(Box<dyn ResultHandle>),
    /// Rows already pulled into memory by a bridge that cannot buffer.
    Rows(Vec<Row>),
}

impl fmt::Debug for RawResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawResult::Handle(_) => f.write_str("RawResult::Handle(..)"),
            RawResult::Rows(rows) => f.debug_tuple("RawResult::Rows").field(&rows.len()).finish(),
        }
    }
}

/// Positions and reads the raw result for one backend kind.
///
/// Native handles stream forward from wherever their own pointer is, so
/// reads only line up with the cursor position when every reposition goes
/// through `seek_to`. Array results are indexed directly.
#[derive(Debug)]
pub(crate) struct BackendAdapter {
    kind: BackendKind,
    result: Option<RawResult>,
}

impl BackendAdapter {
    pub(crate) fn new(kind: BackendKind) -> Self {
        Self { kind, result: None }
    }

    pub(crate) fn kind(&self) -> BackendKind {
        self.kind
    }

    pub(crate) fn result(&self) -> Option<&RawResult> {
        self.result.as_ref()
    }

    pub(crate) fn result_mut(&mut self) -> Option<&mut RawResult> {
        self.result.as_mut()
    }

    /// Takes ownership of a raw result, releasing any previous one.
    pub(crate) fn attach(&mut self, result: RawResult) -> Result<()> {
        match (&result, self.kind) {
            (RawResult::Rows(_), BackendKind::InMemoryArray) => {}
            (RawResult::Handle(_), kind) if kind != BackendKind::InMemoryArray => {}
            (RawResult::Rows(_), kind) => {
                return Err(CursorError::Configuration(format!(
                    "A row array was supplied for the {kind} backend, which expects a native result"
                )));
            }
            (RawResult::Handle(_), _) => {
                return Err(CursorError::Configuration(
                    "A native result was supplied for the array backend".to_string(),
                ));
            }
        }
        self.release();
        self.result = Some(result);
        Ok(())
    }

    pub(crate) fn fetch_row_at(&mut self, position: usize) -> Option<Row> {
        match self.result.as_mut()? {
            RawResult::Handle(handle) => handle.fetch_assoc(),
            RawResult::Rows(rows) => rows.get(position).cloned(),
        }
    }

    /// Repositions the native pointer. Returns false if the backend refused.
    pub(crate) fn seek_to(&mut self, row: usize) -> bool {
        match self.result.as_mut() {
            Some(RawResult::Handle(handle)) => handle.data_seek(row),
            Some(RawResult::Rows(_)) => true,
            None => false,
        }
    }

    /// Frees the attached result. Safe to call more than once; only the
    /// first call after an attach reaches the backend.
    pub(crate) fn release(&mut self) {
        let Some(result) = self.result.take() else {
            return;
        };
        if let RawResult::Handle(mut handle) = result {
            if self.kind.needs_release() {
                tracing::trace!(backend = %self.kind, "freeing native result");
                handle.free();
            }
        }
    }
}

impl Drop for BackendAdapter {
    fn drop(&mut self) {
        self.release();
    }
}
