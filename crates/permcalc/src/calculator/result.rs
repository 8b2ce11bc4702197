//! Attributed lookup results.
//!
//! A [`TristateResult`] pairs a [`Tristate`] with the processor that
//! produced it and an optional cause. Results are reference counted so the
//! hot path can hand out shared instances: there is exactly one undefined
//! result, and each [`ResultFactory`] pre-builds its true/false results.

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::processor::ProcessorKind;
use crate::tristate::Tristate;

static UNDEFINED: Lazy<TristateResult> = Lazy::new(|| {
    TristateResult(Arc::new(ResultInner {
        result: Tristate::Undefined,
        processor: None,
        cause: None,
    }))
});

#[derive(Debug, PartialEq, Eq)]
struct ResultInner {
    result: Tristate,
    processor: Option<ProcessorKind>,
    cause: Option<String>,
}

/// The outcome of a permission lookup, with provenance.
///
/// Invariant: an undefined result never carries a processor or cause.
#[derive(Clone, PartialEq, Eq)]
pub struct TristateResult(Arc<ResultInner>);

impl TristateResult {
    /// The shared undefined result.
    pub fn undefined() -> Self {
        UNDEFINED.clone()
    }

    /// Build a result. `Undefined` always returns the shared instance and
    /// discards `processor` and `cause`.
    pub fn of(result: Tristate, processor: Option<ProcessorKind>, cause: Option<String>) -> Self {
        if result == Tristate::Undefined {
            return Self::undefined();
        }
        TristateResult(Arc::new(ResultInner {
            result,
            processor,
            cause,
        }))
    }

    pub fn result(&self) -> Tristate {
        self.0.result
    }

    /// The processor that produced this result.
    pub fn processor(&self) -> Option<ProcessorKind> {
        self.0.processor
    }

    pub fn cause(&self) -> Option<&str> {
        self.0.cause.as_deref()
    }

    pub fn is_undefined(&self) -> bool {
        self.0.result == Tristate::Undefined
    }

    /// `true` when both handles are the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for TristateResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TristateResult")
            .field("result", &self.0.result)
            .field("processor", &self.0.processor)
            .field("cause", &self.0.cause)
            .finish()
    }
}

impl std::fmt::Display for TristateResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.result)?;
        if let Some(kind) = self.0.processor {
            write!(f, " [{kind}]")?;
        }
        if let Some(cause) = &self.0.cause {
            write!(f, " ({cause})")?;
        }
        Ok(())
    }
}

/// Pre-built results for one processor kind.
#[derive(Debug, Clone)]
pub struct ResultFactory {
    processor: ProcessorKind,
    true_result: TristateResult,
    false_result: TristateResult,
}

impl ResultFactory {
    pub fn new(processor: ProcessorKind) -> Self {
        Self {
            processor,
            true_result: TristateResult::of(Tristate::True, Some(processor), None),
            false_result: TristateResult::of(Tristate::False, Some(processor), None),
        }
    }

    pub fn processor(&self) -> ProcessorKind {
        self.processor
    }

    /// The cached result for `result`.
    pub fn result(&self, result: Tristate) -> TristateResult {
        match result {
            Tristate::True => self.true_result.clone(),
            Tristate::False => self.false_result.clone(),
            Tristate::Undefined => TristateResult::undefined(),
        }
    }

    /// A result with a cause attached. Without a cause this is the cached
    /// result and allocates nothing.
    pub fn result_with_cause(&self, result: Tristate, cause: Option<String>) -> TristateResult {
        match cause {
            None => self.result(result),
            Some(cause) => TristateResult::of(result, Some(self.processor), Some(cause)),
        }
    }
}
