use std::fmt::Debug;

use uuid::Uuid;

/// How an ambient unit of work ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    Committed,
    RolledBack,
}

/// An ambient unit of work a pooled resource can be enlisted in.
///
/// The pool tracks enlistment by handle id so this trait stays free of
/// pool-internal types. `enlist` and `delist` are notifications, not
/// requests: the transaction coordinator owns the actual semantics.
pub trait TransactionRef: Send + Sync + Debug {
    /// Stable identifier of the unit of work.
    fn id(&self) -> Uuid;

    /// The handle identified by `handle_id` started participating.
    fn enlist(&self, handle_id: Uuid);

    /// The handle identified by `handle_id` stopped participating
    /// before completion.
    fn delist(&self, handle_id: Uuid);
}
