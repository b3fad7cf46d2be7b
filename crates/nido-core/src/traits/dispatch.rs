use uuid::Uuid;

use crate::errors::NidoResult;

/// Outbound fire-and-forget recompute trigger.
///
/// The projector writes one dispatch per invalidated record after each
/// cache-removal batch commits. The transport (direct call, queue, event
/// bus) is the implementor's choice; a failed dispatch is logged and not
/// retried inline — the missing percentile cache remains the durable signal
/// that recompute is still owed.
pub trait IRecomputeDispatch: Send + Sync {
    fn dispatch(&self, record_id: Uuid) -> NidoResult<()>;
}
