mod dispatch;
mod reference;
mod storage;

pub use dispatch::IRecomputeDispatch;
pub use reference::IReferenceSource;
pub use storage::{IRecordStore, PageToken, RecordPage, WriteOp};
