use crate::core::error::BlockchainError;

pub trait SnapshotProvider {
    // Check if we have a snapshot already set
    fn has_snapshot(&self) -> Result<bool, BlockchainError>;

    // Start a snapshot
    // Every write until the end of the snapshot stays pending
    fn start_snapshot(&mut self) -> Result<(), BlockchainError>;

    // Apply the pending writes to the storage, or drop them
    fn end_snapshot(&mut self, apply: bool) -> Result<(), BlockchainError>;
}
