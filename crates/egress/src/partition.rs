//! Deterministic order-id partition routing.

use common::OrderId;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the little-endian bytes of the order id.
///
/// Content-based so the mapping survives process restarts; the standard
/// library's default hasher makes no cross-release stability promise and is
/// therefore unsuitable here.
fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Maps order ids onto the partitions of a destination stream.
///
/// Every event for one order maps to the same partition, which is what gives
/// downstream consumers in-order delivery per order id.
#[derive(Debug, Clone, Copy)]
pub struct Partitioner {
    partitions: u32,
}

impl Partitioner {
    /// Creates a partitioner for a stream with the given partition count.
    ///
    /// The count comes from static stream configuration and must be at
    /// least 1.
    pub fn new(partitions: u32) -> Self {
        assert!(partitions > 0, "partition count must be at least 1");
        Self { partitions }
    }

    /// Returns the number of partitions routed over.
    pub fn partitions(&self) -> u32 {
        self.partitions
    }

    /// Computes the partition for an order id.
    pub fn partition_for(&self, order_id: OrderId) -> i32 {
        let hash = fnv1a64(&order_id.value().to_le_bytes());
        (hash % u64::from(self.partitions)) as i32
    }
}
