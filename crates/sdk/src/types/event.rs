use alloy::primitives::TxHash;

/// Instant in chain history the events are up to date with.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct StateInstant {
    block_number: u64,
    block_timestamp: u64,
}

impl StateInstant {
    pub fn new(block_number: u64, block_timestamp: u64) -> Self {
        Self { block_number, block_timestamp }
    }

    pub fn block_number(&self) -> u64 { self.block_number }

    pub fn block_timestamp(&self) -> u64 { self.block_timestamp }
}

/// Event along with the location it was emitted at.
#[derive(Clone, Debug)]
pub struct EventContext<E> {
    tx_hash: TxHash,
    tx_index: u64,
    log_index: u64,
    event: E,
}

impl<E> EventContext<E> {
    pub fn new(tx_hash: TxHash, tx_index: u64, log_index: u64, event: E) -> Self {
        Self { tx_hash, tx_index, log_index, event }
    }

    pub fn tx_hash(&self) -> TxHash { self.tx_hash }

    pub fn tx_index(&self) -> u64 { self.tx_index }

    pub fn log_index(&self) -> u64 { self.log_index }

    pub fn event(&self) -> &E { &self.event }
}

/// Events emitted within a single block, in log order.
#[derive(Clone, Debug)]
pub struct BlockEvents<E> {
    instant: StateInstant,
    events: Vec<E>,
}

impl<E> BlockEvents<E> {
    pub fn new(instant: StateInstant, events: Vec<E>) -> Self { Self { instant, events } }

    pub fn instant(&self) -> StateInstant { self.instant }

    pub fn events(&self) -> &[E] { &self.events }

    pub fn into_events(self) -> Vec<E> { self.events }
}
