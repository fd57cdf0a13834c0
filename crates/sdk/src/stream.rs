use std::time::Duration;

use alloy::{
    eips::BlockId, primitives::Address, providers::Provider, rpc::types::Filter,
    sol_types::SolEventInterface,
};
use futures::{Stream, stream};

use crate::{error::RbankError, types};

pub type ContractEvent<E> = types::EventContext<E>;
pub type ContractBlockEvents<E> = types::BlockEvents<ContractEvent<E>>;

/// Returns stream of events emitted by the contract at `address`, decoded
/// into the contract's event enum `E` and batched per block, starting from
/// the specified block.
///
/// Polls logs via the given [`Provider`] to produce strictly continuous
/// event sequence, waiting for the next block with [`Provider`]-configured
/// interval.
///
/// Each block is yielded once, including blocks without events. Errors other
/// than a not yet produced block are yielded as is, and the same block is
/// retried on the next poll.
///
/// # Example
///
/// ```ignore
/// use rbank_sdk::{abi::Market::MarketEvents, stream};
///
/// let mut events = pin!(stream::events::<MarketEvents, _, _, _>(
///     provider,
///     market_address,
///     from_block,
///     tokio::time::sleep,
/// ));
/// while let Some(Ok(block)) = events.next().await {
///     for event in block.events() {
///         if let MarketEvents::Supply(supply) = event.event() {
///             println!("#{} {} supplied {}", block.instant().block_number(), supply.user, supply.amount);
///         }
///     }
/// }
/// ```
pub fn events<E, P, S, SFut>(
    provider: P,
    address: Address,
    from_block: u64,
    sleep: S,
) -> impl Stream<Item = Result<ContractBlockEvents<E>, RbankError>>
where
    E: SolEventInterface,
    P: Provider,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    stream::unfold((provider, from_block), move |(provider, mut block_num)| async move {
        let filter = Filter::new().address(address).from_block(block_num).to_block(block_num);
        loop {
            // Logs of an empty range look the same as logs of a quiet block,
            // the block header decides whether `block_num` is mined
            let result = futures::try_join!(
                provider.get_block(BlockId::number(block_num)).into_future(),
                provider.get_logs(&filter)
            )
            .map_err(RbankError::from)
            .and_then(|(block, logs)| {
                let header = block.ok_or(RbankError::BlockNotAvailable(block_num))?.header;
                let mut events = Vec::with_capacity(logs.len());
                for log in &logs {
                    events.push(ContractEvent::new(
                        log.transaction_hash.unwrap_or_default(),
                        log.transaction_index.unwrap_or_default(),
                        log.log_index.unwrap_or_default(),
                        E::decode_log(&log.inner).map_err(RbankError::from)?.data,
                    ));
                }
                Ok(ContractBlockEvents::new(
                    types::StateInstant::new(block_num, header.timestamp),
                    events,
                ))
            });
            if result.is_ok() {
                tracing::trace!(%address, block_num, "block events");
                block_num += 1;
                return Some((result, (provider, block_num)));
            }
            if matches!(result, Err(RbankError::BlockNotAvailable(_))) {
                sleep(provider.client().poll_interval()).await;
                continue;
            }
            return Some((result, (provider, block_num)));
        }
    })
}
