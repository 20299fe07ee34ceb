use alloy_primitives::{Address, Log, U256};
use alloy_sol_types::{sol, SolEvent};
use eyre::Result;

use crate::error::OrderError;
use crate::ledger::OrderReceipt;

sol! {
    /// Emitted by the Wormhole core bridge for every published message
    #[derive(Debug)]
    event LogMessagePublished(
        address indexed sender,
        uint64 sequence,
        uint32 nonce,
        bytes payload,
        uint8 consistencyLevel
    );

    /// Emitted by the CCTP message transmitter when tokens are burned
    #[derive(Debug)]
    event MessageSent(bytes message);
}

/// Byte range of the nonce inside a CCTP message: version (4), source
/// domain (4), destination domain (4), nonce (8)
const CCTP_NONCE_RANGE: std::ops::Range<usize> = 12..20;

/// The three sequence numbers `placeFastMarketOrder` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSequences {
    /// Wormhole sequence of the slow-path message
    pub sequence: u64,
    /// Wormhole sequence of the fast market order message
    pub fast_sequence: u64,
    /// CCTP nonce of the token burn
    pub protocol_sequence: U256,
}

/// Recover the order's sequence numbers from its receipt logs.
///
/// The router publishes two Wormhole messages in order (slow path first,
/// then the fast market order) and burns through CCTP once.
pub fn extract_sequences(router: Address, receipt: &OrderReceipt) -> Result<OrderSequences> {
    let mut published = receipt.logs.iter().filter_map(|log| decode_published(router, log));

    let sequence = published.next().ok_or(OrderError::MissingOrderLog {
        tx_hash: receipt.tx_hash,
        event: "LogMessagePublished",
    })?;
    let fast_sequence = published.next().ok_or(OrderError::MissingOrderLog {
        tx_hash: receipt.tx_hash,
        event: "LogMessagePublished (fast)",
    })?;

    let protocol_sequence = receipt
        .logs
        .iter()
        .find_map(decode_cctp_nonce)
        .ok_or(OrderError::MissingOrderLog {
            tx_hash: receipt.tx_hash,
            event: "MessageSent",
        })?;

    Ok(OrderSequences {
        sequence,
        fast_sequence,
        protocol_sequence,
    })
}

fn decode_published(router: Address, log: &Log) -> Option<u64> {
    if log.topics().first() != Some(&LogMessagePublished::SIGNATURE_HASH) {
        return None;
    }
    let event = LogMessagePublished::decode_log_data(&log.data).ok()?;
    (event.sender == router).then_some(event.sequence)
}

fn decode_cctp_nonce(log: &Log) -> Option<U256> {
    if log.topics().first() != Some(&MessageSent::SIGNATURE_HASH) {
        return None;
    }
    let event = MessageSent::decode_log_data(&log.data).ok()?;
    let nonce = event.message.get(CCTP_NONCE_RANGE)?;
    Some(U256::from_be_slice(nonce))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy_primitives::{address, Bytes, B256};

    pub(crate) const ROUTER: Address = address!("0xe0418C44F06B0b0D7D1706E01706316DBB0B210E");
    const CORE_BRIDGE: Address = address!("0x6b9C8671cdDC8dEab9c719bB87cBd3e782bA6a35");
    const TRANSMITTER: Address = address!("0xaCF1ceeF35caAc005e15888dDb8A3515C41B4872");

    pub(crate) fn published_log(sender: Address, sequence: u64) -> Log {
        let event = LogMessagePublished {
            sender,
            sequence,
            nonce: 0,
            payload: Bytes::from_static(b"payload"),
            consistencyLevel: 200,
        };
        Log {
            address: CORE_BRIDGE,
            data: event.encode_log_data(),
        }
    }

    pub(crate) fn message_sent_log(nonce: u64) -> Log {
        let mut message = Vec::new();
        message.extend_from_slice(&0u32.to_be_bytes());
        message.extend_from_slice(&3u32.to_be_bytes());
        message.extend_from_slice(&2u32.to_be_bytes());
        message.extend_from_slice(&nonce.to_be_bytes());
        message.extend_from_slice(&[0xaa; 32]);
        let event = MessageSent {
            message: message.into(),
        };
        Log {
            address: TRANSMITTER,
            data: event.encode_log_data(),
        }
    }

    /// Logs in the order the router emits them
    pub(crate) fn order_logs(sequence: u64, fast_sequence: u64, nonce: u64) -> Vec<Log> {
        vec![
            message_sent_log(nonce),
            published_log(ROUTER, sequence),
            published_log(ROUTER, fast_sequence),
        ]
    }

    #[test]
    fn test_extract_sequences() {
        let receipt = OrderReceipt {
            tx_hash: B256::repeat_byte(1),
            logs: order_logs(41, 42, 77_031),
        };

        let sequences = extract_sequences(ROUTER, &receipt).unwrap();
        assert_eq!(sequences.sequence, 41);
        assert_eq!(sequences.fast_sequence, 42);
        assert_eq!(sequences.protocol_sequence, U256::from(77_031u64));
    }

    #[test]
    fn test_extract_ignores_other_senders() {
        let mut logs = vec![published_log(Address::repeat_byte(9), 1)];
        logs.extend(order_logs(5, 6, 7));
        let receipt = OrderReceipt {
            tx_hash: B256::ZERO,
            logs,
        };

        let sequences = extract_sequences(ROUTER, &receipt).unwrap();
        assert_eq!((sequences.sequence, sequences.fast_sequence), (5, 6));
    }

    #[test]
    fn test_missing_logs() {
        let tx_hash = B256::repeat_byte(2);
        let receipt = OrderReceipt {
            tx_hash,
            logs: vec![],
        };
        let err = extract_sequences(ROUTER, &receipt).unwrap_err();
        assert_eq!(
            err.downcast_ref::<OrderError>(),
            Some(&OrderError::MissingOrderLog {
                tx_hash,
                event: "LogMessagePublished"
            })
        );

        let receipt = OrderReceipt {
            tx_hash,
            logs: vec![published_log(ROUTER, 1), published_log(ROUTER, 2)],
        };
        let err = extract_sequences(ROUTER, &receipt).unwrap_err();
        assert_eq!(
            err.downcast_ref::<OrderError>(),
            Some(&OrderError::MissingOrderLog {
                tx_hash,
                event: "MessageSent"
            })
        );
    }
}
