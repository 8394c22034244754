//! topic0 catalog for event identification, covering the common ERC-20 /
//! ERC-721 / ERC-1155 events.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde_json::json;

#[derive(Debug, Clone, Copy)]
pub struct EventSignature {
    pub name: &'static str,
    pub decode: fn(topics: &[String], data: &str) -> serde_json::Value,
}

lazy_static! {
    static ref EVENT_SIGNATURES: HashMap<&'static str, EventSignature> = {
        let mut m = HashMap::new();
        m.insert(
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
            EventSignature { name: "Transfer", decode: decode_erc20_transfer },
        );
        m.insert(
            "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925",
            EventSignature { name: "Approval", decode: decode_erc20_approval },
        );
        m.insert(
            "0xc3d58168c5ae7397731d063d5bbf3d657854427343f4c083240f7aacaa2d0f62",
            EventSignature { name: "TransferSingle", decode: decode_transfer_single },
        );
        m.insert(
            "0x4a39dc06d4c0dbc64b70af90fd698a233a518aa5d07e595d983b8c0526c8f7fb",
            EventSignature { name: "TransferBatch", decode: decode_transfer_batch },
        );
        m
    };
}

/// Identifies an event by its first topic (topic0), producing structured
/// `decoded_data` when the signature is known.
///
/// For `Transfer`, 32-byte-padded topics are stripped to the trailing
/// 20-byte address the way indexed `address` parameters are ABI-encoded.
pub fn identify_event(topics: &[String], data: &str) -> Option<(EventSignature, serde_json::Value)> {
    let topic0 = topics.first()?.to_lowercase();
    let sig = EVENT_SIGNATURES.get(topic0.as_str())?;
    Some((*sig, (sig.decode)(topics, data)))
}

fn strip_topic_to_address(topic: &str) -> String {
    let body = topic.strip_prefix("0x").unwrap_or(topic);
    if body.len() < 40 {
        return format!("0x{body}");
    }
    format!("0x{}", &body[body.len() - 40..])
}

fn decode_erc20_transfer(topics: &[String], data: &str) -> serde_json::Value {
    json!({
        "from": topics.get(1).map(|t| strip_topic_to_address(t)),
        "to": topics.get(2).map(|t| strip_topic_to_address(t)),
        "value": data,
    })
}

fn decode_erc20_approval(topics: &[String], data: &str) -> serde_json::Value {
    json!({
        "owner": topics.get(1).map(|t| strip_topic_to_address(t)),
        "spender": topics.get(2).map(|t| strip_topic_to_address(t)),
        "value": data,
    })
}

fn decode_transfer_single(topics: &[String], data: &str) -> serde_json::Value {
    json!({
        "operator": topics.get(1).map(|t| strip_topic_to_address(t)),
        "from": topics.get(2).map(|t| strip_topic_to_address(t)),
        "to": topics.get(3).map(|t| strip_topic_to_address(t)),
        "id_and_value": data,
    })
}

fn decode_transfer_batch(topics: &[String], data: &str) -> serde_json::Value {
    json!({
        "operator": topics.get(1).map(|t| strip_topic_to_address(t)),
        "from": topics.get(2).map(|t| strip_topic_to_address(t)),
        "to": topics.get(3).map(|t| strip_topic_to_address(t)),
        "ids_and_values": data,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn identifies_erc20_transfer_by_topic0() {
        let topics = vec![
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef".to_owned(),
            "0x000000000000000000000000aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_owned(),
            "0x000000000000000000000000bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_owned(),
        ];
        let (sig, decoded) = identify_event(&topics, "0x01").unwrap();
        assert_eq!(sig.name, "Transfer");
        assert_eq!(decoded["from"], "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(decoded["to"], "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
    }

    #[test]
    fn unknown_topic0_yields_none() {
        assert!(identify_event(&["0xdeadbeef".to_owned()], "0x").is_none());
    }
}
