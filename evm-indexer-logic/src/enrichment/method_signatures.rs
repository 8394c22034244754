//! 4-byte selector catalog for method identification. A static lookup table
//! in the teacher's `lazy_static!` idiom (normally used for metrics)
//! applied to a signature table instead.

use std::collections::HashMap;

use lazy_static::lazy_static;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodType {
    TransferEth,
    Transfer,
    Approve,
    Mint,
    Burn,
    Swap,
    Deploy,
    Setter,
    Getter,
    Custom,
    Unknown,
}

impl MethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodType::TransferEth => "transferETH",
            MethodType::Transfer => "transfer",
            MethodType::Approve => "approve",
            MethodType::Mint => "mint",
            MethodType::Burn => "burn",
            MethodType::Swap => "swap",
            MethodType::Deploy => "deploy",
            MethodType::Setter => "setter",
            MethodType::Getter => "getter",
            MethodType::Custom => "custom",
            MethodType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MethodSignature {
    pub method_type: MethodType,
    pub name: &'static str,
}

lazy_static! {
    static ref METHOD_SIGNATURES: HashMap<&'static str, MethodSignature> = {
        let mut m = HashMap::new();
        m.insert("0xa9059cbb", MethodSignature { method_type: MethodType::Transfer, name: "transfer" });
        m.insert("0x23b872dd", MethodSignature { method_type: MethodType::Transfer, name: "transferFrom" });
        m.insert("0x095ea7b3", MethodSignature { method_type: MethodType::Approve, name: "approve" });
        m.insert("0xa22cb465", MethodSignature { method_type: MethodType::Approve, name: "setApprovalForAll" });
        m.insert("0x40c10f19", MethodSignature { method_type: MethodType::Mint, name: "mint" });
        m.insert("0x449a52f8", MethodSignature { method_type: MethodType::Mint, name: "mintTo" });
        m.insert("0x42966c68", MethodSignature { method_type: MethodType::Burn, name: "burn" });
        m.insert("0x9dc29fac", MethodSignature { method_type: MethodType::Burn, name: "burnFrom" });
        m.insert("0x38ed1739", MethodSignature { method_type: MethodType::Swap, name: "swapExactTokensForTokens" });
        m.insert("0x7ff36ab5", MethodSignature { method_type: MethodType::Swap, name: "swapExactETHForTokens" });
        m.insert("0x128acb08", MethodSignature { method_type: MethodType::Swap, name: "swap" });
        m.insert("0xf2fde38b", MethodSignature { method_type: MethodType::Setter, name: "transferOwnership" });
        m.insert("0x8da5cb5b", MethodSignature { method_type: MethodType::Getter, name: "owner" });
        m.insert("0x70a08231", MethodSignature { method_type: MethodType::Getter, name: "balanceOf" });
        m.insert("0x18160ddd", MethodSignature { method_type: MethodType::Getter, name: "totalSupply" });
        m.insert("0x06fdde03", MethodSignature { method_type: MethodType::Getter, name: "name" });
        m.insert("0x95d89b41", MethodSignature { method_type: MethodType::Getter, name: "symbol" });
        m
    };
}

/// Identifies a transaction's method from its input data's first 4 bytes.
/// `input` is a `0x`-prefixed hex string (as stored on `NodeTransaction`).
/// Empty input (`""` or `"0x"`) is a plain ETH value transfer. Input shorter
/// than a full selector but non-empty is too ambiguous to classify.
pub fn identify_method(input: &str) -> Option<MethodSignature> {
    let body = input.strip_prefix("0x").unwrap_or(input);
    if body.is_empty() {
        return Some(MethodSignature {
            method_type: MethodType::TransferEth,
            name: "transferETH",
        });
    }

    let selector = selector(input)?;
    match METHOD_SIGNATURES.get(selector.as_str()) {
        Some(sig) => Some(*sig),
        None if input.len() > 10 => Some(MethodSignature {
            method_type: MethodType::Custom,
            name: "custom",
        }),
        None => None,
    }
}

fn selector(input: &str) -> Option<String> {
    let body = input.strip_prefix("0x")?;
    if body.len() < 8 {
        return None;
    }
    Some(format!("0x{}", &body[..8].to_lowercase()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn identifies_erc20_transfer() {
        let sig = identify_method("0xa9059cbb000000000000000000000000").unwrap();
        assert_eq!(sig.name, "transfer");
        assert_eq!(sig.method_type, MethodType::Transfer);
    }

    #[test]
    fn plain_value_transfer_is_transfer_eth() {
        let sig = identify_method("0x").unwrap();
        assert_eq!(sig.method_type, MethodType::TransferEth);
        assert_eq!(sig.name, "transferETH");

        let sig = identify_method("").unwrap();
        assert_eq!(sig.method_type, MethodType::TransferEth);
    }

    #[test]
    fn unknown_selector_with_data_is_custom() {
        let sig = identify_method("0xdeadbeef0000").unwrap();
        assert_eq!(sig.method_type, MethodType::Custom);
    }
}
