//! Payload codecs for the kinds that carry structured data.
//!
//! Code deploys and KV puts are RLP envelopes with a leading version byte, a
//! KV put additionally prefixed by a fixed magic so it can never be mistaken
//! for another payload.  System actions are JSON.

use alloy_rlp::{Decodable, RlpDecodable, RlpEncodable};
use parexec_primitives::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Envelope version accepted by both RLP codecs.
pub const PAYLOAD_VERSION: u8 = 1;

/// Magic prefix of an encoded KV put.
pub const KV_PUT_PREFIX: &[u8] = b"PXKV1";

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum PayloadError {
    #[error("empty payload")]
    Empty,

    #[error("malformed rlp: {0}")]
    Rlp(#[from] alloy_rlp::Error),

    #[error("trailing bytes after payload")]
    TrailingBytes,

    #[error("unsupported payload version {0}")]
    UnsupportedVersion(u8),

    #[error("ttl must be nonzero")]
    ZeroTtl,

    #[error("missing kv payload prefix")]
    MissingPrefix,

    #[error("namespace must not be blank")]
    BlankNamespace,

    #[error("malformed system action: {0}")]
    Json(String),

    #[error("system action is missing its action field")]
    MissingAction,
}

fn decode_exact<T: Decodable>(mut buf: &[u8]) -> Result<T, PayloadError> {
    let v = T::decode(&mut buf)?;
    if !buf.is_empty() {
        return Err(PayloadError::TrailingBytes);
    }
    Ok(v)
}

#[derive(RlpEncodable, RlpDecodable)]
struct SetCodeEnvelope {
    version: u8,
    ttl: u64,
    code: Bytes,
}

/// Code to install and how many blocks it lives for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetCodePayload {
    ttl: u64,
    code: Bytes,
}

impl SetCodePayload {
    pub fn new(ttl: u64, code: Bytes) -> Self {
        Self { ttl, code }
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    pub fn code(&self) -> &Bytes {
        &self.code
    }

    pub fn encode(&self) -> Result<Bytes, PayloadError> {
        if self.ttl == 0 {
            return Err(PayloadError::ZeroTtl);
        }
        let env = SetCodeEnvelope {
            version: PAYLOAD_VERSION,
            ttl: self.ttl,
            code: self.code.clone(),
        };
        Ok(alloy_rlp::encode(&env).into())
    }

    pub fn decode(data: &[u8]) -> Result<Self, PayloadError> {
        if data.is_empty() {
            return Err(PayloadError::Empty);
        }
        let env: SetCodeEnvelope = decode_exact(data)?;
        if env.version != PAYLOAD_VERSION {
            return Err(PayloadError::UnsupportedVersion(env.version));
        }
        if env.ttl == 0 {
            return Err(PayloadError::ZeroTtl);
        }
        Ok(Self {
            ttl: env.ttl,
            code: env.code,
        })
    }
}

#[derive(RlpEncodable, RlpDecodable)]
struct KvPutEnvelope {
    version: u8,
    namespace: String,
    key: Bytes,
    value: Bytes,
    ttl: u64,
}

/// A TTL-bound key-value write, stored under the sender.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KvPutPayload {
    namespace: String,
    key: Bytes,
    value: Bytes,
    ttl: u64,
}

impl KvPutPayload {
    pub fn new(namespace: impl Into<String>, key: Bytes, value: Bytes, ttl: u64) -> Self {
        Self {
            namespace: namespace.into(),
            key,
            value,
            ttl,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    fn check(&self) -> Result<(), PayloadError> {
        if self.namespace.trim().is_empty() {
            return Err(PayloadError::BlankNamespace);
        }
        if self.ttl == 0 {
            return Err(PayloadError::ZeroTtl);
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Bytes, PayloadError> {
        self.check()?;
        let env = KvPutEnvelope {
            version: PAYLOAD_VERSION,
            namespace: self.namespace.clone(),
            key: self.key.clone(),
            value: self.value.clone(),
            ttl: self.ttl,
        };
        let mut out = KV_PUT_PREFIX.to_vec();
        out.extend_from_slice(&alloy_rlp::encode(&env));
        Ok(out.into())
    }

    pub fn decode(data: &[u8]) -> Result<Self, PayloadError> {
        let body = data
            .strip_prefix(KV_PUT_PREFIX)
            .filter(|b| !b.is_empty())
            .ok_or(PayloadError::MissingPrefix)?;
        let env: KvPutEnvelope = decode_exact(body)?;
        if env.version != PAYLOAD_VERSION {
            return Err(PayloadError::UnsupportedVersion(env.version));
        }
        let payload = Self {
            namespace: env.namespace,
            key: env.key,
            value: env.value,
            ttl: env.ttl,
        };
        payload.check()?;
        Ok(payload)
    }
}

/// Actions the validator registry understands.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActionKind {
    NodeRegister,
    NodeStake,
    NodeUnstake,
}

impl ActionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "NODE_REGISTER" => Some(Self::NodeRegister),
            "NODE_STAKE" => Some(Self::NodeStake),
            "NODE_UNSTAKE" => Some(Self::NodeUnstake),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NodeRegister => "NODE_REGISTER",
            Self::NodeStake => "NODE_STAKE",
            Self::NodeUnstake => "NODE_UNSTAKE",
        }
    }
}

/// JSON envelope of a system action.  The action name is kept as a string so
/// that unknown actions decode fine and fail at execution instead.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SysAction {
    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl SysAction {
    pub fn new(kind: ActionKind, payload: Option<serde_json::Value>) -> Self {
        Self {
            action: kind.name().to_owned(),
            payload,
        }
    }

    pub fn kind(&self) -> Option<ActionKind> {
        ActionKind::from_name(&self.action)
    }

    pub fn encode(&self) -> Result<Bytes, PayloadError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| PayloadError::Json(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, PayloadError> {
        if data.is_empty() {
            return Err(PayloadError::Empty);
        }
        let sa: Self =
            serde_json::from_slice(data).map_err(|e| PayloadError::Json(e.to_string()))?;
        if sa.action.is_empty() {
            return Err(PayloadError::MissingAction);
        }
        Ok(sa)
    }

    /// Decodes the inner payload, falling back to the default when absent.
    pub fn decode_payload<T>(&self) -> Result<T, PayloadError>
    where
        T: for<'de> Deserialize<'de> + Default,
    {
        match &self.payload {
            None => Ok(T::default()),
            Some(v) => {
                serde_json::from_value(v.clone()).map_err(|e| PayloadError::Json(e.to_string()))
            }
        }
    }
}

/// Payload of `NODE_REGISTER` and optionally `NODE_STAKE`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeRegisterPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Commission in basis points.
    #[serde(default)]
    pub commission_bps: u16,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_set_code_rejects_bad_envelopes() {
        assert_eq!(SetCodePayload::decode(&[]), Err(PayloadError::Empty));
        assert_eq!(
            SetCodePayload::new(0, Bytes::from_static(b"x")).encode(),
            Err(PayloadError::ZeroTtl)
        );

        let bad_version = alloy_rlp::encode(SetCodeEnvelope {
            version: 2,
            ttl: 5,
            code: Bytes::from_static(b"x"),
        });
        assert_eq!(
            SetCodePayload::decode(&bad_version),
            Err(PayloadError::UnsupportedVersion(2))
        );

        let mut trailing = SetCodePayload::new(5, Bytes::from_static(b"abc"))
            .encode()
            .expect("test: encode")
            .to_vec();
        trailing.push(0);
        assert_eq!(SetCodePayload::decode(&trailing), Err(PayloadError::TrailingBytes));
    }

    #[test]
    fn test_kv_put_prefix_and_namespace() {
        let p = KvPutPayload::new("ns", Bytes::from_static(b"k"), Bytes::from_static(b"v"), 9);
        let enc = p.encode().expect("test: encode");
        assert!(enc.starts_with(KV_PUT_PREFIX));
        assert_eq!(KvPutPayload::decode(&enc), Ok(p));

        assert_eq!(KvPutPayload::decode(KV_PUT_PREFIX), Err(PayloadError::MissingPrefix));
        assert_eq!(KvPutPayload::decode(&enc[1..]), Err(PayloadError::MissingPrefix));
        assert_eq!(
            KvPutPayload::new("  ", Bytes::new(), Bytes::new(), 1).encode(),
            Err(PayloadError::BlankNamespace)
        );
    }

    #[test]
    fn test_sys_action_json() {
        let raw = br#"{"action":"NODE_STAKE","payload":{"commission_bps":250}}"#;
        let sa = SysAction::decode(raw).expect("test: decode");
        assert_eq!(sa.kind(), Some(ActionKind::NodeStake));
        let p: NodeRegisterPayload = sa.decode_payload().expect("test: payload");
        assert_eq!(p.commission_bps, 250);
        assert_eq!(p.endpoint, None);

        let unknown = SysAction::decode(br#"{"action":"AGENT_REGISTER"}"#).expect("test: decode");
        assert_eq!(unknown.kind(), None);

        assert_eq!(SysAction::decode(br#"{"action":""}"#), Err(PayloadError::MissingAction));
        assert!(matches!(SysAction::decode(b"not json"), Err(PayloadError::Json(_))));
    }

    proptest! {
        #[test]
        fn test_kv_put_decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..96)) {
            let mut buf = KV_PUT_PREFIX.to_vec();
            buf.extend_from_slice(&data);
            let _ = KvPutPayload::decode(&buf);
            let _ = SetCodePayload::decode(&data);
        }
    }
}
