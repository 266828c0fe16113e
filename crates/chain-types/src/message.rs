use parexec_primitives::prelude::*;

/// The four statically-typed transaction kinds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TxKind {
    Transfer,
    CodeDeploy,
    SystemAction,
    KvPut,
}

impl TxKind {
    /// Classifies a transaction by its recipient.
    pub fn from_recipient(to: Option<&Address>) -> Self {
        match to {
            None => Self::CodeDeploy,
            Some(a) if *a == SYSTEM_ACTION_ADDRESS => Self::SystemAction,
            Some(a) if *a == KV_ROUTER_ADDRESS => Self::KvPut,
            Some(_) => Self::Transfer,
        }
    }
}

/// A decoded transaction, immutable once constructed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    sender: Address,
    to: Option<Address>,
    value: U256,
    gas_limit: u64,
    gas_price: U256,
    nonce: u64,
    payload: Bytes,
}

impl Message {
    pub fn new(
        sender: Address,
        to: Option<Address>,
        value: U256,
        gas_limit: u64,
        gas_price: U256,
        nonce: u64,
        payload: Bytes,
    ) -> Self {
        Self {
            sender,
            to,
            value,
            gas_limit,
            gas_price,
            nonce,
            payload,
        }
    }

    /// Plain value transfer with zero gas price and an empty payload.
    pub fn transfer(sender: Address, to: Address, value: U256, gas_limit: u64, nonce: u64) -> Self {
        Self::new(
            sender,
            Some(to),
            value,
            gas_limit,
            U256::ZERO,
            nonce,
            Bytes::new(),
        )
    }

    /// Code deploy carrying an encoded [`SetCodePayload`](crate::SetCodePayload).
    pub fn code_deploy(sender: Address, payload: Bytes, gas_limit: u64, nonce: u64) -> Self {
        Self::new(sender, None, U256::ZERO, gas_limit, U256::ZERO, nonce, payload)
    }

    /// KV put carrying an encoded [`KvPutPayload`](crate::KvPutPayload).
    pub fn kv_put(sender: Address, payload: Bytes, gas_limit: u64, nonce: u64) -> Self {
        Self::new(
            sender,
            Some(KV_ROUTER_ADDRESS),
            U256::ZERO,
            gas_limit,
            U256::ZERO,
            nonce,
            payload,
        )
    }

    /// System action carrying an encoded [`SysAction`](crate::SysAction).
    pub fn system_action(
        sender: Address,
        value: U256,
        payload: Bytes,
        gas_limit: u64,
        nonce: u64,
    ) -> Self {
        Self::new(
            sender,
            Some(SYSTEM_ACTION_ADDRESS),
            value,
            gas_limit,
            U256::ZERO,
            nonce,
            payload,
        )
    }

    /// Returns a copy with the gas price replaced.
    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn kind(&self) -> TxKind {
        TxKind::from_recipient(self.to.as_ref())
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn to(&self) -> Option<&Address> {
        self.to.as_ref()
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_recipient() {
        let a = Address::repeat_byte(0x11);
        assert_eq!(TxKind::from_recipient(None), TxKind::CodeDeploy);
        assert_eq!(
            TxKind::from_recipient(Some(&SYSTEM_ACTION_ADDRESS)),
            TxKind::SystemAction
        );
        assert_eq!(TxKind::from_recipient(Some(&KV_ROUTER_ADDRESS)), TxKind::KvPut);
        assert_eq!(TxKind::from_recipient(Some(&a)), TxKind::Transfer);

        // Registries are not special recipients, only the routers are.
        assert_eq!(
            TxKind::from_recipient(Some(&VALIDATOR_REGISTRY_ADDRESS)),
            TxKind::Transfer
        );
    }

    #[test]
    fn test_constructors_pick_kind() {
        let a = Address::repeat_byte(0x11);
        let b = Address::repeat_byte(0x22);
        assert_eq!(Message::transfer(a, b, U256::from(1), 21_000, 0).kind(), TxKind::Transfer);
        assert_eq!(
            Message::code_deploy(a, Bytes::new(), 60_000, 0).kind(),
            TxKind::CodeDeploy
        );
        assert_eq!(Message::kv_put(a, Bytes::new(), 60_000, 0).kind(), TxKind::KvPut);
        assert_eq!(
            Message::system_action(a, U256::ZERO, Bytes::new(), 200_000, 0).kind(),
            TxKind::SystemAction
        );
    }
}
