//!
//! Native Rust declarations for the core chain types (actions, transactions
//! and the versioned trace types), wired into the codec through the
//! [`ABISerializable`](macro@crate::ABISerializable) derive macro.
//!
//! Type correspondence with the wire format:
//!  - variable-length integers -> [`VarUint32`]
//!  - opaque byte buffers -> [`Bytes`]
//!  - versioned types (`action_trace_v0`, ...) -> Rust enums deriving
//!    [`SerializeEnum`](macro@crate::SerializeEnum), with one alternative
//!    per version name
//!

use serde::{Deserialize, Serialize};

use crate::{
    abiserializable::to_bin, AccountName, ActionName, ABISerializable, Bytes, Digest, Extensions,
    Name, PermissionName, SerializeEnum, SerializeError, TimePointSec, VarUint32,
};

/// Native action structs know which account and action name they belong to,
/// so they can be packed into an [`Action`] without naming either.
pub trait Contract: crate::BinarySerializable + crate::ABIReflect {
    fn account() -> AccountName;
    fn name() -> ActionName;
}

#[derive(Eq, Hash, PartialEq, Debug, Copy, Clone, Default, Deserialize, Serialize, ABISerializable)]
pub struct PermissionLevel {
    pub actor: AccountName,
    pub permission: PermissionName,
}

/// An action is performed by an actor, aka an account. It may be created
/// explicitly and authorized by signatures or might be generated implicitly
/// by executing application code.
///
/// Each action may require the permission of specific actors; the actors and
/// their respective permission levels are declared on the action and
/// validated independently of the executing application code.
#[derive(Eq, Hash, PartialEq, Debug, Clone, Default, Deserialize, Serialize, ABISerializable)]
pub struct Action {
    pub account: AccountName,
    pub name: ActionName,
    pub authorization: Vec<PermissionLevel>,
    pub data: Bytes,
}

impl Action {
    /// Pack a native action struct into an `Action`, serializing it into the
    /// `data` field.
    pub fn new<T: Contract>(authorization: Vec<PermissionLevel>, action_data: &T)
                            -> Result<Action, SerializeError> {
        Ok(Action {
            account: T::account(),
            name: T::name(),
            authorization,
            data: to_bin(action_data)?,
        })
    }
}

#[derive(Eq, Hash, PartialEq, Debug, Clone, Default, Deserialize, Serialize, ABISerializable)]
pub struct Transaction {
    // -----------------------------------------------------------------------------
    //     TransactionHeader fields
    // -----------------------------------------------------------------------------

    /// The time at which a transaction expires.
    pub expiration: TimePointSec,
    /// Specifies a block num in the last 2^16 blocks.
    pub ref_block_num: u16,
    /// Specifies the lower 32 bits of the block id.
    pub ref_block_prefix: u32,
    /// Upper limit on total network bandwidth (in 8 byte words) billed for this transaction.
    pub max_net_usage_words: VarUint32,
    /// Upper limit on the total CPU time billed for this transaction.
    pub max_cpu_usage_ms: u8,
    /// Number of seconds to delay this transaction for during which it may be canceled.
    pub delay_sec: VarUint32,

    // -----------------------------------------------------------------------------
    //     Transaction fields
    // -----------------------------------------------------------------------------

    pub context_free_actions: Vec<Action>,
    pub actions: Vec<Action>,
    pub transaction_extensions: Extensions,
}


// =============================================================================
//
//     Versioned trace types
//
//     The wire format versions these by type name (`action_trace_v0`,
//     `action_trace_v1`, ...) rather than by an embedded version byte, so
//     each version is a distinct struct and the family is a variant listing
//     them in version order. Encoders must name the exact version they mean,
//     there is no implicit upgrade of a v0 value to v1.
//
// =============================================================================

// the `serde(with)` annotations below keep the JSON form of the 64-bit
// fields in line with the wire convention (quoted strings), matching what
// the schema-driven converter produces for the same types

#[derive(Eq, Hash, PartialEq, Debug, Clone, Deserialize, Serialize, ABISerializable)]
pub struct AccountAuthSequence {
    pub account: Name,
    #[serde(with = "crate::json::string_or_u64")]
    pub sequence: u64,
}

#[derive(Eq, Hash, PartialEq, Debug, Clone, Deserialize, Serialize, ABISerializable)]
pub struct AccountDelta {
    pub account: Name,
    #[serde(with = "crate::json::string_or_i64")]
    pub delta: i64,
}

#[derive(Eq, Hash, PartialEq, Debug, Clone, Deserialize, Serialize, ABISerializable)]
pub struct ActionReceiptV0 {
    pub receiver: Name,
    pub act_digest: Digest,
    #[serde(with = "crate::json::string_or_u64")]
    pub global_sequence: u64,
    #[serde(with = "crate::json::string_or_u64")]
    pub recv_sequence: u64,
    pub auth_sequence: Vec<AccountAuthSequence>,
    pub code_sequence: VarUint32,
    pub abi_sequence: VarUint32,
}

#[derive(Eq, Hash, PartialEq, Debug, Clone, SerializeEnum, ABISerializable)]
pub enum ActionReceipt {
    #[serde(rename = "action_receipt_v0")]
    V0(ActionReceiptV0),
}

#[derive(Eq, Hash, PartialEq, Debug, Clone, Deserialize, Serialize, ABISerializable)]
pub struct ActionTraceV0 {
    pub action_ordinal: VarUint32,
    pub creator_action_ordinal: VarUint32,
    pub receipt: Option<ActionReceipt>,
    pub receiver: Name,
    pub act: Action,
    pub context_free: bool,
    #[serde(with = "crate::json::string_or_i64")]
    pub elapsed: i64,
    pub console: String,
    pub account_ram_deltas: Vec<AccountDelta>,
    pub except: Option<String>,
    #[serde(with = "crate::json::opt_string_or_u64")]
    pub error_code: Option<u64>,
}

#[derive(Eq, Hash, PartialEq, Debug, Clone, Deserialize, Serialize, ABISerializable)]
pub struct ActionTraceV1 {
    pub action_ordinal: VarUint32,
    pub creator_action_ordinal: VarUint32,
    pub receipt: Option<ActionReceipt>,
    pub receiver: Name,
    pub act: Action,
    pub context_free: bool,
    #[serde(with = "crate::json::string_or_i64")]
    pub elapsed: i64,
    pub console: String,
    pub account_ram_deltas: Vec<AccountDelta>,
    pub account_disk_deltas: Vec<AccountDelta>,
    pub except: Option<String>,
    #[serde(with = "crate::json::opt_string_or_u64")]
    pub error_code: Option<u64>,
    pub return_value: Bytes,
}

#[derive(Eq, Hash, PartialEq, Debug, Clone, SerializeEnum, ABISerializable)]
pub enum ActionTrace {
    #[serde(rename = "action_trace_v0")]
    V0(ActionTraceV0),
    #[serde(rename = "action_trace_v1")]
    V1(ActionTraceV1),
}


// =============================================================================
//
//     Unittests
//
// =============================================================================

#[cfg(test)]
mod tests {
    use color_eyre::eyre::Result;

    use crate::{
        from_bin, packed_size, to_hex, ABIDefinition, ABI, Asset, BinarySerializable,
        FixedBufStream,
    };
    use super::*;

    #[derive(Debug, PartialEq, Deserialize, Serialize, ABISerializable)]
    struct Transfer {
        from: Name,
        to: Name,
        quantity: Asset,
        memo: String,
    }

    impl Contract for Transfer {
        fn account() -> AccountName { AccountName::constant("alaio.token") }
        fn name() -> ActionName { ActionName::constant("transfer") }
    }

    fn sample_transfer() -> Transfer {
        Transfer {
            from: Name::constant("useraaaaaaaa"),
            to: Name::constant("useraaaaaaab"),
            quantity: "0.0001 SYS".parse().unwrap(),
            memo: "test memo".to_owned(),
        }
    }

    #[test]
    fn pack_action() -> Result<()> {
        let action = Action::new(
            vec![PermissionLevel {
                actor: AccountName::constant("useraaaaaaaa"),
                permission: PermissionName::constant("active"),
            }],
            &sample_transfer(),
        )?;

        assert_eq!(action.account, Name::constant("alaio.token"));
        assert_eq!(to_hex(&action.data)?,
                   "2a608c31c6187315d6708c31c6187315d6010000000000000004535953000000000974657374206d656d6f");
        Ok(())
    }

    #[test]
    fn stream_equivalence() -> Result<()> {
        let transfer = sample_transfer();

        let bin = crate::to_bin(&transfer)?;
        assert_eq!(packed_size(&transfer)?, bin.0.len());

        let mut buf = vec![0_u8; bin.0.len()];
        let mut fixed = FixedBufStream::new(&mut buf);
        transfer.to_bin(&mut fixed)?;
        assert_eq!(fixed.written(), &bin.0[..]);

        // one byte short must overflow
        let mut buf = vec![0_u8; bin.0.len() - 1];
        let mut fixed = FixedBufStream::new(&mut buf);
        assert!(transfer.to_bin(&mut fixed).is_err());

        Ok(())
    }

    #[test]
    fn reflected_abi_matches_native_encoding() -> Result<()> {
        let mut def = ABIDefinition::default();
        def.add_type::<Transfer>();
        let abi = ABI::from_definition(&def)?;

        let transfer = sample_transfer();
        let value = serde_json::to_value(&transfer)?;
        let bin = abi.variant_to_binary("transfer", &value)?;

        assert_eq!(bin, crate::to_bin(&transfer)?.0);
        assert_eq!(abi.binary_to_variant("transfer", bin.clone())?, value);
        assert_eq!(from_bin::<Transfer>(&bin)?, transfer);
        Ok(())
    }

    #[test]
    fn versioned_trace_tags() -> Result<()> {
        let trace = ActionTrace::V1(ActionTraceV1 {
            action_ordinal: VarUint32(1),
            creator_action_ordinal: VarUint32(0),
            receipt: None,
            receiver: Name::constant("alaio"),
            act: Action::default(),
            context_free: false,
            elapsed: 83,
            console: String::new(),
            account_ram_deltas: vec![AccountDelta {
                account: Name::constant("oracle.aml"),
                delta: 2724,
            }],
            account_disk_deltas: vec![],
            except: None,
            error_code: None,
            return_value: Bytes::new(),
        });

        // binary form starts with the varuint32 tag of the alternative
        let bin = crate::to_bin(&trace)?;
        assert_eq!(bin.0[0], 1);

        // JSON form is a (version name, value) tuple, with 64-bit integers
        // as quoted strings
        let repr = serde_json::to_value(&trace)?;
        assert_eq!(repr[0], "action_trace_v1");
        assert_eq!(repr[1]["elapsed"], "83");
        assert_eq!(repr[1]["account_ram_deltas"][0]["delta"], "2724");
        assert!(repr[1]["error_code"].is_null());

        assert_eq!(serde_json::from_value::<ActionTrace>(repr)?, trace);
        Ok(())
    }
}
