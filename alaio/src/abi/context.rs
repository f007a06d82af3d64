use std::collections::HashMap;
use std::error::Error;

use tracing::debug;

use crate::{
    abi::{definition::ABIDefinition, serializer::ABI},
    json, ByteStream, JsonValue, Name,
};

/// Owner of every ABI of a contract namespace, plus the result buffers a
/// C-style embedding needs.
///
/// This is the stable layer a foreign-function façade would wrap: fallible
/// operations return `bool`/`Option` and leave a description of the failure
/// retrievable through [`error()`](AbiContext::error); the result buffers
/// stay valid until the next call on the same context. A context is a plain
/// owned value: distinct contexts can be used from distinct threads without
/// any shared state.
#[derive(Default)]
pub struct AbiContext {
    contracts: HashMap<Name, ABI>,
    last_error: String,
    result_bin: Vec<u8>,
    result_str: String,
}

impl AbiContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Description of the last failure. Empty when the last call succeeded.
    pub fn error(&self) -> &str {
        &self.last_error
    }

    /// Size of the binary produced by the last conversion.
    pub fn bin_size(&self) -> usize {
        self.result_bin.len()
    }

    /// Binary produced by the last conversion.
    pub fn bin_data(&self) -> &[u8] {
        &self.result_bin
    }

    /// Hex form of the binary produced by the last conversion.
    pub fn bin_hex(&self) -> String {
        hex::encode(&self.result_bin)
    }

    // -----------------------------------------------------------------------------
    //     Name conversions
    // -----------------------------------------------------------------------------

    pub fn string_to_name(&mut self, s: &str) -> Option<u64> {
        self.last_error.clear();
        match Name::new(s) {
            Ok(name) => Some(name.as_u64()),
            Err(err) => {
                self.last_error = error_chain(&err);
                None
            },
        }
    }

    pub fn name_to_string(&mut self, name: u64) -> &str {
        self.result_str = Name::from_u64(name).to_string();
        &self.result_str
    }

    // -----------------------------------------------------------------------------
    //     Loading of contract ABIs
    // -----------------------------------------------------------------------------

    /// Set the ABI (JSON form) for the given contract. An existing ABI for
    /// the same contract is replaced.
    pub fn set_abi(&mut self, contract: Name, abi: &str) -> bool {
        self.load_abi(contract, ABI::from_str(abi))
    }

    /// Set the ABI (binary form) for the given contract.
    pub fn set_abi_bin(&mut self, contract: Name, data: &[u8]) -> bool {
        if data.is_empty() {
            self.last_error = "no data".to_owned();
            return false;
        }
        self.load_abi(contract, ABI::from_bin_abi(data))
    }

    /// Set the ABI (hex form) for the given contract.
    pub fn set_abi_hex(&mut self, contract: Name, hex_repr: &str) -> bool {
        self.load_abi(contract, ABI::from_hex_abi(hex_repr))
    }

    fn load_abi(&mut self, contract: Name, abi: Result<ABI, crate::ABIError>) -> bool {
        self.last_error.clear();
        match abi {
            Ok(abi) => {
                debug!(contract = %contract, "loaded ABI");
                self.contracts.insert(contract, abi);
                true
            },
            Err(err) => {
                self.last_error = error_chain(&err);
                false
            },
        }
    }

    // -----------------------------------------------------------------------------
    //     Type lookups
    // -----------------------------------------------------------------------------

    pub fn get_type_for_action(&mut self, contract: Name, action: Name) -> Option<&str> {
        self.last_error.clear();
        match lookup(&self.contracts, contract, action, "action", ABI::action_type) {
            Ok(typename) => Some(typename),
            Err(msg) => {
                self.last_error = msg;
                None
            },
        }
    }

    pub fn get_type_for_table(&mut self, contract: Name, table: Name) -> Option<&str> {
        self.last_error.clear();
        match lookup(&self.contracts, contract, table, "table", ABI::table_type) {
            Ok(typename) => Some(typename),
            Err(msg) => {
                self.last_error = msg;
                None
            },
        }
    }

    pub fn get_type_for_action_result(&mut self, contract: Name, action_result: Name) -> Option<&str> {
        self.last_error.clear();
        match lookup(&self.contracts, contract, action_result, "action result", ABI::action_result_type) {
            Ok(typename) => Some(typename),
            Err(msg) => {
                self.last_error = msg;
                None
            },
        }
    }

    // -----------------------------------------------------------------------------
    //     Data conversions
    // -----------------------------------------------------------------------------

    /// Convert JSON to binary, expecting struct fields in schema order.
    /// Retrieve the result with [`bin_data()`](AbiContext::bin_data) /
    /// [`bin_hex()`](AbiContext::bin_hex).
    pub fn json_to_bin(&mut self, contract: Name, typename: &str, repr: &str) -> bool {
        self.set_bin_result(json_to_bin_(&self.contracts, contract, typename, repr, false))
    }

    /// Convert JSON to binary, allowing struct field reordering.
    pub fn json_to_bin_reorderable(&mut self, contract: Name, typename: &str, repr: &str) -> bool {
        self.set_bin_result(json_to_bin_(&self.contracts, contract, typename, repr, true))
    }

    /// Convert binary to its JSON text form. Fails if the value does not
    /// consume the input exactly.
    pub fn bin_to_json(&mut self, contract: Name, typename: &str, data: &[u8]) -> Option<&str> {
        self.set_str_result(bin_to_json_(&self.contracts, contract, typename, data))
    }

    /// Convert hex-encoded binary to its JSON text form.
    pub fn hex_to_json(&mut self, contract: Name, typename: &str, hex_repr: &str) -> Option<&str> {
        let data = match hex::decode(hex_repr) {
            Ok(data) => data,
            Err(err) => {
                self.last_error = error_chain(&err);
                return None;
            },
        };
        self.set_str_result(bin_to_json_(&self.contracts, contract, typename, &data))
    }

    // -----------------------------------------------------------------------------
    //     Conversions of the ABI itself
    // -----------------------------------------------------------------------------

    /// Convert an ABI in JSON form to its binary form. Retrieve the result
    /// with [`bin_data()`](AbiContext::bin_data) / [`bin_hex()`](AbiContext::bin_hex).
    pub fn abi_json_to_bin(&mut self, abi: &str) -> bool {
        self.set_bin_result(abi_json_to_bin_(abi))
    }

    /// Convert an ABI in binary form to its JSON text form.
    pub fn abi_bin_to_json(&mut self, data: &[u8]) -> Option<&str> {
        self.set_str_result(abi_bin_to_json_(data))
    }

    // -----------------------------------------------------------------------------
    //     Result plumbing
    // -----------------------------------------------------------------------------

    fn set_bin_result(&mut self, result: Result<Vec<u8>, String>) -> bool {
        self.last_error.clear();
        self.result_bin.clear();
        match result {
            Ok(bin) => {
                self.result_bin = bin;
                true
            },
            Err(msg) => {
                self.last_error = msg;
                false
            },
        }
    }

    fn set_str_result(&mut self, result: Result<String, String>) -> Option<&str> {
        self.last_error.clear();
        self.result_str.clear();
        match result {
            Ok(repr) => {
                self.result_str = repr;
                Some(&self.result_str)
            },
            Err(msg) => {
                self.last_error = msg;
                None
            },
        }
    }
}


// -----------------------------------------------------------------------------
//     Helper functions
//
//     these borrow only the contract map so the members holding the results
//     stay writable at the call sites
// -----------------------------------------------------------------------------

fn get_contract(contracts: &HashMap<Name, ABI>, contract: Name) -> Result<&ABI, String> {
    contracts.get(&contract)
        .ok_or_else(|| format!(r#"contract "{contract}" is not loaded"#))
}

fn lookup<'a>(
    contracts: &'a HashMap<Name, ABI>,
    contract: Name,
    name: Name,
    what: &str,
    getter: impl Fn(&'a ABI, Name) -> Option<&'a str>,
) -> Result<&'a str, String> {
    let abi = get_contract(contracts, contract)?;
    getter(abi, name)
        .ok_or_else(|| format!(r#"contract "{contract}" does not have {what} "{name}""#))
}

fn json_to_bin_(
    contracts: &HashMap<Name, ABI>,
    contract: Name,
    typename: &str,
    repr: &str,
    reorderable: bool,
) -> Result<Vec<u8>, String> {
    let abi = get_contract(contracts, contract)?;
    let value: JsonValue = serde_json::from_str(repr)
        .map_err(|e| format!("cannot parse JSON string: {e}"))?;
    let result = match reorderable {
        false => abi.variant_to_binary(typename, &value),
        true => abi.variant_to_binary_reorderable(typename, &value),
    };
    result.map_err(|e| error_chain(&e))
}

fn bin_to_json_(
    contracts: &HashMap<Name, ABI>,
    contract: Name,
    typename: &str,
    data: &[u8],
) -> Result<String, String> {
    let abi = get_contract(contracts, contract)?;
    let mut ds = ByteStream::from(data.to_vec());
    let value = abi.decode_variant(&mut ds, typename).map_err(|e| error_chain(&e))?;
    if !ds.leftover().is_empty() {
        return Err(format!("extra data ({} byte(s)) after deserialized value", ds.leftover().len()));
    }
    json::to_string(&value).map_err(|e| error_chain(&e))
}

fn abi_json_to_bin_(abi: &str) -> Result<Vec<u8>, String> {
    let def = ABIDefinition::from_str(abi).map_err(|e| error_chain(&e))?;
    // make sure the ABI is coherent before producing its binary form
    ABI::from_definition(&def).map_err(|e| error_chain(&e))?;
    let mut ds = ByteStream::new();
    def.to_bin(&mut ds).map_err(|e| error_chain(&e))?;
    Ok(ds.into_bytes())
}

fn abi_bin_to_json_(data: &[u8]) -> Result<String, String> {
    if data.is_empty() {
        return Err("no data".to_owned());
    }
    let mut ds = ByteStream::from(data.to_vec());
    let def = ABIDefinition::from_bin(&mut ds).map_err(|e| error_chain(&e))?;
    json::to_string(&def).map_err(|e| error_chain(&e))
}

/// Flatten an error and its chain of sources into a single message.
fn error_chain(err: &dyn Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        msg.push_str(": ");
        msg.push_str(&err.to_string());
        source = err.source();
    }
    msg
}
