use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::json;
use snafu::{ensure, ResultExt};

use crate::{
    abi::{
        data::ABI_SCHEMA,
        error::{ABIError, DecodeSnafu, DeserializeSnafu, JsonSnafu, SerializeSnafu, VersionSnafu},
        reflect::ABIReflect,
        serializer::ABI,
    },
    ActionName, BinarySerializable, ByteStream, Bytes, JsonValue, TableName,
};

type Result<T, E = ABIError> = core::result::Result<T, E>;

pub type TypeName = String;
pub type FieldName = String;

/// Prefix every supported ABI version string starts with.
pub const VERSION_PREFIX: &str = "alaio::abi/1.";


#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub new_type_name: TypeName,

    #[serde(rename = "type")]
    pub type_: TypeName,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: FieldName,
    #[serde(rename = "type")]
    pub type_: TypeName,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Struct {
    pub name: TypeName,
    #[serde(default)]
    pub base: TypeName,
    pub fields: Vec<Field>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub name: ActionName,
    #[serde(rename = "type")]
    pub type_: TypeName,
    #[serde(default)]
    pub ricardian_contract: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: TableName,
    #[serde(default)]
    pub index_type: TypeName,
    #[serde(default)]
    pub key_names: Vec<FieldName>,
    #[serde(default)]
    pub key_types: Vec<TypeName>,
    #[serde(rename = "type")]
    pub type_: TypeName,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClausePair {
    pub id: String,
    pub body: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    #[serde(with = "crate::json::string_or_u64")]
    pub error_code: u64,
    pub error_msg: String,
}

/// Forward-compatible additions: a tag and an opaque buffer, interpreted by
/// code that is aware of the tag and carried through by code that is not.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    #[serde(rename = "type")]
    pub type_: u16,
    pub data: Bytes,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub name: TypeName,
    #[serde(default)]
    pub types: Vec<TypeName>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub name: ActionName,
    pub result_type: TypeName,
}

/// The wire form of an ABI: the full list of declarations of a contract
/// namespace, convertible to/from both JSON and binary.
///
/// The trailing `variants` and `action_results` sections may be absent on
/// the wire when produced by older versions of the format.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ABIDefinition {
    pub version: String,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub structs: Vec<Struct>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub ricardian_clauses: Vec<ClausePair>,
    #[serde(default)]
    pub error_messages: Vec<ErrorMessage>,
    #[serde(default)]
    pub abi_extensions: Vec<Extension>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub action_results: Vec<ActionResult>,
}


impl ABIDefinition {
    pub fn from_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context(JsonSnafu)
    }

    pub fn from_variant(v: &JsonValue) -> Result<Self> {
        ABIDefinition::from_str(&v.to_string())
    }

    pub fn from_bin(data: &mut ByteStream) -> Result<Self> {
        let version = String::from_bin(data).context(DeserializeSnafu { what: "version" })?;

        ensure!(version.starts_with(VERSION_PREFIX), VersionSnafu { version });

        let parser = bin_abi_parser();
        let abi = json!({
            "version":  version,
            "types":    parser.decode_variant(data, "typedef[]")?,
            "structs":  parser.decode_variant(data, "struct[]")?,
            "actions":  parser.decode_variant(data, "action[]")?,
            "tables":   parser.decode_variant(data, "table[]")?,
            "ricardian_clauses": parser.decode_variant(data, "ricardian_clause[]")?,
            "error_messages":    parser.decode_variant(data, "error_message[]")?,
            "abi_extensions":    parser.decode_variant(data, "abi_extension[]")?,
            // the trailing sections may be missing from older wire forms
            "variants": if !data.leftover().is_empty() {
                parser.decode_variant(data, "variant[]")?
            } else { json!([]) },
            "action_results": if !data.leftover().is_empty() {
                parser.decode_variant(data, "action_result[]")?
            } else { json!([]) },
        });

        ensure!(data.leftover().is_empty(),
                DecodeSnafu { message: "extra data at the end of the serialized ABI" });

        Self::from_variant(&abi)
    }

    pub fn to_bin(&self, stream: &mut ByteStream) -> Result<()> {
        let parser = bin_abi_parser();
        self.version.to_bin(stream).context(SerializeSnafu { what: "version" })?;
        parser.encode_variant(stream, "typedef[]", &json!(self.types))?;
        parser.encode_variant(stream, "struct[]", &json!(self.structs))?;
        parser.encode_variant(stream, "action[]", &json!(self.actions))?;
        parser.encode_variant(stream, "table[]", &json!(self.tables))?;
        parser.encode_variant(stream, "ricardian_clause[]", &json!(self.ricardian_clauses))?;
        parser.encode_variant(stream, "error_message[]", &json!(self.error_messages))?;
        parser.encode_variant(stream, "abi_extension[]", &json!(self.abi_extensions))?;
        parser.encode_variant(stream, "variant[]", &json!(self.variants))?;
        parser.encode_variant(stream, "action_result[]", &json!(self.action_results))?;

        Ok(())
    }

    /// Whether a declaration (alias, struct or variant) with the given name
    /// already exists within this definition.
    pub fn has_declaration(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.new_type_name == name)
            || self.structs.iter().any(|s| s.name == name)
            || self.variants.iter().any(|v| v.name == name)
    }

    /// Install the declarations equivalent to the native type `T` (and all
    /// the types it depends on) into this definition, making `T` encodable
    /// through schema look-up under its own name.
    pub fn add_type<T: ABIReflect>(&mut self) -> &mut Self {
        T::register(self);
        self
    }
}

impl Default for ABIDefinition {
    fn default() -> ABIDefinition {
        ABIDefinition {
            version: "alaio::abi/1.2".to_owned(),
            types: vec![],
            structs: vec![],
            actions: vec![],
            tables: vec![],
            ricardian_clauses: vec![],
            error_messages: vec![],
            abi_extensions: vec![],
            variants: vec![],
            action_results: vec![],
        }
    }
}


/// The schema of the ABI wire form itself, used to convert an
/// [`ABIDefinition`] to/from binary.
pub fn abi_schema() -> &'static ABIDefinition {
    static ABI_SCHEMA_ONCE: OnceLock<ABIDefinition> = OnceLock::new();
    ABI_SCHEMA_ONCE.get_or_init(|| { ABIDefinition::from_str(ABI_SCHEMA).unwrap() })  // safe unwrap
}

fn bin_abi_parser() -> &'static ABI {
    static BIN_ABI_PARSER: OnceLock<ABI> = OnceLock::new();
    BIN_ABI_PARSER.get_or_init(|| {
        ABI::from_definition(abi_schema()).unwrap()  // safe unwrap
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_abi_def() -> Result<(), ABIError> {
        let abi = abi_schema();

        assert_eq!(abi.version, "alaio::abi/1.1");
        assert!(abi.structs.iter().any(|s| s.name == "struct"));

        Ok(())
    }

    #[test]
    fn reject_foreign_version() {
        let abi = ABIDefinition::from_str(r#"{"version": "other::abi/1.0"}"#).unwrap();
        let mut stream = ByteStream::new();
        // serializing is fine, building a parser for it is not
        abi.to_bin(&mut stream).unwrap();
        assert!(ABI::from_definition(&abi).is_err());
    }
}
