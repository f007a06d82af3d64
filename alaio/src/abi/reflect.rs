use crate::{
    abi::definition::{ABIDefinition, Struct, Field},
    types::*,
};

/// Map a native Rust type to its ABI type name, and let it contribute the
/// declarations needed to describe it to an [`ABIDefinition`].
///
/// Builtin types map to their well-known names and contribute nothing;
/// containers wrap the name of their element type; aggregate types get their
/// implementation from the `ABISerializable` derive macro, which registers a
/// struct (or variant) declaration mirroring the Rust declaration.
pub trait ABIReflect {
    /// ABI type name under which this type is known.
    fn abi_name() -> String;

    /// Install the declarations needed to describe this type into `def`.
    fn register(_def: &mut ABIDefinition) {}
}

macro_rules! impl_abi_reflect {
    ($typ:ty, $name:literal) => {
        impl ABIReflect for $typ {
            fn abi_name() -> String { $name.to_owned() }
        }
    }
}

impl_abi_reflect!(bool, "bool");

impl_abi_reflect!(i8, "int8");
impl_abi_reflect!(i16, "int16");
impl_abi_reflect!(i32, "int32");
impl_abi_reflect!(i64, "int64");
impl_abi_reflect!(i128, "int128");

impl_abi_reflect!(u8, "uint8");
impl_abi_reflect!(u16, "uint16");
impl_abi_reflect!(u32, "uint32");
impl_abi_reflect!(u64, "uint64");
impl_abi_reflect!(u128, "uint128");

impl_abi_reflect!(VarInt32, "varint32");
impl_abi_reflect!(VarUint32, "varuint32");

impl_abi_reflect!(f32, "float32");
impl_abi_reflect!(f64, "float64");
impl_abi_reflect!(Float128, "float128");

impl_abi_reflect!(Bytes, "bytes");
impl_abi_reflect!(String, "string");

impl_abi_reflect!(TimePoint, "time_point");
impl_abi_reflect!(TimePointSec, "time_point_sec");
impl_abi_reflect!(BlockTimestamp, "block_timestamp_type");

impl_abi_reflect!(Checksum160, "checksum160");
impl_abi_reflect!(Checksum256, "checksum256");
impl_abi_reflect!(Checksum512, "checksum512");

impl_abi_reflect!(PublicKey, "public_key");
impl_abi_reflect!(PrivateKey, "private_key");
impl_abi_reflect!(Signature, "signature");

impl_abi_reflect!(Name, "name");
impl_abi_reflect!(SymbolCode, "symbol_code");
impl_abi_reflect!(Symbol, "symbol");
impl_abi_reflect!(Asset, "asset");
impl_abi_reflect!(ExtendedAsset, "extended_asset");


impl<T: ABIReflect> ABIReflect for Vec<T> {
    fn abi_name() -> String {
        format!("{}[]", T::abi_name())
    }
    fn register(def: &mut ABIDefinition) {
        T::register(def)
    }
}

impl<T: ABIReflect> ABIReflect for Option<T> {
    fn abi_name() -> String {
        format!("{}?", T::abi_name())
    }
    fn register(def: &mut ABIDefinition) {
        T::register(def)
    }
}

impl<T: ABIReflect> ABIReflect for Box<T> {
    fn abi_name() -> String {
        T::abi_name()
    }
    fn register(def: &mut ABIDefinition) {
        T::register(def)
    }
}

// extension entries are pairs on the wire, which an ABI can only express as
// a 2-field struct
impl ABIReflect for (u16, Bytes) {
    fn abi_name() -> String {
        "extension".to_owned()
    }
    fn register(def: &mut ABIDefinition) {
        if def.has_declaration("extension") { return; }
        def.structs.push(Struct {
            name: "extension".to_owned(),
            base: String::new(),
            fields: vec![
                Field { name: "type".to_owned(), type_: "uint16".to_owned() },
                Field { name: "data".to_owned(), type_: "bytes".to_owned() },
            ],
        });
    }
}
