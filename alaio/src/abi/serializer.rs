use std::collections::{HashMap, HashSet};

use serde_json::json;
use snafu::{ensure, ResultExt};
use strum::VariantNames;
use tracing::{debug, instrument};

use crate::{
    abi::{
        definition::{ABIDefinition, Struct, Field, TypeName, Variant, VERSION_PREFIX},
        error::{
            ABIError, DecodeSnafu, DeserializeSnafu, EncodeSnafu, IntegritySnafu,
            SerializeSnafu, VariantConversionSnafu, IncompatibleVariantTypesSnafu, VersionSnafu,
        },
        typename::TypeNameRef,
    },
    AlaioType, AlaioValue, BinarySerializable, ByteStream, JsonMap, JsonValue, Name,
    SerializeError, VarUint32,
};

type Result<T, E = ABIError> = core::result::Result<T, E>;

/// Maximum nesting depth when encoding or decoding, so that adversarial
/// schemas or payloads cannot blow the stack.
const MAX_RECURSION_DEPTH: u32 = 64;


/// A resolved ABI, ready to drive conversions between binary and JSON for
/// every type name it declares.
///
/// Building an `ABI` from an [`ABIDefinition`] validates the whole schema
/// up front (unknown types, duplicate or circular declarations, misplaced
/// binary extensions), so that resolution at conversion time cannot fail on
/// anything but the input data itself.
#[derive(Default, Clone, Debug)]
pub struct ABI {
    typedefs: HashMap<TypeName, TypeName>,
    structs: HashMap<TypeName, Struct>,
    variants: HashMap<TypeName, Variant>,
    actions: HashMap<Name, TypeName>,
    tables: HashMap<Name, TypeName>,
    action_results: HashMap<Name, TypeName>,
}

impl ABI {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------------
    //     Constructors and validation of ABI
    // -----------------------------------------------------------------------------

    pub fn from_definition(abi: &ABIDefinition) -> Result<Self> {
        let mut result = Self::new();
        result.set_abi(abi)?;
        Ok(result)
    }

    pub fn from_str(abi: &str) -> Result<Self> {
        Self::from_definition(&ABIDefinition::from_str(abi)?)
    }

    pub fn from_hex_abi(abi: &str) -> Result<Self> {
        Self::from_bin_abi(&hex::decode(abi)?)
    }

    pub fn from_bin_abi(abi: &[u8]) -> Result<Self> {
        let mut data = ByteStream::from(abi.to_owned());
        let abi_def = ABIDefinition::from_bin(&mut data)?;
        Self::from_definition(&abi_def)
    }

    fn set_abi(&mut self, abi: &ABIDefinition) -> Result<()> {
        ensure!(abi.version.starts_with(VERSION_PREFIX), VersionSnafu { version: &abi.version });

        self.typedefs.clear();
        self.structs.clear();
        self.variants.clear();
        self.actions.clear();
        self.tables.clear();
        self.action_results.clear();

        self.structs.extend(abi.structs.iter().map(|s| (s.name.clone(), s.clone())));
        self.variants.extend(abi.variants.iter().map(|v| (v.name.clone(), v.clone())));

        for td in &abi.types {
            // this checks that the alias does not redefine an existing
            // struct or variant as well as detecting duplicate aliases
            ensure!(!self.is_type(TypeNameRef(&td.new_type_name)),
                    IntegritySnafu { message: format!("type already exists: {}",
                                                      td.new_type_name) });
            self.typedefs.insert(td.new_type_name.clone(), td.type_.clone());
        }

        self.actions.extend(abi.actions.iter()
                            .map(|a| (a.name, a.type_.clone())));
        self.tables.extend(abi.tables.iter()
                           .map(|t| (t.name, t.type_.clone())));
        self.action_results.extend(abi.action_results.iter()
                                   .map(|a| (a.name, a.result_type.clone())));

        // the ABIDefinition vectors may contain duplicates which would make it an invalid ABI
        ensure!(self.typedefs.len() == abi.types.len(),
                IntegritySnafu { message: "duplicate type definition detected" });
        ensure!(self.structs.len() == abi.structs.len(),
                IntegritySnafu { message: "duplicate struct definition detected" });
        ensure!(self.variants.len() == abi.variants.len(),
                IntegritySnafu { message: "duplicate variant definition detected" });
        ensure!(self.actions.len() == abi.actions.len(),
                IntegritySnafu { message: "duplicate action definition detected" });
        ensure!(self.tables.len() == abi.tables.len(),
                IntegritySnafu { message: "duplicate table definition detected" });
        ensure!(self.action_results.len() == abi.action_results.len(),
                IntegritySnafu { message: "duplicate action result definition detected" });

        self.validate()
    }

    /// Whether `t` (with any `[]`/`?`/`$` suffixes stripped) resolves to a
    /// builtin, a declared struct or variant, or an alias of one of those.
    pub fn is_type(&self, t: TypeNameRef) -> bool {
        // a `$` suffix can only be the outermost designator
        let mut t = t.remove_bin_extension();
        let mut ft = t.fundamental_type();
        while ft != t {
            t = ft;
            ft = t.fundamental_type();
        }

        AlaioValue::VARIANTS.contains(&t.0)
            || (self.typedefs.contains_key(t.0) &&
                self.is_type(TypeNameRef(self.typedefs.get(t.0).unwrap())))  // safe unwrap
            || self.structs.contains_key(t.0)
            || self.variants.contains_key(t.0)
    }

    /// Follow alias chains until a non-alias type name is reached.
    pub fn resolve_type<'a>(&'a self, t: TypeNameRef<'a>) -> TypeNameRef<'a> {
        let mut rtype = t;
        loop {
            match self.typedefs.get(rtype.0) {
                Some(t) => rtype = TypeNameRef(t),
                None => return rtype,
            }
        }
    }

    pub fn action_type(&self, action: Name) -> Option<&str> {
        self.actions.get(&action).map(|t| t.as_str())
    }

    pub fn table_type(&self, table: Name) -> Option<&str> {
        self.tables.get(&table).map(|t| t.as_str())
    }

    pub fn action_result_type(&self, action: Name) -> Option<&str> {
        self.action_results.get(&action).map(|t| t.as_str())
    }

    pub fn validate(&self) -> Result<(), ABIError> {
        // check there are no circular references in the typedefs definition
        for t in &self.typedefs {
            let mut types_seen = vec![t.0, t.1];
            let mut itr = self.typedefs.get(&t.1[..]);
            while let Some(it) = itr {
                ensure!(!types_seen.contains(&it),
                        IntegritySnafu { message: format!("circular reference in type `{}`", t.0) });
                types_seen.push(it);
                itr = self.typedefs.get(it);
            }
        }

        // check all types used in typedefs are valid types
        for t in &self.typedefs {
            ensure!(self.is_type(t.1.into()),
                    IntegritySnafu { message: format!("invalid type used in typedef `{}`", t.1) });
        }

        // check there are no circular references in the structs definition
        for s in self.structs.values() {
            if !s.base.is_empty() {
                let mut current = s;
                let mut types_seen = vec![&current.name];
                while !current.base.is_empty() {
                    ensure!(self.structs.contains_key(&current.base),
                            IntegritySnafu { message: format!("invalid type used in '{}::base': `{}`", &s.name, &current.base) });
                    let base = self.structs.get(&current.base).unwrap();  // safe unwrap
                    ensure!(!types_seen.contains(&&base.name),
                            IntegritySnafu { message: format!("circular reference in struct '{}'", &s.name) });
                    types_seen.push(&base.name);
                    current = base;
                }
            }

            // check all field types are valid types
            for field in &s.fields {
                ensure!(self.is_type(TypeNameRef(&field.type_[..]).remove_bin_extension()),
                        IntegritySnafu { message: format!("invalid type used in field '{}::{}': `{}`",
                                                          &s.name, &field.name, &field.type_) });
            }
        }

        // base chains are known acyclic here, the flattened field list of
        // every struct can now be checked for duplicates and for binary
        // extensions not placed on trailing fields
        for s in self.structs.values() {
            let fields = self.all_fields(s)?;

            let mut names_seen = HashSet::new();
            for field in &fields {
                ensure!(names_seen.insert(&field.name),
                        IntegritySnafu { message: format!("duplicate field '{}' in struct '{}'",
                                                          &field.name, &s.name) });
            }

            let mut extension_seen = false;
            for field in &fields {
                let ftype = TypeNameRef(&field.type_);
                if ftype.has_bin_extension() {
                    extension_seen = true;
                }
                else {
                    ensure!(!extension_seen,
                            IntegritySnafu { message: format!(
                                "field '{}' of struct '{}' has no binary extension but follows one that does",
                                &field.name, &s.name) });
                }
            }
        }

        // check all types from a variant are valid types
        for v in self.variants.values() {
            for t in &v.types {
                ensure!(self.is_type(t.into()),
                        IntegritySnafu { message: format!("invalid type `{}` used in variant '{}'",
                                                          t, v.name) });
            }
        }

        // check all actions are valid types
        for (name, type_) in &self.actions {
            ensure!(self.is_type(type_.into()),
                    IntegritySnafu { message: format!("invalid type `{}` used in action '{}'",
                                                      type_, name) });
        }

        // check all tables are valid types
        for (name, type_) in &self.tables {
            ensure!(self.is_type(type_.into()),
                    IntegritySnafu { message: format!("invalid type `{}` used in table '{}'",
                                                      type_, name) });
        }

        // check all action results are valid types
        for (name, type_) in &self.action_results {
            ensure!(self.is_type(type_.into()),
                    IntegritySnafu { message: format!("invalid type `{}` used in action result '{}'",
                                                      type_, name) });
        }

        Ok(())
    }

    /// Return the fields of a struct including the inherited ones, base
    /// chain first.
    fn all_fields<'a>(&'a self, struct_def: &'a Struct) -> Result<Vec<&'a Field>> {
        let mut chain = vec![struct_def];
        let mut current = struct_def;
        while !current.base.is_empty() {
            current = self.structs.get(&current.base)
                .ok_or_else(|| IntegritySnafu { message: format!(
                    "invalid type used in '{}::base': `{}`", current.name, current.base) }.build())?;
            ensure!(chain.len() <= self.structs.len(),
                    IntegritySnafu { message: format!("circular reference in struct '{}'", struct_def.name) });
            chain.push(current);
        }

        let mut fields = vec![];
        for s in chain.iter().rev() {
            fields.extend(s.fields.iter());
        }
        Ok(fields)
    }


    // -----------------------------------------------------------------------------
    //     Encoding of JSON value -> binary
    // -----------------------------------------------------------------------------

    /// Convert a JSON value to binary, expecting struct fields in schema
    /// order.
    pub fn variant_to_binary<'a, T>(&self, typename: T, obj: &JsonValue) -> Result<Vec<u8>>
    where
        T: Into<TypeNameRef<'a>>
    {
        let mut ds = ByteStream::new();
        self.encode_variant(&mut ds, typename.into(), obj)?;
        Ok(ds.into_bytes())
    }

    /// Convert a JSON value to binary, accepting struct fields in any order.
    pub fn variant_to_binary_reorderable<'a, T>(&self, typename: T, obj: &JsonValue) -> Result<Vec<u8>>
    where
        T: Into<TypeNameRef<'a>>
    {
        let mut ds = ByteStream::new();
        self.encode_variant_reorderable(&mut ds, typename.into(), obj)?;
        Ok(ds.into_bytes())
    }

    #[inline]
    pub fn encode_variant<'a, T>(&self, ds: &mut ByteStream, typename: T, object: &JsonValue)
                                 -> Result<(), ABIError>
    where
        T: Into<TypeNameRef<'a>>
    {
        self.encode_variant_(&mut EncodeContext::new(true), ds, typename.into(), object)
    }

    #[inline]
    pub fn encode_variant_reorderable<'a, T>(&self, ds: &mut ByteStream, typename: T, object: &JsonValue)
                                             -> Result<(), ABIError>
    where
        T: Into<TypeNameRef<'a>>
    {
        self.encode_variant_(&mut EncodeContext::new(false), ds, typename.into(), object)
    }

    #[instrument(skip(self, ctx, ds))]
    fn encode_variant_(&self, ctx: &mut EncodeContext, ds: &mut ByteStream,
                       typename: TypeNameRef, object: &JsonValue)
                       -> Result<(), ABIError> {
        ensure!(ctx.depth < MAX_RECURSION_DEPTH,
                EncodeSnafu { message: format!("max recursion depth reached while processing type `{}`", typename) });
        ctx.depth += 1;
        let result = self.encode_variant_inner(ctx, ds, typename, object);
        ctx.depth -= 1;
        result
    }

    fn encode_variant_inner(&self, ctx: &mut EncodeContext, ds: &mut ByteStream,
                            typename: TypeNameRef, object: &JsonValue)
                            -> Result<(), ABIError> {
        let rtype = self.resolve_type(typename);
        let ftype = rtype.fundamental_type();

        debug!(rtype = rtype.0, ftype = ftype.0);

        // use a closure to avoid cloning and copying if no error occurs
        let incompatible_types = || { IncompatibleVariantTypesSnafu {
            typename: rtype.0.to_owned(),
            value: Box::new(object.clone())
        }.build() };

        if AlaioValue::VARIANTS.contains(&ftype.0) {
            // if our fundamental type is a builtin type, we can serialize it
            // directly to the stream
            let inner_type: AlaioType = ftype.try_into().unwrap();  // safe unwrap
            if rtype.is_array() {
                let a = object.as_array().ok_or_else(incompatible_types)?;
                write_varuint(ds, a.len())?;
                for v in a {
                    write_value(ds, inner_type, v)?;
                }
            }
            else if rtype.is_optional() {
                match !object.is_null() {
                    true => {
                        write_bool(ds, true)?;
                        write_value(ds, inner_type, object)?;
                    },
                    false => write_bool(ds, false)?,
                }
            }
            else {
                write_value(ds, inner_type, object)?;
            }
        }
        else {
            // not a builtin type, we have to recurse down

            if rtype.is_array() {
                let a = object.as_array().ok_or_else(incompatible_types)?;
                write_varuint(ds, a.len())?;
                for v in a {
                    self.encode_variant_(ctx, ds, ftype, v)?;
                }
            }
            else if rtype.is_optional() {
                match !object.is_null() {
                    true => {
                        write_bool(ds, true)?;
                        self.encode_variant_(ctx, ds, ftype, object)?;
                    },
                    false => write_bool(ds, false)?,
                }
            }
            else if let Some(variant_def) = self.variants.get(rtype.0) {
                debug!("serializing type {:?} with variant: {:?}", rtype.0, object);
                ensure!(object.is_array() && object.as_array().unwrap().len() == 2,
                        EncodeSnafu {
                            message: format!("expected input to be an array of 2 elements while processing variant: {}",
                                             &object)
                        });
                ensure!(object[0].is_string(),
                        EncodeSnafu {
                            message: format!("expected variant typename to be a string: {}",
                                             object[0])
                        });
                let variant_type = TypeNameRef(object[0].as_str().unwrap());  // safe unwrap
                if let Some(vpos) = variant_def.types.iter().position(|v| v == variant_type.0) {
                    write_varuint(ds, vpos)?;
                    self.encode_variant_(ctx, ds, variant_type, &object[1])?;
                }
                else {
                    EncodeSnafu {
                        message: format!("specified type `{}` is not valid within the variant '{}'",
                                         variant_type, rtype)
                    }.fail()?;
                }
            }
            else if let Some(struct_def) = self.structs.get(rtype.0) {
                self.encode_struct(ctx, ds, struct_def, object)?;
            }
            else {
                EncodeSnafu { message: format!("do not know how to serialize type: `{}`", rtype) }.fail()?;
            }
        }

        Ok(())
    }

    fn encode_struct(&self, ctx: &mut EncodeContext, ds: &mut ByteStream,
                     struct_def: &Struct, object: &JsonValue)
                     -> Result<(), ABIError> {
        let fields = self.all_fields(struct_def)?;

        if let Some(obj) = object.as_object() {
            if ctx.ordered {
                self.encode_struct_ordered(ctx, ds, struct_def, &fields, obj)
            }
            else {
                self.encode_struct_reorderable(ctx, ds, struct_def, &fields, obj)
            }
        }
        else if let Some(arr) = object.as_array() {
            // we are given an array, serialize fields by their position
            let nfields = fields.len();
            for (i, field) in fields.iter().enumerate() {
                let ftype = TypeNameRef(&field.type_);
                if i < arr.len() {
                    self.encode_field(ctx, ds, ftype, &arr[i], i == nfields - 1)?;
                }
                else if ftype.has_bin_extension() && ctx.allow_extensions {
                    break;
                }
                else {
                    EncodeSnafu { message: format!(concat!(
                        "early end to input array specifying the fields of struct '{}'; ",
                        "require input for field '{}'"
                    ), struct_def.name, field.name) }.fail()?;
                }
            }
            Ok(())
        }
        else {
            EncodeSnafu { message: format!(
                "unexpected input while encoding struct '{}': {}",
                struct_def.name, object) }.fail()
        }
    }

    /// Strict mode: the object keys must match the schema fields exactly and
    /// in order; only trailing binary extension fields may be left out.
    fn encode_struct_ordered(&self, ctx: &mut EncodeContext, ds: &mut ByteStream,
                             struct_def: &Struct, fields: &[&Field],
                             obj: &JsonMap<String, JsonValue>)
                             -> Result<(), ABIError> {
        let nfields = fields.len();
        let keys: Vec<&String> = obj.keys().collect();
        let mut next_key = 0;
        let mut extension_absent = false;

        for (i, field) in fields.iter().enumerate() {
            let ftype = TypeNameRef(&field.type_);
            if next_key < keys.len() && keys[next_key] == &field.name {
                ensure!(!extension_absent,
                        EncodeSnafu { message: format!(
                            "unexpected field '{}' found after an absent extension field while processing struct '{}'",
                            &field.name, &struct_def.name) });
                let value = &obj[keys[next_key].as_str()];
                next_key += 1;
                self.encode_field(ctx, ds, ftype, value, i == nfields - 1)?;
            }
            else if ftype.has_bin_extension() && ctx.allow_extensions {
                extension_absent = true;
            }
            else {
                let found = match next_key < keys.len() {
                    true => format!("'{}'", keys[next_key]),
                    false => "end of object".to_owned(),
                };
                EncodeSnafu { message: format!(
                    "expected field '{}' of struct '{}' but found {}",
                    &field.name, &struct_def.name, found) }.fail()?;
            }
        }

        ensure!(next_key == keys.len(),
                EncodeSnafu { message: format!(
                    "unexpected field '{}' found in input object while processing struct '{}'",
                    keys[next_key], &struct_def.name) });
        Ok(())
    }

    /// Reorderable mode: object keys are bound by name; absent optionals
    /// encode as null, absent trailing extension fields are tolerated and
    /// unknown keys are ignored.
    fn encode_struct_reorderable(&self, ctx: &mut EncodeContext, ds: &mut ByteStream,
                                 struct_def: &Struct, fields: &[&Field],
                                 obj: &JsonMap<String, JsonValue>)
                                 -> Result<(), ABIError> {
        let nfields = fields.len();
        let mut extension_absent = false;

        for (i, field) in fields.iter().enumerate() {
            let ftype = TypeNameRef(&field.type_);
            let present = obj.contains_key(&field.name);
            if present || ftype.is_optional() {
                ensure!(!extension_absent,
                        EncodeSnafu { message: format!(
                            "unexpected field '{}' found after an absent extension field while processing struct '{}'",
                            &field.name, &struct_def.name) });
                let value = if present { obj.get(&field.name).unwrap() }  // safe unwrap
                else                   { &JsonValue::Null };
                self.encode_field(ctx, ds, ftype, value, i == nfields - 1)?;
            }
            else if ftype.has_bin_extension() && ctx.allow_extensions {
                extension_absent = true;
            }
            else {
                EncodeSnafu { message: format!(
                    "missing field '{}' in input object while processing struct '{}'",
                    &field.name, &struct_def.name) }.fail()?;
            }
        }
        Ok(())
    }

    /// Encode a single struct field; a nested struct may only use binary
    /// extensions itself when this field sits in tail position.
    fn encode_field(&self, ctx: &mut EncodeContext, ds: &mut ByteStream,
                    ftype: TypeNameRef, value: &JsonValue, is_last: bool)
                    -> Result<(), ABIError> {
        let saved = ctx.allow_extensions;
        ctx.allow_extensions = saved && is_last;
        let result = self.encode_variant_(ctx, ds, ftype.remove_bin_extension(), value);
        ctx.allow_extensions = saved;
        result
    }


    // -----------------------------------------------------------------------------
    //     Decoding of binary data -> JSON value
    // -----------------------------------------------------------------------------

    pub fn binary_to_variant<'a, T>(&self, typename: T, bytes: Vec<u8>) -> Result<JsonValue>
    where
        T: Into<TypeNameRef<'a>>
    {
        let mut ds = ByteStream::from(bytes);
        self.decode_variant_(&mut ds, typename.into(), 0)
    }

    #[inline]
    pub fn decode_variant<'a, T>(&self, ds: &mut ByteStream, typename: T) -> Result<JsonValue, ABIError>
    where
        T: Into<TypeNameRef<'a>>
    {
        self.decode_variant_(ds, typename.into(), 0)
    }

    #[instrument(skip(self, ds, depth))]
    #[allow(clippy::collapsible_else_if)]
    fn decode_variant_(&self, ds: &mut ByteStream, typename: TypeNameRef, depth: u32) -> Result<JsonValue, ABIError> {
        ensure!(depth < MAX_RECURSION_DEPTH,
                DecodeSnafu { message: format!("max recursion depth reached while processing type `{}`", typename) });

        let rtype = self.resolve_type(typename);
        let ftype = rtype.fundamental_type();

        Ok(if AlaioValue::VARIANTS.contains(&ftype.0) {
            let type_ = ftype.try_into().unwrap();  // safe unwrap

            // if our fundamental type is a builtin type, we can deserialize
            // it directly from the stream
            if rtype.is_array() {
                let item_count = decode_usize(ds, "item count (as varuint32)")?;
                debug!(r#"reading array of {item_count} elements of type "{ftype}""#);
                // limit the capacity that can be reserved before data is read
                let mut a = Vec::with_capacity(item_count.min(1024));
                for _ in 0..item_count {
                    a.push(read_value(ds, type_, "array item")?);
                }
                JsonValue::Array(a)
            }
            else if rtype.is_optional() {
                let non_null = bool::from_bin(ds)
                    .context_decode("optional discriminant")?;
                match non_null {
                    true => read_value(ds, type_, "optional value")?,
                    false => JsonValue::Null,
                }
            }
            else {
                read_value(ds, type_, "single builtin value")?
            }
        }
        else {
            if rtype.is_array() {
                // not a builtin type, we have to recurse down
                let item_count = decode_usize(ds, "item count (as varuint32)")?;
                debug!(r#"reading array of {item_count} elements of type "{ftype}""#);
                let mut a = Vec::with_capacity(item_count.min(1024));
                for _ in 0..item_count {
                    a.push(self.decode_variant_(ds, ftype, depth + 1)?);
                }
                JsonValue::Array(a)
            }
            else if rtype.is_optional() {
                let non_null = bool::from_bin(ds)
                    .context_decode("optional discriminant")?;
                match non_null {
                    true => self.decode_variant_(ds, ftype, depth + 1)?,
                    false => JsonValue::Null,
                }
            }
            else if let Some(variant_def) = self.variants.get(rtype.0) {
                let variant_tag: usize = decode_usize(ds, "variant tag (as varuint32)")?;
                ensure!(variant_tag < variant_def.types.len(),
                        DecodeSnafu { message: format!("deserialized invalid tag {} for variant {}",
                                                       variant_tag, rtype)
                        });
                let variant_type = TypeNameRef(&variant_def.types[variant_tag]);
                json!([variant_type.0, self.decode_variant_(ds, variant_type, depth + 1)?])
            }
            else if let Some(struct_def) = self.structs.get(rtype.0) {
                self.decode_struct(ds, struct_def, depth + 1)?
            }
            else {
                DecodeSnafu { message: format!("do not know how to deserialize type: {}", rtype) }.fail()?
            }
        })
    }

    fn decode_struct(&self, ds: &mut ByteStream, struct_def: &Struct, depth: u32) -> Result<JsonValue, ABIError> {
        debug!(r#"reading struct with name "{}" and base "{}""#, struct_def.name, struct_def.base);

        let fields = self.all_fields(struct_def)?;
        let mut result: JsonMap<String, JsonValue> = JsonMap::new();

        let mut encountered_extension = false;
        for field in fields {
            let fname = &field.name;
            let ftype = TypeNameRef(&field.type_);
            encountered_extension |= ftype.has_bin_extension();
            if ds.leftover().is_empty() {
                // trailing binary extension fields may be absent from the
                // wire entirely
                if ftype.has_bin_extension() {
                    continue;
                }
                ensure!(!encountered_extension,
                        DecodeSnafu { message: format!(
                            "encountered field '{}' without binary extension designation while processing struct '{}'",
                            fname, &struct_def.name) });

                DecodeSnafu { message: format!(
                    "stream ended unexpectedly; unable to unpack field '{}' of struct '{}'",
                    fname, struct_def.name) }.fail()?
            }

            let value = self.decode_variant_(ds, ftype.remove_bin_extension(), depth)?;
            debug!(r#"decoded field '{fname}' with type `{ftype}`: {value}"#);
            result.insert(fname.to_string(), value);
        }

        Ok(JsonValue::Object(result))
    }
}


// -----------------------------------------------------------------------------
//     Helper functions
// -----------------------------------------------------------------------------

fn write_value(stream: &mut ByteStream, type_: AlaioType, v: &JsonValue) -> Result<(), ABIError> {
    AlaioValue::from_variant(type_, v)
        .with_context(|_| VariantConversionSnafu { v: Box::new(v.clone()) })?
        .to_bin(stream)
        .context_encode("builtin value")
}

fn write_bool(stream: &mut ByteStream, b: bool) -> Result<(), ABIError> {
    b.to_bin(stream).context_encode("bool")
}

fn write_varuint(stream: &mut ByteStream, n: usize) -> Result<(), ABIError> {
    VarUint32::from(n).to_bin(stream).context_encode("varuint32")
}

fn read_value(stream: &mut ByteStream, type_: AlaioType, what: &str) -> Result<JsonValue, ABIError> {
    Ok(AlaioValue::from_bin(type_, stream)
       .context_decode(what)?.to_variant())
}

fn decode_usize(stream: &mut ByteStream, what: &str) -> Result<usize, ABIError> {
    let n = VarUint32::from_bin(stream).context_decode(what)?;
    Ok(n.into())
}

/// Small helpers over `ResultExt` to wrap low-level serialization failures
/// with the name of the item being processed.
trait SerializeResultExt<T> {
    fn context_decode(self, what: &str) -> Result<T, ABIError>;
    fn context_encode(self, what: &str) -> Result<T, ABIError>;
}

impl<T> SerializeResultExt<T> for Result<T, SerializeError> {
    fn context_decode(self, what: &str) -> Result<T, ABIError> {
        self.context(DeserializeSnafu { what })
    }
    fn context_encode(self, what: &str) -> Result<T, ABIError> {
        self.context(SerializeSnafu { what })
    }
}


struct EncodeContext {
    /// whether struct fields must appear in schema order in the input object
    ordered: bool,
    /// whether the struct currently being encoded may use binary extensions
    allow_extensions: bool,
    depth: u32,
}

impl EncodeContext {
    fn new(ordered: bool) -> EncodeContext {
        EncodeContext { ordered, allow_extensions: true, depth: 0 }
    }
}
