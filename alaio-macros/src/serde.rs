use heck::ToSnakeCase;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    Data, DataEnum, DataStruct, DeriveInput, Error, Field, Fields, FieldsNamed, Ident, Result,
    Variant,
};

use crate::attr;

/// control whether we want to have debugging information for the macro when compiling
const DEBUG: bool = false;

macro_rules! debug {
    ( $($elem:expr),* ) => { if DEBUG { eprintln!( $($elem),* ); } }
}


// =============================================================================
//
//     `ABISerializable`
//
// =============================================================================

pub fn derive(input: &DeriveInput) -> TokenStream {
    match try_expand(input) {
        Ok(expanded) => expanded,
        Err(error) => panic!("Error while using derive(ABISerializable): {}", error),
    }
}

fn try_expand(input: &DeriveInput) -> Result<TokenStream> {
    match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => derive_abiserializable_struct(input, fields),
        Data::Enum(enumeration) => derive_abiserializable_enum(input, enumeration),
        _ => Err(Error::new(
            Span::call_site(),
            "currently only structs with named fields and enums are supported",
        )),
    }
}

fn derive_abiserializable_struct(input: &DeriveInput, fields: &FieldsNamed) -> Result<TokenStream> {
    let ident = &input.ident;
    let abi_name = ident.to_string().to_snake_case();

    let fieldname = &fields.named.iter().map(|f| &f.ident).collect::<Vec<_>>();
    let fieldtype = &fields.named.iter().map(|f| &f.ty).collect::<Vec<_>>();
    let fieldname_str = &fields.named.iter()
        .map(|f| f.ident.as_ref().unwrap().to_string())  // safe unwrap, named fields
        .collect::<Vec<_>>();

    debug!("field names: {:?}", &fieldname);
    debug!("field types: {:?}", &fieldtype);

    Ok(quote! {
        #[doc(hidden)]
        const _: () = {
            impl alaio::BinarySerializable for #ident {
                fn to_bin<W: alaio::StreamWriter>(&self, s: &mut W)
                                                  -> ::core::result::Result<(), alaio::SerializeError> {
                    #(
                        self.#fieldname.to_bin(s)?;
                    )*
                    Ok(())
                }
                fn from_bin(s: &mut alaio::ByteStream)
                            -> ::core::result::Result<Self, alaio::SerializeError> {
                    Ok(Self {
                        #(
                            #fieldname: <#fieldtype>::from_bin(s)?,
                        )*
                    })
                }
            }

            impl alaio::ABIReflect for #ident {
                fn abi_name() -> ::std::string::String {
                    #abi_name.to_owned()
                }
                fn register(def: &mut alaio::ABIDefinition) {
                    if def.has_declaration(#abi_name) { return; }
                    def.structs.push(alaio::abi::Struct {
                        name: #abi_name.to_owned(),
                        base: ::std::string::String::new(),
                        fields: vec![
                            #(
                                alaio::abi::Field {
                                    name: #fieldname_str.to_owned(),
                                    type_: <#fieldtype as alaio::ABIReflect>::abi_name(),
                                },
                            )*
                        ],
                    });
                    #(
                        <#fieldtype as alaio::ABIReflect>::register(def);
                    )*
                }
            }
        };
    })
}

fn derive_abiserializable_enum(input: &DeriveInput, enumeration: &DataEnum) -> Result<TokenStream> {
    if input.generics.lt_token.is_some() || input.generics.where_clause.is_some() {
        return Err(Error::new(
            Span::call_site(),
            "Enums with generics are not supported",
        ));
    }

    let ident = &input.ident;
    let ident_str = ident.to_string();
    let abi_name = ident_str.to_snake_case();

    let variants = enumeration
        .variants
        .iter()
        .map(|variant| match variant.fields {
            Fields::Unnamed(ref f) if f.unnamed.len() == 1 => Ok((&variant.ident, &f.unnamed[0])),
            _ => Err(Error::new_spanned(
                variant,
                "Invalid variant: only simple enum variants with 1 field are supported",
            )),
        })
        .collect::<Result<Vec<_>>>()?;
    let var_idents = &variants.iter().map(|v: &(&Ident, &Field)| v.0).collect::<Vec<_>>();
    let var_type = &variants.iter().map(|v: &(&Ident, &Field)| &v.1.ty).collect::<Vec<_>>();

    debug!("variant idents: {:?}", &var_idents);

    let index = &(0..(var_idents.len() as u32)).collect::<Vec<_>>();

    Ok(quote! {
        #[doc(hidden)]
        const _: () = {
            impl alaio::BinarySerializable for #ident {
                fn to_bin<W: alaio::StreamWriter>(&self, s: &mut W)
                                                  -> ::core::result::Result<(), alaio::SerializeError> {
                    match *self {
                        #(
                            #ident::#var_idents(ref __field0) => {
                                alaio::VarUint32(#index).to_bin(s)?;
                                __field0.to_bin(s)
                            }
                        )*
                    }
                }
                fn from_bin(s: &mut alaio::ByteStream)
                            -> ::core::result::Result<Self, alaio::SerializeError> {
                    Ok(match alaio::VarUint32::from_bin(s)?.0 {
                        #(
                            #index => #ident::#var_idents(<#var_type>::from_bin(s)?),
                        )*
                        t => alaio::abiserializable::InvalidTagSnafu { tag: t, variant: #ident_str }.fail()?,
                    })
                }
            }

            impl alaio::ABIReflect for #ident {
                fn abi_name() -> ::std::string::String {
                    #abi_name.to_owned()
                }
                fn register(def: &mut alaio::ABIDefinition) {
                    if def.has_declaration(#abi_name) { return; }
                    def.variants.push(alaio::abi::Variant {
                        name: #abi_name.to_owned(),
                        types: vec![
                            #(
                                <#var_type as alaio::ABIReflect>::abi_name(),
                            )*
                        ],
                    });
                    #(
                        <#var_type as alaio::ABIReflect>::register(def);
                    )*
                }
            }
        };
    })
}


// =============================================================================
//
//     `SerializeEnum`
//
// =============================================================================

pub fn derive_serialize_enum(input: &DeriveInput) -> TokenStream {
    match try_expand_enum(input) {
        Ok(expanded) => expanded,
        Err(error) => panic!("Error while using derive(SerializeEnum): {}", error),
    }
}

fn try_expand_enum(input: &DeriveInput) -> Result<TokenStream> {
    match &input.data {
        Data::Enum(enumeration) => derive_enum(input, enumeration),
        _ => Err(Error::new(
            Span::call_site(),
            "SerializeEnum can only be derived on enums",
        )),
    }
}

fn derive_enum(input: &DeriveInput, enumeration: &DataEnum) -> Result<TokenStream> {
    if input.generics.lt_token.is_some() || input.generics.where_clause.is_some() {
        return Err(Error::new(
            Span::call_site(),
            "Enums with generics are not supported",
        ));
    }

    let ident = &input.ident;

    let variants = enumeration
        .variants
        .iter()
        .map(|variant| match variant.fields {
            Fields::Unnamed(ref f) if f.unnamed.len() == 1 => Ok(variant),
            _ => Err(Error::new_spanned(
                variant,
                "Invalid variant: only simple enum variants with 1 field are supported",
            )),
        })
        .collect::<Result<Vec<&Variant>>>()?;

    let var_idents = &variants.iter().map(|v| &v.ident).collect::<Vec<_>>();
    let names = &variants.iter().copied()
        .map(attr::snake_name_of_variant)
        .collect::<Result<Vec<_>>>()?;

    debug!("variant names: {:?}", &names);

    Ok(quote! {
        #[doc(hidden)]
        const _: () = {
            impl serde::Serialize for #ident {
                fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
                where S: serde::Serializer
                {
                    match *self {
                        #(
                            #ident::#var_idents(ref __field0) => {
                                let mut state = serde::Serializer::serialize_tuple(serializer, 2)?;
                                serde::ser::SerializeTuple::serialize_element(&mut state, #names)?;
                                serde::ser::SerializeTuple::serialize_element(&mut state, __field0)?;
                                serde::ser::SerializeTuple::end(state)
                            },
                        )*
                    }
                }
            }

            impl<'de> serde::Deserialize<'de> for #ident {
                fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
                where D: serde::Deserializer<'de>
                {
                    struct TagVisitor;

                    impl<'de> serde::de::Visitor<'de> for TagVisitor {
                        type Value = #ident;

                        fn expecting(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
                            f.write_str("a 2-element array [discriminant, value]")
                        }

                        fn visit_seq<A>(self, mut seq: A) -> ::core::result::Result<#ident, A::Error>
                        where A: serde::de::SeqAccess<'de>
                        {
                            let tag: ::std::string::String = seq.next_element()?
                                .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                            Ok(match tag.as_str() {
                                #(
                                    #names => #ident::#var_idents(
                                        seq.next_element()?
                                            .ok_or_else(|| serde::de::Error::invalid_length(1, &self))?
                                    ),
                                )*
                                _ => return Err(serde::de::Error::unknown_variant(&tag, &[#(#names),*])),
                            })
                        }
                    }

                    deserializer.deserialize_seq(TagVisitor)
                }
            }
        };
    })
}
