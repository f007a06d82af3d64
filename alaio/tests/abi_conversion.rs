use std::sync::{Once, OnceLock};

use color_eyre::eyre::{eyre, Result};

use tracing::debug;
use tracing_subscriber::EnvFilter;

use alaio::{
    abi::data::{PACKED_TRANSACTION_ABI, TEST_ABI, TOKEN_HEX_ABI, TRANSACTION_ABI},
    ABIDefinition, AbiContext, ByteStream, JsonValue, Name, TypeNameRef, ABI,
};

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// round-trip tests for the schema-driven converter: JSON -> binary -> JSON,  //
// with reference hex values for each step                                    //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

static TRACING_INIT: Once = Once::new();

fn init() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    });
}

fn transaction_abi() -> &'static ABI {
    static TRX_ABI: OnceLock<ABI> = OnceLock::new();
    TRX_ABI.get_or_init(|| {
        let transaction_abi_def = ABIDefinition::from_str(TRANSACTION_ABI).unwrap();
        ABI::from_definition(&transaction_abi_def).unwrap()
    })
}

fn test_abi() -> &'static ABI {
    static TEST_ABI_ONCE: OnceLock<ABI> = OnceLock::new();
    TEST_ABI_ONCE.get_or_init(|| {
        ABI::from_definition(&ABIDefinition::from_str(TEST_ABI).unwrap()).unwrap()
    })
}

fn try_encode_stream(ds: &mut ByteStream, abi: &ABI, typename: TypeNameRef, data: &str) -> Result<()> {
    let value: JsonValue = serde_json::from_str(data)
        .map_err(|e| eyre!("cannot parse JSON string: {e}"))?;
    abi.encode_variant(ds, typename, &value)?;
    Ok(())
}

fn try_encode(abi: &ABI, typename: &str, data: &str) -> Result<()> {
    let mut ds = ByteStream::new();
    try_encode_stream(&mut ds, abi, typename.into(), data)
}

fn try_decode_stream(ds: &mut ByteStream, abi: &ABI, typename: TypeNameRef) -> Result<JsonValue> {
    let decoded = abi.decode_variant(ds, typename)?;
    if !ds.leftover().is_empty() {
        return Err(eyre!("extra data after deserialized value"));
    }
    Ok(decoded)
}

fn try_decode<T: AsRef<[u8]>>(abi: &ABI, typename: &str, data: T) -> Result<JsonValue> {
    let mut ds = ByteStream::from(hex::decode(data)?);
    try_decode_stream(&mut ds, abi, typename.into())
}

#[track_caller]
fn round_trip(abi: &ABI, typename: &str, data: &str, hex: &str, expected: &str) -> Result<()> {
    debug!(r#"==== round-tripping type "{typename}" with value {data}"#);
    let mut ds = ByteStream::new();

    try_encode_stream(&mut ds, abi, typename.into(), data)?;
    assert_eq!(ds.hex_data(), hex.to_ascii_lowercase());

    let decoded = try_decode_stream(&mut ds, abi, typename.into())?;
    let repr = decoded.to_string();

    // if we have a number whose representation would use scientific notation,
    // first convert it to an `f64` and then call `to_string()` in order to
    // get the representation with only digits
    if let Some(x) = decoded.as_f64() {
        if repr.contains('e') {
            assert_eq!(x.to_string(), expected);
            return Ok(());
        }
    }
    assert_eq!(repr, expected);

    Ok(())
}

fn check_error<F, T>(f: F, expected_error_msg: &str)
    where F: FnOnce() -> Result<T>
{
    match f() {
        Ok(_) => {
            panic!(r#"expected error with message "{}" but everything went fine..."#,
                   expected_error_msg);
        },
        Err(e) => {
            let received_msg = format!("{:?}", e);
            if !received_msg.contains(expected_error_msg) {
                eprintln!("{:?}\n", e);
                panic!(r#"expected error message with "{}", got: {}"#,
                       expected_error_msg, received_msg);
            }
        },
    }
}

/// check roundtrip JSON -> binary -> JSON
#[track_caller]
fn check_round_trip(abi: &ABI, typename: &str, data: &str, hex: &str) {
    round_trip(abi, typename, data, hex, data).unwrap()
}

/// same as `check_round_trip` but with a different expected output
#[track_caller]
fn check_round_trip2(abi: &ABI, typename: &str, data: &str, hex: &str, expected: &str) {
    round_trip(abi, typename, data, hex, expected).unwrap()
}

fn str_to_hex(s: &str) -> String {
    format!("{:02x}{}", s.len(), hex::encode(s.as_bytes()))
}


// -----------------------------------------------------------------------------
//     ABI loading and validation
// -----------------------------------------------------------------------------

#[test]
fn integration_test() -> Result<()> {
    init();

    let _test_abi = test_abi();
    let _transaction_abi = transaction_abi();
    let _token_abi = ABI::from_hex_abi(TOKEN_HEX_ABI)?;

    check_error(|| Ok(ABIDefinition::from_str("")?), "cannot deserialize ABIDefinition");
    check_error(|| Ok(ABI::from_hex_abi("")?), "stream ended");
    check_error(|| Ok(ABI::from_hex_abi("00")?), "unsupported ABI version");
    check_error(|| Ok(ABI::from_hex_abi(&str_to_hex("alaio::abi/9.0"))?), "unsupported ABI version");
    check_error(|| Ok(ABI::from_hex_abi(&str_to_hex("alaio::abi/1.0"))?), "stream ended");
    check_error(|| Ok(ABI::from_hex_abi(&str_to_hex("alaio::abi/1.1"))?), "stream ended");

    Ok(())
}

#[test]
fn invalid_abis() {
    init();

    // unknown type used in a field
    check_error(|| Ok(ABI::from_str(r#"{
        "version": "alaio::abi/1.1",
        "structs": [{"name": "s", "base": "", "fields": [{"name": "x", "type": "mystery"}]}]
    }"#)?), "invalid type used in field");

    // duplicate struct declaration
    check_error(|| Ok(ABI::from_str(r#"{
        "version": "alaio::abi/1.1",
        "structs": [{"name": "s", "base": "", "fields": []},
                    {"name": "s", "base": "", "fields": []}]
    }"#)?), "duplicate struct definition");

    // circular alias chain
    check_error(|| Ok(ABI::from_str(r#"{
        "version": "alaio::abi/1.1",
        "types": [{"new_type_name": "a", "type": "b"},
                  {"new_type_name": "b", "type": "a"}]
    }"#)?), "circular reference in type");

    // circular base chain
    check_error(|| Ok(ABI::from_str(r#"{
        "version": "alaio::abi/1.1",
        "structs": [{"name": "s1", "base": "s2", "fields": []},
                    {"name": "s2", "base": "s1", "fields": []}]
    }"#)?), "circular reference in struct");

    // duplicate field through the base chain
    check_error(|| Ok(ABI::from_str(r#"{
        "version": "alaio::abi/1.1",
        "structs": [{"name": "s1", "base": "", "fields": [{"name": "x", "type": "int8"}]},
                    {"name": "s2", "base": "s1", "fields": [{"name": "x", "type": "int8"}]}]
    }"#)?), "duplicate field");

    // binary extension on a non-trailing field
    check_error(|| Ok(ABI::from_str(r#"{
        "version": "alaio::abi/1.1",
        "structs": [{"name": "s", "base": "", "fields": [{"name": "x", "type": "int8$"},
                                                         {"name": "y", "type": "int8"}]}]
    }"#)?), "no binary extension but follows one");

    // alias redefining a struct
    check_error(|| Ok(ABI::from_str(r#"{
        "version": "alaio::abi/1.1",
        "types": [{"new_type_name": "s", "type": "int8"}],
        "structs": [{"name": "s", "base": "", "fields": []}]
    }"#)?), "type already exists");
}


// -----------------------------------------------------------------------------
//     Builtin types through an (empty) ABI
// -----------------------------------------------------------------------------

#[test]
fn roundtrip_bool() -> Result<()> {
    init();

    // a freshly built empty ABI still resolves every builtin type
    let abi = ABI::from_definition(&ABIDefinition::from_str(r#"{"version": "alaio::abi/1.0"}"#)?)?;

    check_round_trip(&abi, "bool", "true", "01");
    check_round_trip(&abi, "bool", "false", "00");

    check_error(|| try_decode(&abi, "bool", ""), "stream ended");
    check_error(|| try_encode(&abi, "bool", ""), "cannot parse JSON string");
    check_error(|| try_encode(&abi, "bool", "trues"), "cannot parse JSON string");
    check_error(|| try_encode(&abi, "bool", "null"), "cannot convert given variant");
    check_error(|| try_encode(&abi, "bool", r#""foo""#), "cannot convert given variant");

    Ok(())
}

#[test]
fn roundtrip_ints() -> Result<()> {
    init();

    let abi = transaction_abi();

    check_round_trip(abi, "int8", "0", "00");
    check_round_trip(abi, "int8", "127", "7F");
    check_round_trip(abi, "int8", "-128", "80");
    check_round_trip(abi, "uint8", "0", "00");
    check_round_trip(abi, "uint8", "1", "01");
    check_round_trip(abi, "uint8", "254", "FE");
    check_round_trip(abi, "uint8", "255", "FF");

    check_error(|| try_encode(abi, "int8", "128"), "integer out of range");
    check_error(|| try_encode(abi, "int8", "-129"), "integer out of range");
    check_error(|| try_encode(abi, "uint8", "-1"), "cannot convert given variant");
    check_error(|| try_encode(abi, "uint8", "256"), "integer out of range");

    check_round_trip(abi, "uint8[]", "[]", "00");
    check_round_trip(abi, "uint8[]", "[10]", "010A");
    check_round_trip(abi, "uint8[]", "[10,9]", "020A09");
    check_round_trip(abi, "uint8[]", "[10,9,8]", "030A0908");

    check_round_trip(abi, "int16", "0", "0000");
    check_round_trip(abi, "int16", "32767", "FF7F");
    check_round_trip(abi, "int16", "-32768", "0080");
    check_round_trip(abi, "uint16", "65535", "FFFF");

    check_error(|| try_decode(abi, "int16", "01"), "stream ended");
    check_error(|| try_encode(abi, "int16", "32768"), "integer out of range");

    check_round_trip(abi, "int32", "2147483647", "FFFFFF7F");
    check_round_trip(abi, "int32", "-2147483648", "00000080");
    check_round_trip(abi, "uint32", "4294967295", "FFFFFFFF");

    Ok(())
}

#[test]
fn roundtrip_64_and_128_bit_ints_as_strings() -> Result<()> {
    init();

    let abi = transaction_abi();

    check_round_trip(abi, "int64", r#""0""#, "0000000000000000");
    check_round_trip(abi, "int64", r#""1""#, "0100000000000000");
    check_round_trip(abi, "int64", r#""-1""#, "FFFFFFFFFFFFFFFF");
    check_round_trip(abi, "int64", r#""9223372036854775807""#, "FFFFFFFFFFFFFF7F");
    check_round_trip(abi, "int64", r#""-9223372036854775808""#, "0000000000000080");
    check_round_trip(abi, "uint64", r#""0""#, "0000000000000000");
    check_round_trip(abi, "uint64", r#""18446744073709551615""#, "FFFFFFFFFFFFFFFF");

    // bare numbers are accepted on input
    check_round_trip2(abi, "int64", "42", "2A00000000000000", r#""42""#);

    check_error(|| try_encode(abi, "int64", r#""9223372036854775808""#), "number too large");
    check_error(|| try_encode(abi, "int64", r#""-9223372036854775809""#), "number too small");
    check_error(|| try_encode(abi, "uint64", r#""-1""#), "invalid digit");
    check_error(|| try_encode(abi, "uint64", r#""18446744073709551616""#), "number too large");

    check_round_trip(abi, "int128", r#""0""#, "00000000000000000000000000000000");
    check_round_trip(abi, "int128", r#""1""#, "01000000000000000000000000000000");
    check_round_trip(abi, "int128", r#""-1""#, "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF");
    check_round_trip(abi, "int128", r#""18446744073709551615""#, "FFFFFFFFFFFFFFFF0000000000000000");
    check_round_trip(abi, "int128", r#""-18446744073709551615""#, "0100000000000000FFFFFFFFFFFFFFFF");
    check_round_trip(abi, "int128", r#""170141183460469231731687303715884105727""#, "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFF7F");
    check_round_trip(abi, "int128", r#""-170141183460469231731687303715884105728""#, "00000000000000000000000000000080");
    check_round_trip(abi, "uint128", r#""0""#, "00000000000000000000000000000000");
    check_round_trip(abi, "uint128", r#""340282366920938463463374607431768211455""#, "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF");

    check_error(|| try_encode(abi, "int128", r#""170141183460469231731687303715884105728""#), "number too large");
    check_error(|| try_encode(abi, "uint128", r#""-1""#), "invalid");

    Ok(())
}

#[test]
fn roundtrip_varints() -> Result<()> {
    init();

    let abi = transaction_abi();

    check_round_trip(abi, "varuint32", "0", "00");
    check_round_trip(abi, "varuint32", "127", "7F");
    check_round_trip(abi, "varuint32", "128", "8001");
    check_round_trip(abi, "varuint32", "16383", "FF7F");
    check_round_trip(abi, "varuint32", "16384", "808001");
    check_round_trip(abi, "varuint32", "2097151", "FFFF7F");
    check_round_trip(abi, "varuint32", "2097152", "80808001");
    check_round_trip(abi, "varuint32", "268435455", "FFFFFF7F");
    check_round_trip(abi, "varuint32", "268435456", "8080808001");
    check_round_trip(abi, "varuint32", "4294967294", "FEFFFFFF0F");
    check_round_trip(abi, "varuint32", "4294967295", "FFFFFFFF0F");

    check_round_trip(abi, "varint32", "0", "00");
    check_round_trip(abi, "varint32", "-1", "01");
    check_round_trip(abi, "varint32", "1", "02");
    check_round_trip(abi, "varint32", "-2", "03");
    check_round_trip(abi, "varint32", "2", "04");
    check_round_trip(abi, "varint32", "-2147483647", "FDFFFFFF0F");
    check_round_trip(abi, "varint32", "2147483647", "FEFFFFFF0F");
    check_round_trip(abi, "varint32", "-2147483648", "FFFFFFFF0F");

    check_error(|| try_encode(abi, "varuint32", "4294967296"), "integer out of range");
    check_error(|| try_encode(abi, "varuint32", "-1"), "cannot convert given variant");
    // a 5th byte carrying bits beyond the low 4 is rejected
    check_error(|| try_decode(abi, "varuint32", "FFFFFFFF1F"), "varint too long");

    Ok(())
}

#[test]
fn roundtrip_floats() -> Result<()> {
    init();

    let abi = transaction_abi();

    check_round_trip(abi, "float32", "0.0", "00000000");
    check_round_trip(abi, "float32", "0.125", "0000003E");
    check_round_trip(abi, "float32", "-0.125", "000000BE");
    check_round_trip(abi, "float64", "0.0", "0000000000000000");
    check_round_trip(abi, "float64", "0.125", "000000000000C03F");
    check_round_trip(abi, "float64", "-0.125", "000000000000C0BF");
    check_round_trip2(abi, "float64", "151115727451828646838272.0", "000000000000C044",
                      "151115727451828650000000");

    // non-finite values use their quoted text forms
    check_round_trip(abi, "float64", r#""NaN""#, "000000000000F87F");
    check_round_trip(abi, "float64", r#""Infinity""#, "000000000000F07F");
    check_round_trip(abi, "float64", r#""-Infinity""#, "000000000000F0FF");

    Ok(())
}

#[test]
fn roundtrip_datetimes() -> Result<()> {
    init();

    let abi = transaction_abi();

    check_round_trip(abi, "time_point_sec", r#""1970-01-01T00:00:00.000""#, "00000000");
    check_round_trip(abi, "time_point_sec", r#""2018-06-15T19:17:47.000""#, "DB10245B");
    check_round_trip(abi, "time_point_sec", r#""2030-06-15T19:17:47.000""#, "5B6FB671");

    check_round_trip(abi, "time_point", r#""1970-01-01T00:00:00.000""#, "0000000000000000");
    check_round_trip(abi, "time_point", r#""1970-01-01T00:00:00.001""#, "E803000000000000");
    check_round_trip(abi, "time_point", r#""1970-01-01T00:00:00.010""#, "1027000000000000");
    check_round_trip(abi, "time_point", r#""1970-01-01T00:00:00.100""#, "A086010000000000");
    check_round_trip(abi, "time_point", r#""2018-06-15T19:17:47.000""#, "C0AC3112B36E0500");
    check_round_trip(abi, "time_point", r#""2018-06-15T19:17:47.999""#, "18EB4012B36E0500");
    check_round_trip2(abi, "time_point", r#""2000-12-31T23:59:59.999999""#, "FF1F23E5C3790300",
                      r#""2000-12-31T23:59:59.999""#);

    check_round_trip(abi, "block_timestamp_type", r#""2000-01-01T00:00:00.000""#, "00000000");
    check_round_trip(abi, "block_timestamp_type", r#""2000-01-01T00:00:00.500""#, "01000000");
    check_round_trip(abi, "block_timestamp_type", r#""2000-01-01T00:00:01.000""#, "02000000");
    check_round_trip(abi, "block_timestamp_type", r#""2018-06-15T19:17:47.500""#, "B79A6D45");

    check_error(|| try_encode(abi, "time_point_sec", "true"), "cannot convert given variant");
    check_error(|| try_encode(abi, "time_point_sec", r#""1969-12-31T23:59:59""#), "out of range");
    check_error(|| try_encode(abi, "block_timestamp_type", r#""1999-12-31T23:59:59""#), "out of range");

    Ok(())
}

#[test]
fn roundtrip_names() -> Result<()> {
    init();

    let abi = transaction_abi();

    check_round_trip(abi, "name", r#""""#, "0000000000000000");
    check_round_trip(abi, "name", r#""1""#, "0000000000000008");
    check_round_trip(abi, "name", r#""abcd""#, "000000000090D031");
    check_round_trip(abi, "name", r#""ab.cd.ef""#, "0000004B8184C031");
    check_round_trip(abi, "name", r#""ab.cd.ef.1234""#, "3444004B8184C031");
    check_round_trip(abi, "name", r#""alaio""#, "0000000000EA4C34");
    check_round_trip(abi, "name", r#""zzzzzzzzzzzz""#, "F0FFFFFFFFFFFFFF");

    check_error(|| try_encode(abi, "name", "true"), "cannot convert given variant");
    check_error(|| try_encode(abi, "name", r#""ABC""#), "invalid character");
    check_error(|| try_encode(abi, "name", r#""abc.""#), "may not end with a dot");

    Ok(())
}

#[test]
fn roundtrip_bytes_and_strings() -> Result<()> {
    init();

    let abi = transaction_abi();

    check_round_trip(abi, "bytes", r#""""#, "00");
    check_round_trip(abi, "bytes", r#""00""#, "0100");
    check_round_trip2(abi, "bytes", r#""AABBCCDDEEFF00010203040506070809""#,
                      "10AABBCCDDEEFF00010203040506070809",
                      r#""aabbccddeeff00010203040506070809""#);

    check_error(|| try_decode(abi, "bytes", "01"), "stream ended");
    check_error(|| try_encode(abi, "bytes", r#""0""#), "Odd number of digits");
    check_error(|| try_encode(abi, "bytes", r#""yz""#), "Invalid character");
    check_error(|| try_encode(abi, "bytes", "true"), "cannot convert given variant");

    check_round_trip(abi, "string", r#""""#, "00");
    check_round_trip(abi, "string", r#""z""#, "017A");
    check_round_trip(abi, "string", r#""This is a string.""#, "1154686973206973206120737472696E672E");

    check_error(|| try_decode(abi, "string", "01"), "stream ended");
    check_error(|| try_decode(abi, "string", hex::encode(b"\x11invalid utf8: \xff\xfe\xfd")),
                "invalid utf-8 sequence");

    Ok(())
}

#[test]
fn roundtrip_crypto_types() -> Result<()> {
    init();

    let abi = transaction_abi();

    check_round_trip(abi, "checksum160",
                     r#""123456789abcdef01234567890abcdef70123456""#,
                     "123456789abcdef01234567890abcdef70123456");
    check_round_trip(abi, "checksum256",
                     r#""0987654321abcdef0987654321ffff1234567890abcdef001234567890abcdef""#,
                     "0987654321abcdef0987654321ffff1234567890abcdef001234567890abcdef");
    check_round_trip(abi, "checksum512",
                     r#""0987654321abcdef0987654321ffff1234567890abcdef001234567890abcdef0987654321abcdef0987654321ffff1234567890abcdef001234567890abcdef""#,
                     "0987654321abcdef0987654321ffff1234567890abcdef001234567890abcdef0987654321abcdef0987654321ffff1234567890abcdef001234567890abcdef");

    check_round_trip(abi, "public_key", r#""PUB_K1_11111111111111111111111111111111149Mr2R""#,
                     "00000000000000000000000000000000000000000000000000000000000000000000");
    check_round_trip(abi, "public_key", r#""PUB_K1_69X3383RzBZj41k73CSjUNXM5MYGpnDxyPnWUKPEtYQmVzqTY7""#,
                     "0002A5D2400AF24411F64C29DA2FE893FF2B6681A3B6FFBE980B2EE42AD10CC2E994");
    check_round_trip2(abi, "public_key", r#""ALA69X3383RzBZj41k73CSjUNXM5MYGpnDxyPnWUKPEtYQmTBWz4D""#,
                      "0002A5D2400AF24411F64C29DA2FE893FF2B6681A3B6FFBE980B2EE42AD10CC2E994",
                      r#""PUB_K1_69X3383RzBZj41k73CSjUNXM5MYGpnDxyPnWUKPEtYQmVzqTY7""#);

    check_round_trip(abi, "private_key", r#""PVT_R1_PtoxLPzJZURZmPS4e26pjBiAn41mkkLPrET5qHnwDvbvqFEL6""#,
                     "0133FB621E78D5DC78F0029B6FD714BFE3B42FE4B72BC109051591E71F204D2813");
    check_round_trip2(abi, "private_key", r#""5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3""#,
                      "00D2653FF7CBB2D8FF129AC27EF5781CE68B2558C41A74AF1F2DDCA635CBEEF07D",
                      r#""PVT_K1_2bfGi9rYsXQSXXTvJbDAPhHLQUojjaNLomdm3cEJ1XTzMqUt3V""#);

    check_round_trip(abi, "signature", r#""SIG_K1_Kg2UKjXTX48gw2wWH4zmsZmWu3yarcfC21Bd9JPj7QoDURqiAacCHmtExPk3syPb2tFLsp1R4ttXLXgr7FYgDvKPC5RCkx""#,
                     "002056355ED1079822D2728886B449F0F4A2BBF48BF38698C0EBE8C7079768882B1C64AC07D7A4BD85CF96B8A74FDCAFEF1A4805F946177C609FDF31ABE2463038E5");
    check_round_trip(abi, "signature", r#""SIG_R1_Kfh19CfEcQ6pxkMBz6xe9mtqKuPooaoyatPYWtwXbtwHUHU8YLzxPGvZhkqgnp82J41e9R6r5mcpnxy1wAf1w9Vyo9wybZ""#,
                     "012053A48D3BB9A321E4AE8F079EAB72EFA778C8C09BC4C2F734DE6D19AD9BCE6A137495D877D4E51A585376AA6C1A174295DABDB25286E803BF553735CD2D31B1FC");

    check_error(|| try_encode(abi, "checksum256", r#""xy""#), "Invalid character");
    check_error(|| try_encode(abi, "checksum256", r#""a0""#), "Invalid string length");
    check_error(|| try_encode(abi, "public_key", r#""foo""#), "not crypto data");
    check_error(|| try_encode(abi, "public_key", r#""PUB_WA_983AB8""#), "unsupported key type");
    check_error(|| try_decode(abi, "public_key", format!("02{}", "00".repeat(33))), "unsupported key type");
    check_error(|| try_encode(abi, "signature", r#""foo""#), "not crypto data");

    Ok(())
}

#[test]
fn roundtrip_symbols_and_assets() -> Result<()> {
    init();

    let abi = transaction_abi();

    check_round_trip(abi, "symbol_code", r#""A""#, "4100000000000000");
    check_round_trip(abi, "symbol_code", r#""SYS""#, "5359530000000000");
    check_round_trip(abi, "symbol", r#""0,A""#, "0041000000000000");
    check_round_trip(abi, "symbol", r#""1,Z""#, "015A000000000000");
    check_round_trip(abi, "symbol", r#""4,SYS""#, "0453595300000000");

    check_error(|| try_encode(abi, "symbol_code", r#""foo""#), "invalid symbol");
    check_error(|| try_encode(abi, "symbol", "null"), "cannot convert given variant");

    check_round_trip(abi, "asset", r#""0 FOO""#, "000000000000000000464F4F00000000");
    check_round_trip(abi, "asset", r#""0.000 FOO""#, "000000000000000003464F4F00000000");
    check_round_trip(abi, "asset", r#""1.2345 SYS""#, "39300000000000000453595300000000");
    check_round_trip(abi, "asset", r#""-1.2345 SYS""#, "C7CFFFFFFFFFFFFF0453595300000000");
    check_round_trip(abi, "asset", r#""0.00000005 ZYX""#, "0500000000000000085A595800000000");

    check_round_trip(abi, "asset[]", r#"[]"#, "00");
    check_round_trip(abi, "asset[]", r#"["0 FOO"]"#, "01000000000000000000464F4F00000000");
    check_round_trip(abi, "asset[]", r#"["0 FOO","0.000 FOO"]"#,
                     "02000000000000000000464F4F00000000000000000000000003464F4F00000000");
    check_round_trip(abi, "asset?", "null", "00");
    check_round_trip(abi, "asset?", r#""0.123456 SIX""#, "0140E20100000000000653495800000000");

    check_round_trip(abi, "extended_asset", r#"{"quantity":"0 FOO","contract":"bar"}"#,
                     "000000000000000000464F4F00000000000000000000AE39");
    check_round_trip(abi, "extended_asset", r#"{"quantity":"0.123456 SIX","contract":"seven"}"#,
                     "40E201000000000006534958000000000000000080A9B6C2");

    Ok(())
}


// -----------------------------------------------------------------------------
//     Structs, aliases, variants, optionals, extensions, recursion
// -----------------------------------------------------------------------------

#[test]
fn struct_with_base_chain() -> Result<()> {
    init();

    let abi = test_abi();

    check_round_trip(abi, "s1", r#"{"x1":1}"#, "01");
    check_round_trip(abi, "s2", r#"{"x1":1,"y1":2,"y2":3}"#, "010203");

    // aliases (even chained ones) resolve to the same struct
    check_round_trip(abi, "foo", r#"{"x1":1,"y1":2,"y2":3}"#, "010203");
    check_round_trip(abi, "bar", r#"{"x1":1,"y1":2,"y2":3}"#, "010203");

    // positional form
    check_round_trip2(abi, "s2", r#"[1,2,3]"#, "010203", r#"{"x1":1,"y1":2,"y2":3}"#);

    check_error(|| try_encode(abi, "s2", r#"{"x1":1,"y1":2}"#), "expected field 'y2'");
    check_error(|| try_encode(abi, "s2", r#"{"y1":2,"x1":1,"y2":3}"#), "expected field");
    check_error(|| try_encode(abi, "s2", r#"{"x1":1,"y1":2,"y2":3,"y3":4}"#), "unexpected field 'y3'");

    Ok(())
}

#[test]
fn struct_field_reordering() -> Result<()> {
    init();

    let abi = test_abi();
    let shuffled = r#"{"o":3,"va":["int32",4],"v":[1,2]}"#;
    let in_order = r#"{"v":[1,2],"o":3,"va":["int32",4]}"#;
    let hex = "02010000000200000001030000000004000000";

    // strict mode requires schema order
    check_round_trip(abi, "mixed", in_order, hex);
    check_error(|| try_encode(abi, "mixed", shuffled), "expected field 'v'");

    // reorderable mode accepts any order and produces identical binary
    let value: JsonValue = serde_json::from_str(shuffled)?;
    let bin = abi.variant_to_binary_reorderable("mixed", &value)?;
    assert_eq!(hex::encode(bin), hex);

    // absent optional is tolerated when reordering, and encodes as null
    let value: JsonValue = serde_json::from_str(r#"{"va":["string","hi"],"v":[]}"#)?;
    let bin = abi.variant_to_binary_reorderable("mixed", &value)?;
    assert_eq!(hex::encode(bin), "000001026869");

    // but a missing regular field is still an error
    let value: JsonValue = serde_json::from_str(r#"{"o":3,"va":["int32",4]}"#)?;
    check_error(|| Ok(abi.variant_to_binary_reorderable("mixed", &value)?), "missing field 'v'");

    Ok(())
}

#[test]
fn variants() -> Result<()> {
    init();

    let abi = test_abi();

    check_round_trip(abi, "v1", r#"["int8",5]"#, "0005");
    check_round_trip(abi, "v1", r#"["s1",{"x1":1}]"#, "0101");
    check_round_trip(abi, "v1", r#"["s2",{"x1":1,"y1":2,"y2":3}]"#, "02010203");
    check_round_trip(abi, "v2", r#"["string","hi"]"#, "01026869");

    check_error(|| try_encode(abi, "v1", r#"["int64",5]"#), "not valid within the variant");
    check_error(|| try_encode(abi, "v1", r#"[5]"#), "expected input to be an array of 2");
    check_error(|| try_encode(abi, "v1", r#"[5,5]"#), "expected variant typename to be a string");
    check_error(|| try_decode(abi, "v1", "0305"), "invalid tag");

    Ok(())
}

#[test]
fn binary_extensions() -> Result<()> {
    init();

    let abi = test_abi();

    // all three forms round-trip to the same (truncated) binary
    check_round_trip(abi, "s3", r#"{"z1":5}"#, "05");
    check_round_trip(abi, "s3", r#"{"z1":5,"z2":["int8",7]}"#, "050007");
    check_round_trip(abi, "s3", r#"{"z1":5,"z2":["int8",7],"z3":{"x1":1,"y1":2,"y2":3}}"#,
                     "050007010203");

    // a field cannot be present when an earlier extension field is absent
    check_error(|| try_encode(abi, "s3", r#"{"z1":5,"z3":{"x1":1,"y1":2,"y2":3}}"#),
                "absent extension field");

    // a struct whose fields are all extensions accepts empty binary input
    check_round_trip(abi, "s4", r#"{}"#, "");
    check_round_trip(abi, "s4", r#"{"a1":null}"#, "00");
    check_round_trip(abi, "s4", r#"{"a1":7}"#, "0107");
    check_round_trip(abi, "s4", r#"{"a1":null,"b1":[4,5]}"#, "00020405");

    // extensions of a nested (non-tail) struct cannot be exercised
    check_error(|| try_decode(abi, "s3", "0500"), "stream ended");

    Ok(())
}

#[test]
fn recursive_types() -> Result<()> {
    init();

    let abi = test_abi();

    check_round_trip(abi, "s5", r#"{"c1":1,"c2":[],"c3":null}"#, "010000");
    check_round_trip(abi, "s5", r#"{"c1":1,"c2":[{"c1":2,"c2":[],"c3":null}],"c3":null}"#,
                     "010102000000");
    check_round_trip(abi, "s6", r#"{"d1":{"c1":1,"c2":[],"c3":null}}"#, "010000");

    // nesting depth is bounded on both directions
    let mut deep = r#"{"c1":1,"c2":[],"c3":null}"#.to_owned();
    for _ in 0..100 {
        deep = format!(r#"{{"c1":1,"c2":[{}],"c3":null}}"#, deep);
    }
    check_error(|| try_encode(abi, "s5", &deep), "max recursion depth");
    check_error(|| try_decode(abi, "s5", hex::encode(vec![1_u8; 400])), "max recursion depth");

    Ok(())
}


// -----------------------------------------------------------------------------
//     Transactions
// -----------------------------------------------------------------------------

#[test]
fn roundtrip_transaction() -> Result<()> {
    init();

    let trx_abi = transaction_abi();
    let token_abi = &ABI::from_hex_abi(TOKEN_HEX_ABI)?;
    let packed_trx_abi_def = ABIDefinition::from_str(PACKED_TRANSACTION_ABI)?;
    let packed_trx_abi = &ABI::from_definition(&packed_trx_abi_def)?;

    check_round_trip(token_abi, "transfer",
                     r#"{"from":"useraaaaaaaa","to":"useraaaaaaab","quantity":"0.0001 SYS","memo":"test memo"}"#,
                     "608C31C6187315D6708C31C6187315D6010000000000000004535953000000000974657374206D656D6F");

    check_round_trip(trx_abi, "transaction",
                     r#"{"expiration":"2009-02-13T23:31:31.000","ref_block_num":1234,"ref_block_prefix":5678,"max_net_usage_words":0,"max_cpu_usage_ms":0,"delay_sec":0,"context_free_actions":[],"actions":[{"account":"alaio.token","name":"transfer","authorization":[{"actor":"useraaaaaaaa","permission":"active"}],"data":"608c31c6187315d6708c31c6187315d60100000000000000045359530000000000"}],"transaction_extensions":[]}"#,
                     "D3029649D2042E160000000000000100A6823403EA4C34000000572D3CCDCD01608C31C6187315D600000000A8ED323221608C31C6187315D6708C31C6187315D6010000000000000004535953000000000000");

    check_round_trip(
        packed_trx_abi, "packed_transaction_v0",
        r#"{"signatures":["SIG_K1_K5PGhrkUBkThs8zdTD9mGUJZvxL4eU46UjfYJSEdZ9PXS2Cgv5jAk57yTx4xnrdSocQm6DDvTaEJZi5WLBsoZC4XYNS8b3"],"compression":0,"packed_context_free_data":"","packed_trx":{"expiration":"2009-02-13T23:31:31.000","ref_block_num":1234,"ref_block_prefix":5678,"max_net_usage_words":0,"max_cpu_usage_ms":0,"delay_sec":0,"context_free_actions":[],"actions":[{"account":"alaio.token","name":"transfer","authorization":[{"actor":"useraaaaaaaa","permission":"active"}],"data":"608c31c6187315d6708c31c6187315d60100000000000000045359530000000000"}],"transaction_extensions":[]}}"#,
        "01001F4D6C791D32E38CA1A0A5F3139B8D1D521B641FE2EE675311FCA4C755ACDFCA2D13FE4DEE9953D2504FCB4382EEACBCEF90E3E8034BDD32EBA11F1904419DF6AF0000D3029649D2042E160000000000000100A6823403EA4C34000000572D3CCDCD01608C31C6187315D600000000A8ED323221608C31C6187315D6708C31C6187315D6010000000000000004535953000000000000"
    );

    Ok(())
}


// -----------------------------------------------------------------------------
//     The ABI as a codec subject
// -----------------------------------------------------------------------------

#[test]
fn abi_of_abi_round_trip() -> Result<()> {
    init();

    let mut ctx = AbiContext::new();

    // bin -> json
    let token_abi_bin = hex::decode(TOKEN_HEX_ABI)?;
    let json_repr = ctx.abi_bin_to_json(&token_abi_bin).map(str::to_owned);
    let json_repr = json_repr.ok_or_else(|| eyre!("conversion error: {}", ctx.error()))?;

    // json -> bin: the re-encoded form always carries the (empty) trailing
    // sections, so it grows by their two count bytes
    assert!(ctx.abi_json_to_bin(&json_repr), "{}", ctx.error());
    assert_eq!(ctx.bin_hex(), format!("{}0000", TOKEN_HEX_ABI));

    // every type accessible by name resolves identically in both forms
    let reparsed = ABI::from_bin_abi(ctx.bin_data())?;
    let original = ABI::from_hex_abi(TOKEN_HEX_ABI)?;
    for typename in ["transfer", "issue", "create", "account", "currency_stats", "account_name"] {
        assert!(original.is_type(typename.into()));
        assert!(reparsed.is_type(typename.into()));
    }
    assert_eq!(original.action_type(Name::new("transfer")?), Some("transfer"));
    assert_eq!(reparsed.action_type(Name::new("transfer")?), Some("transfer"));

    Ok(())
}


// -----------------------------------------------------------------------------
//     Context operations
// -----------------------------------------------------------------------------

#[test]
fn context_operations() -> Result<()> {
    init();

    let mut ctx = AbiContext::new();
    let token = Name::new("alaio.token")?;

    assert!(ctx.set_abi_hex(token, TOKEN_HEX_ABI), "{}", ctx.error());

    assert_eq!(ctx.get_type_for_action(token, Name::new("transfer")?), Some("transfer"));
    assert_eq!(ctx.get_type_for_table(token, Name::new("accounts")?), Some("account"));
    assert_eq!(ctx.get_type_for_action(token, Name::new("nope")?), None);
    assert!(ctx.error().contains("does not have action"));

    let transfer_json = r#"{"from":"useraaaaaaaa","to":"useraaaaaaab","quantity":"0.0001 SYS","memo":"test memo"}"#;
    let transfer_hex = "608c31c6187315d6708c31c6187315d6010000000000000004535953000000000974657374206d656d6f";

    assert!(ctx.json_to_bin(token, "transfer", transfer_json), "{}", ctx.error());
    assert_eq!(ctx.bin_hex(), transfer_hex);
    assert_eq!(ctx.bin_size(), transfer_hex.len() / 2);

    let decoded = ctx.hex_to_json(token, "transfer", transfer_hex)
        .ok_or_else(|| eyre!("conversion error"))?;
    assert_eq!(decoded, transfer_json);

    // reorderable variant accepts shuffled fields
    let shuffled = r#"{"to":"useraaaaaaab","memo":"test memo","from":"useraaaaaaaa","quantity":"0.0001 SYS"}"#;
    assert!(!ctx.json_to_bin(token, "transfer", shuffled));
    assert!(ctx.json_to_bin_reorderable(token, "transfer", shuffled), "{}", ctx.error());
    assert_eq!(ctx.bin_hex(), transfer_hex);

    // trailing bytes after the value are an error
    assert!(ctx.bin_to_json(token, "transfer", &hex::decode(format!("{transfer_hex}00"))?).is_none());
    assert!(ctx.error().contains("extra data"));

    // name conversions
    assert_eq!(ctx.string_to_name("alaio"), Some(0x344C_EA00_0000_0000));
    assert_eq!(ctx.name_to_string(0x344C_EA00_0000_0000), "alaio");
    assert!(ctx.string_to_name("Not A Name").is_none());

    Ok(())
}
