//! Conversion between node content and native values
//!
//! [`Encode`] and [`Decode`] form the conversion registry: implement them for
//! your own types to make them usable with `Node::set`, `Node::push`,
//! `Node::as_optional` and the rest. Built-in implementations cover the
//! primitives, strings, `Option`, `Vec`, maps and pairs.
//!
//! Scalar text follows the YAML conventions the node model comes from:
//! integers may be written in hex (`0x1F`) or octal (`0o17`), floats accept
//! `.inf`, `-.inf` and `.nan`, booleans accept `yes`/`no`/`on`/`off`.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::num::IntErrorKind;

use crate::errors::{ConversionError, ConversionResult};
use crate::node::Node;
use crate::types::NodeType;

/// Native value → node.
pub trait Encode {
    fn encode(&self) -> Node;
}

/// Node → native value. Must not mutate the node.
pub trait Decode: Sized {
    fn decode(node: &Node) -> ConversionResult<Self>;
}

impl Node {
    /// The converted value, or `None` when the content cannot be read as `T`.
    pub fn as_optional<T: Decode>(&self) -> Option<T> {
        match T::decode(self) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::trace!(
                    target_type = std::any::type_name::<T>(),
                    "conversion failed: {}",
                    e
                );
                None
            }
        }
    }

    /// The converted value, or `default` when the content cannot be read as `T`.
    pub fn as_or<T: Decode>(&self, default: T) -> T {
        self.as_optional().unwrap_or(default)
    }

    /// The converted value, or `T::default()`.
    pub fn as_or_default<T: Decode + Default>(&self) -> T {
        self.as_optional().unwrap_or_default()
    }

    /// Check whether the content converts to `T`, discarding the result.
    pub fn can_convert_to<T: Decode>(&self) -> bool {
        T::decode(self).is_ok()
    }

    /// Raw scalar text, or an empty string for any other node type.
    pub fn scalar(&self) -> String {
        match self.index {
            Some(idx) => self
                .tree
                .borrow()
                .scalar(idx)
                .map(str::to_string)
                .unwrap_or_default(),
            None => String::new(),
        }
    }

    fn scalar_text(&self) -> ConversionResult<String> {
        match self.node_type() {
            NodeType::Scalar => Ok(self.scalar()),
            found => Err(ConversionError::TypeMismatch {
                expected: NodeType::Scalar,
                found,
            }),
        }
    }
}

// Nodes ------------------------------------------------------------------------

impl Encode for Node {
    fn encode(&self) -> Node {
        self.clone()
    }
}

impl Decode for Node {
    fn decode(node: &Node) -> ConversionResult<Self> {
        Ok(node.clone())
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self) -> Node {
        (**self).encode()
    }
}

// Strings ----------------------------------------------------------------------

impl Encode for str {
    fn encode(&self) -> Node {
        Node::scalar_node(self)
    }
}

impl Encode for String {
    fn encode(&self) -> Node {
        Node::scalar_node(self.as_str())
    }
}

impl Decode for String {
    fn decode(node: &Node) -> ConversionResult<Self> {
        node.scalar_text()
    }
}

impl Encode for char {
    fn encode(&self) -> Node {
        Node::scalar_node(self.to_string())
    }
}

impl Decode for char {
    fn decode(node: &Node) -> ConversionResult<Self> {
        let text = node.scalar_text()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConversionError::invalid("char", &text)),
        }
    }
}

// Booleans ---------------------------------------------------------------------

impl Encode for bool {
    fn encode(&self) -> Node {
        Node::scalar_node(if *self { "true" } else { "false" })
    }
}

impl Decode for bool {
    fn decode(node: &Node) -> ConversionResult<Self> {
        let text = node.scalar_text()?;
        match text.as_str() {
            "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" | "y" | "Y" => {
                Ok(true)
            }
            "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" | "n"
            | "N" => Ok(false),
            _ => Err(ConversionError::invalid("bool", &text)),
        }
    }
}

// Integers ---------------------------------------------------------------------

/// Sign and magnitude of integer text, before narrowing to a target type.
struct Integer {
    negative: bool,
    magnitude: u128,
}

impl Integer {
    /// Magnitudes up to 2^127 fit when negative, which covers `i128::MIN`.
    fn signed(&self) -> Option<i128> {
        if self.negative {
            (self.magnitude <= 1u128 << 127).then(|| (self.magnitude as i128).wrapping_neg())
        } else {
            i128::try_from(self.magnitude).ok()
        }
    }

    /// Only `-0` is negative and in range.
    fn unsigned(&self) -> Option<u128> {
        (!self.negative || self.magnitude == 0).then_some(self.magnitude)
    }
}

/// Parse `[+-]digits`, `[+-]0x…` or `[+-]0o…`.
fn parse_integer(text: &str, target: &'static str) -> ConversionResult<Integer> {
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(oct) = unsigned
        .strip_prefix("0o")
        .or_else(|| unsigned.strip_prefix("0O"))
    {
        (8, oct)
    } else {
        (10, unsigned)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(ConversionError::invalid(target, text));
    }
    let magnitude = u128::from_str_radix(digits, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => ConversionError::out_of_range(target, text),
        _ => ConversionError::invalid(target, text),
    })?;
    Ok(Integer {
        negative,
        magnitude,
    })
}

macro_rules! integer_conversions {
    ($widen:ident => $($ty:ty),* $(,)?) => {$(
        impl Encode for $ty {
            fn encode(&self) -> Node {
                Node::scalar_node(self.to_string())
            }
        }

        impl Decode for $ty {
            fn decode(node: &Node) -> ConversionResult<Self> {
                let text = node.scalar_text()?;
                parse_integer(&text, stringify!($ty))?
                    .$widen()
                    .and_then(|value| <$ty>::try_from(value).ok())
                    .ok_or_else(|| ConversionError::out_of_range(stringify!($ty), &text))
            }
        }
    )*};
}

integer_conversions!(signed => i8, i16, i32, i64, i128, isize);
integer_conversions!(unsigned => u8, u16, u32, u64, u128, usize);

// Floats -----------------------------------------------------------------------

fn special_float(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ => None,
    }
}

/// Rust accepts `inf`/`nan` spelled out; YAML does not.
fn is_plain_number(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

macro_rules! float_conversions {
    ($($ty:ty),* $(,)?) => {$(
        impl Encode for $ty {
            fn encode(&self) -> Node {
                let text = if self.is_nan() {
                    ".nan".to_string()
                } else if self.is_infinite() {
                    if *self > 0.0 { ".inf" } else { "-.inf" }.to_string()
                } else {
                    self.to_string()
                };
                Node::scalar_node(text)
            }
        }

        impl Decode for $ty {
            fn decode(node: &Node) -> ConversionResult<Self> {
                let text = node.scalar_text()?;
                if let Some(special) = special_float(&text) {
                    return Ok(special as $ty);
                }
                if !is_plain_number(&text) {
                    return Err(ConversionError::invalid(stringify!($ty), &text));
                }
                let value: $ty = text
                    .parse()
                    .map_err(|_| ConversionError::invalid(stringify!($ty), &text))?;
                if value.is_infinite() {
                    return Err(ConversionError::out_of_range(stringify!($ty), &text));
                }
                Ok(value)
            }
        }
    )*};
}

float_conversions!(f32, f64);

// Containers -------------------------------------------------------------------

impl<T: Encode> Encode for Option<T> {
    fn encode(&self) -> Node {
        match self {
            Some(value) => value.encode(),
            None => Node::with_type(NodeType::Null),
        }
    }
}

/// Undefined and Null decode to `None`. Scalar text is never reinterpreted:
/// `"~"` stays a string, turning it into Null is the parser's call.
impl<T: Decode> Decode for Option<T> {
    fn decode(node: &Node) -> ConversionResult<Self> {
        match node.node_type() {
            NodeType::Undefined | NodeType::Null => Ok(None),
            _ => T::decode(node).map(Some),
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self) -> Node {
        let mut node = Node::with_type(NodeType::Sequence);
        for item in self {
            node.push(item);
        }
        node
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self) -> Node {
        self.as_slice().encode()
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(node: &Node) -> ConversionResult<Self> {
        match node.node_type() {
            NodeType::Sequence => node.iter().map(|entry| T::decode(&entry)).collect(),
            found => Err(ConversionError::TypeMismatch {
                expected: NodeType::Sequence,
                found,
            }),
        }
    }
}

impl<A: Encode, B: Encode> Encode for (A, B) {
    fn encode(&self) -> Node {
        let mut node = Node::with_type(NodeType::Sequence);
        node.push(&self.0);
        node.push(&self.1);
        node
    }
}

impl<A: Decode, B: Decode> Decode for (A, B) {
    fn decode(node: &Node) -> ConversionResult<Self> {
        if !node.is_sequence() {
            return Err(ConversionError::TypeMismatch {
                expected: NodeType::Sequence,
                found: node.node_type(),
            });
        }
        if node.size() != 2 {
            return Err(ConversionError::LengthMismatch {
                expected: 2,
                found: node.size(),
            });
        }
        Ok((A::decode(&node.get(0usize))?, B::decode(&node.get(1usize))?))
    }
}

fn encode_map<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>) -> Node
where
    K: Encode + 'a,
    V: Encode + 'a,
{
    let mut node = Node::with_type(NodeType::Map);
    for (key, value) in entries {
        node.force_insert(key, value);
    }
    node
}

fn decode_map<K: Decode, V: Decode>(node: &Node) -> ConversionResult<Vec<(K, V)>> {
    match node.node_type() {
        NodeType::Map => node
            .iter()
            .map(|entry| Ok((K::decode(entry.key())?, V::decode(entry.value())?)))
            .collect(),
        found => Err(ConversionError::TypeMismatch {
            expected: NodeType::Map,
            found,
        }),
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self) -> Node {
        encode_map(self.iter())
    }
}

/// Duplicate keys: the last entry wins.
impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode(node: &Node) -> ConversionResult<Self> {
        Ok(decode_map(node)?.into_iter().collect())
    }
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode(&self) -> Node {
        encode_map(self.iter())
    }
}

impl<K: Decode + Eq + Hash, V: Decode> Decode for HashMap<K, V> {
    fn decode(node: &Node) -> ConversionResult<Self> {
        Ok(decode_map(node)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("42", Some(42))]
    #[case("-17", Some(-17))]
    #[case("+5", Some(5))]
    #[case("0x1F", Some(31))]
    #[case("0o17", Some(15))]
    #[case("-0x10", Some(-16))]
    #[case("2147483648", None)]
    #[case("12abc", None)]
    #[case("", None)]
    #[case("--1", None)]
    #[case("0x", None)]
    #[case("1.5", None)]
    fn given_scalar_text_when_reading_i32_then_follows_integer_grammar(
        #[case] text: &str,
        #[case] expected: Option<i32>,
    ) {
        assert_eq!(Node::scalar_node(text).as_optional::<i32>(), expected);
    }

    fn survives<T: Encode + Decode + PartialEq>(value: T) -> bool {
        Node::from_value(&value).as_optional::<T>() == Some(value)
    }

    #[rstest]
    #[case::i8_min(survives(i8::MIN))]
    #[case::i8_max(survives(i8::MAX))]
    #[case::i16_min(survives(i16::MIN))]
    #[case::i16_max(survives(i16::MAX))]
    #[case::i32_min(survives(i32::MIN))]
    #[case::i32_max(survives(i32::MAX))]
    #[case::i64_min(survives(i64::MIN))]
    #[case::i64_max(survives(i64::MAX))]
    #[case::i128_min(survives(i128::MIN))]
    #[case::i128_max(survives(i128::MAX))]
    #[case::isize_min(survives(isize::MIN))]
    #[case::isize_max(survives(isize::MAX))]
    #[case::u8_min(survives(u8::MIN))]
    #[case::u8_max(survives(u8::MAX))]
    #[case::u16_min(survives(u16::MIN))]
    #[case::u16_max(survives(u16::MAX))]
    #[case::u32_min(survives(u32::MIN))]
    #[case::u32_max(survives(u32::MAX))]
    #[case::u64_min(survives(u64::MIN))]
    #[case::u64_max(survives(u64::MAX))]
    #[case::u128_min(survives(u128::MIN))]
    #[case::u128_max(survives(u128::MAX))]
    #[case::usize_min(survives(usize::MIN))]
    #[case::usize_max(survives(usize::MAX))]
    fn given_integer_bound_when_stored_and_read_then_preserved(#[case] preserved: bool) {
        assert!(preserved);
    }

    #[rstest]
    #[case("-170141183460469231731687303715884105729")]
    #[case("170141183460469231731687303715884105728")]
    #[case("-0x80000000000000000000000000000001")]
    fn given_text_past_i128_bounds_when_reading_i128_then_out_of_range(#[case] text: &str) {
        assert_eq!(
            i128::decode(&Node::scalar_node(text)),
            Err(ConversionError::out_of_range("i128", text))
        );
    }

    #[test]
    fn given_text_past_u128_max_when_reading_then_out_of_range() {
        let text = "340282366920938463463374607431768211456";
        assert_eq!(
            u128::decode(&Node::scalar_node(text)),
            Err(ConversionError::out_of_range("u128", text))
        );
        assert_eq!(Node::scalar_node("-0").as_optional::<u64>(), Some(0));
        assert_eq!(Node::scalar_node("-0x80").as_optional::<i8>(), Some(i8::MIN));
        assert_eq!(Node::scalar_node("-0x81").as_optional::<i8>(), None);
    }

    #[test]
    fn given_negative_text_when_reading_unsigned_then_fails_as_out_of_range() {
        let node = Node::scalar_node("-1");
        assert_eq!(
            u8::decode(&node),
            Err(ConversionError::out_of_range("u8", "-1"))
        );
        assert_eq!(Node::scalar_node("256").as_optional::<u8>(), None);
        assert_eq!(Node::scalar_node("255").as_optional::<u8>(), Some(255));
    }

    #[rstest]
    #[case("1.5", Some(1.5))]
    #[case("-2e3", Some(-2000.0))]
    #[case(".inf", Some(f64::INFINITY))]
    #[case("-.Inf", Some(f64::NEG_INFINITY))]
    #[case("inf", None)]
    #[case("1e400", None)]
    #[case("abc", None)]
    fn given_scalar_text_when_reading_f64_then_follows_float_grammar(
        #[case] text: &str,
        #[case] expected: Option<f64>,
    ) {
        assert_eq!(Node::scalar_node(text).as_optional::<f64>(), expected);
    }

    #[test]
    fn given_nan_text_when_reading_float_then_is_nan() {
        let value = Node::scalar_node(".nan").as_optional::<f64>().expect("nan parses");
        assert!(value.is_nan());
        assert_eq!(Node::from_value(&f64::NAN).scalar(), ".nan");
        assert_eq!(Node::from_value(&f32::NEG_INFINITY).scalar(), "-.inf");
    }

    #[rstest]
    #[case("true", Some(true))]
    #[case("Yes", Some(true))]
    #[case("ON", Some(true))]
    #[case("n", Some(false))]
    #[case("off", Some(false))]
    #[case("tRuE", None)]
    #[case("1", None)]
    fn given_scalar_text_when_reading_bool_then_accepts_yaml_spellings(
        #[case] text: &str,
        #[case] expected: Option<bool>,
    ) {
        assert_eq!(Node::scalar_node(text).as_optional::<bool>(), expected);
    }

    #[test]
    fn given_non_scalar_when_reading_string_then_reports_type_mismatch() {
        let node = Node::with_type(NodeType::Map);
        assert_eq!(
            String::decode(&node),
            Err(ConversionError::TypeMismatch {
                expected: NodeType::Scalar,
                found: NodeType::Map
            })
        );
    }

    #[test]
    fn given_char_when_decoding_then_requires_exactly_one_character() {
        assert_eq!(Node::scalar_node("x").as_optional::<char>(), Some('x'));
        assert_eq!(Node::scalar_node("xy").as_optional::<char>(), None);
        assert_eq!(Node::scalar_node("").as_optional::<char>(), None);
    }

    #[test]
    fn given_null_like_nodes_when_decoding_option_then_none() {
        assert_eq!(Node::new().as_optional::<Option<i32>>(), Some(None));
        assert_eq!(
            Node::with_type(NodeType::Null).as_optional::<Option<i32>>(),
            Some(None)
        );
        assert_eq!(Node::scalar_node("~").as_optional::<Option<i32>>(), None);
        assert_eq!(Node::scalar_node("3").as_optional::<Option<i32>>(), Some(Some(3)));
        assert_eq!(Node::scalar_node("x").as_optional::<Option<i32>>(), None);
        assert!(Node::from_value(&None::<i32>).is_null());
    }

    #[rstest]
    #[case("null")]
    #[case("~")]
    #[case("NULL")]
    fn given_null_like_text_when_stored_as_some_then_reads_back_as_text(#[case] text: &str) {
        let value = Some(text.to_string());
        let node = Node::from_value(&value);

        assert!(node.is_scalar());
        assert_eq!(node.as_optional::<Option<String>>(), Some(value));
    }

    #[test]
    fn given_pair_when_round_tripped_then_preserved() {
        let node = Node::from_value(&("a".to_string(), 1u8));
        assert!(node.is_sequence());
        assert_eq!(
            node.as_optional::<(String, u8)>(),
            Some(("a".to_string(), 1))
        );
    }

    #[test]
    fn given_duplicate_keys_when_decoding_btreemap_then_last_wins() {
        let mut node = Node::new();
        node.force_insert("a", &1);
        node.force_insert("a", &2);
        let map = node.as_optional::<BTreeMap<String, i32>>().expect("map decodes");
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], 2);
    }
}
