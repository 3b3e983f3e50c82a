//! SECS-II data items: the typed payload carried by a data message.
//!
//! The core only needs items to compare and render themselves.  Encoding
//! them onto the wire is the job of the codec that sits next to the
//! connection layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Indentation added for each nesting level of a list.
const NESTED_INDENT: &str = "  ";

/// SECS-II item format codes (upper six bits of the format byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ItemFormat {
    List = 0o00,
    Binary = 0o10,
    Boolean = 0o11,
    Ascii = 0o20,
    I8 = 0o30,
    I1 = 0o31,
    I2 = 0o32,
    I4 = 0o34,
    F8 = 0o40,
    F4 = 0o44,
    U8 = 0o50,
    U1 = 0o51,
    U2 = 0o52,
    U4 = 0o54,
}

impl ItemFormat {
    /// Short SML mnemonic for the format.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            ItemFormat::List => "L",
            ItemFormat::Binary => "B",
            ItemFormat::Boolean => "BOOLEAN",
            ItemFormat::Ascii => "A",
            ItemFormat::I8 => "I8",
            ItemFormat::I1 => "I1",
            ItemFormat::I2 => "I2",
            ItemFormat::I4 => "I4",
            ItemFormat::F8 => "F8",
            ItemFormat::F4 => "F4",
            ItemFormat::U8 => "U8",
            ItemFormat::U1 => "U1",
            ItemFormat::U2 => "U2",
            ItemFormat::U4 => "U4",
        }
    }
}

impl TryFrom<u8> for ItemFormat {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0o00 => Ok(ItemFormat::List),
            0o10 => Ok(ItemFormat::Binary),
            0o11 => Ok(ItemFormat::Boolean),
            0o20 => Ok(ItemFormat::Ascii),
            0o30 => Ok(ItemFormat::I8),
            0o31 => Ok(ItemFormat::I1),
            0o32 => Ok(ItemFormat::I2),
            0o34 => Ok(ItemFormat::I4),
            0o40 => Ok(ItemFormat::F8),
            0o44 => Ok(ItemFormat::F4),
            0o50 => Ok(ItemFormat::U8),
            0o51 => Ok(ItemFormat::U1),
            0o52 => Ok(ItemFormat::U2),
            0o54 => Ok(ItemFormat::U4),
            _ => Err(()),
        }
    }
}

/// Value held by a [`DataItem`], one variant per SECS-II format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemValue {
    List(Vec<DataItem>),
    Binary(Vec<u8>),
    Boolean(Vec<bool>),
    Ascii(String),
    I1(Vec<i8>),
    I2(Vec<i16>),
    I4(Vec<i32>),
    I8(Vec<i64>),
    U1(Vec<u8>),
    U2(Vec<u16>),
    U4(Vec<u32>),
    U8(Vec<u64>),
    F4(Vec<f32>),
    F8(Vec<f64>),
}

/// A single SECS-II data item with an optional descriptive name.
///
/// The name is a diagnostic label (e.g. `"SVID"`) and takes part in
/// equality, so two items only compare equal when both their names and
/// values match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    name: String,
    value: ItemValue,
}

impl DataItem {
    /// Creates an unnamed item holding `value`.
    pub fn new(value: ItemValue) -> Self {
        Self {
            name: String::new(),
            value,
        }
    }

    /// Returns this item with its name replaced by `name`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn list(children: impl IntoIterator<Item = DataItem>) -> Self {
        Self::new(ItemValue::List(children.into_iter().collect()))
    }

    pub fn ascii(text: impl Into<String>) -> Self {
        Self::new(ItemValue::Ascii(text.into()))
    }

    pub fn binary(bytes: Vec<u8>) -> Self {
        Self::new(ItemValue::Binary(bytes))
    }

    pub fn boolean(values: Vec<bool>) -> Self {
        Self::new(ItemValue::Boolean(values))
    }

    pub fn u1(values: Vec<u8>) -> Self {
        Self::new(ItemValue::U1(values))
    }

    pub fn u2(values: Vec<u16>) -> Self {
        Self::new(ItemValue::U2(values))
    }

    pub fn u4(values: Vec<u32>) -> Self {
        Self::new(ItemValue::U4(values))
    }

    pub fn u8(values: Vec<u64>) -> Self {
        Self::new(ItemValue::U8(values))
    }

    pub fn i1(values: Vec<i8>) -> Self {
        Self::new(ItemValue::I1(values))
    }

    pub fn i2(values: Vec<i16>) -> Self {
        Self::new(ItemValue::I2(values))
    }

    pub fn i4(values: Vec<i32>) -> Self {
        Self::new(ItemValue::I4(values))
    }

    pub fn i8(values: Vec<i64>) -> Self {
        Self::new(ItemValue::I8(values))
    }

    pub fn f4(values: Vec<f32>) -> Self {
        Self::new(ItemValue::F4(values))
    }

    pub fn f8(values: Vec<f64>) -> Self {
        Self::new(ItemValue::F8(values))
    }

    /// Descriptive name; empty when unnamed.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &ItemValue {
        &self.value
    }

    /// Returns the SECS-II format of this item.
    pub fn format(&self) -> ItemFormat {
        match &self.value {
            ItemValue::List(_) => ItemFormat::List,
            ItemValue::Binary(_) => ItemFormat::Binary,
            ItemValue::Boolean(_) => ItemFormat::Boolean,
            ItemValue::Ascii(_) => ItemFormat::Ascii,
            ItemValue::I1(_) => ItemFormat::I1,
            ItemValue::I2(_) => ItemFormat::I2,
            ItemValue::I4(_) => ItemFormat::I4,
            ItemValue::I8(_) => ItemFormat::I8,
            ItemValue::U1(_) => ItemFormat::U1,
            ItemValue::U2(_) => ItemFormat::U2,
            ItemValue::U4(_) => ItemFormat::U4,
            ItemValue::U8(_) => ItemFormat::U8,
            ItemValue::F4(_) => ItemFormat::F4,
            ItemValue::F8(_) => ItemFormat::F8,
        }
    }

    /// Number of elements: children for a list, bytes for ASCII text,
    /// values for every other format.
    pub fn len(&self) -> usize {
        match &self.value {
            ItemValue::List(v) => v.len(),
            ItemValue::Binary(v) => v.len(),
            ItemValue::Boolean(v) => v.len(),
            ItemValue::Ascii(s) => s.len(),
            ItemValue::I1(v) => v.len(),
            ItemValue::I2(v) => v.len(),
            ItemValue::I4(v) => v.len(),
            ItemValue::I8(v) => v.len(),
            ItemValue::U1(v) => v.len(),
            ItemValue::U2(v) => v.len(),
            ItemValue::U4(v) => v.len(),
            ItemValue::U8(v) => v.len(),
            ItemValue::F4(v) => v.len(),
            ItemValue::F8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the item in SML-like notation, each line prefixed by `indent`.
    ///
    /// Lists render one child per line, nested one level deeper:
    ///
    /// ```text
    /// <L[2]
    ///   <U4[1] 1001>  // SVID
    ///   <A[2] "OK">
    /// >
    /// ```
    pub fn render(&self, indent: &str) -> String {
        let mut out = String::new();
        self.render_into(&mut out, indent);
        out
    }

    fn render_into(&self, out: &mut String, indent: &str) {
        let head = format!("{indent}<{}[{}]", self.format().mnemonic(), self.len());
        out.push_str(&head);

        if let ItemValue::List(children) = &self.value {
            self.push_name(out);
            let nested = format!("{indent}{NESTED_INDENT}");
            for child in children {
                out.push('\n');
                child.render_into(out, &nested);
            }
            if !children.is_empty() {
                out.push('\n');
                out.push_str(indent);
            }
            out.push('>');
            return;
        }

        let body = self.render_values();
        if !body.is_empty() {
            out.push(' ');
            out.push_str(&body);
        }
        out.push('>');
        self.push_name(out);
    }

    fn push_name(&self, out: &mut String) {
        if !self.name.is_empty() {
            out.push_str("  // ");
            out.push_str(&self.name);
        }
    }

    fn render_values(&self) -> String {
        fn join<T: fmt::Display>(values: &[T]) -> String {
            values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        }

        match &self.value {
            ItemValue::List(_) => String::new(),
            ItemValue::Ascii(s) => format!("{s:?}"),
            ItemValue::Binary(v) => v
                .iter()
                .map(|b| format!("0x{b:02X}"))
                .collect::<Vec<_>>()
                .join(" "),
            ItemValue::Boolean(v) => v
                .iter()
                .map(|b| if *b { "T" } else { "F" })
                .collect::<Vec<_>>()
                .join(" "),
            ItemValue::I1(v) => join(v),
            ItemValue::I2(v) => join(v),
            ItemValue::I4(v) => join(v),
            ItemValue::I8(v) => join(v),
            ItemValue::U1(v) => join(v),
            ItemValue::U2(v) => join(v),
            ItemValue::U4(v) => join(v),
            ItemValue::U8(v) => join(v),
            ItemValue::F4(v) => join(v),
            ItemValue::F8(v) => join(v),
        }
    }
}

impl fmt::Display for DataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_format_try_from_known_codes() {
        assert_eq!(ItemFormat::try_from(0o20), Ok(ItemFormat::Ascii));
        assert_eq!(ItemFormat::try_from(0o54), Ok(ItemFormat::U4));
        assert_eq!(ItemFormat::try_from(0o00), Ok(ItemFormat::List));
    }

    #[test]
    fn test_item_format_try_from_rejects_unknown_code() {
        assert_eq!(ItemFormat::try_from(0o77), Err(()));
    }

    #[test]
    fn test_format_matches_constructor() {
        assert_eq!(DataItem::ascii("x").format(), ItemFormat::Ascii);
        assert_eq!(DataItem::f8(vec![1.5]).format(), ItemFormat::F8);
        assert_eq!(DataItem::list(vec![]).format(), ItemFormat::List);
    }

    #[test]
    fn test_len_counts_elements() {
        assert_eq!(DataItem::ascii("hello").len(), 5);
        assert_eq!(DataItem::u2(vec![1, 2, 3]).len(), 3);
        assert!(DataItem::binary(Vec::new()).is_empty());
    }

    #[test]
    fn test_equality_includes_name_and_value() {
        let a = DataItem::u4(vec![7]).named("SVID");

        assert_eq!(a, DataItem::u4(vec![7]).named("SVID"));
        assert_ne!(a, DataItem::u4(vec![7]));
        assert_ne!(a, DataItem::u4(vec![8]).named("SVID"));
        assert_ne!(a, DataItem::u2(vec![7]).named("SVID"));
    }

    #[test]
    fn test_render_scalar_items() {
        assert_eq!(DataItem::ascii("OK").render("  "), "  <A[2] \"OK\">");
        assert_eq!(DataItem::u4(vec![1, 2]).render(""), "<U4[2] 1 2>");
        assert_eq!(DataItem::binary(vec![0x0A]).render(""), "<B[1] 0x0A>");
        assert_eq!(DataItem::boolean(vec![true, false]).render(""), "<BOOLEAN[2] T F>");
        assert_eq!(DataItem::i1(Vec::new()).render(""), "<I1[0]>");
    }

    #[test]
    fn test_render_appends_name() {
        let item = DataItem::u4(vec![1001]).named("SVID");

        assert_eq!(item.to_string(), "<U4[1] 1001>  // SVID");
    }

    #[test]
    fn test_render_nested_list() {
        // Arrange
        let item = DataItem::list(vec![
            DataItem::u4(vec![1001]),
            DataItem::list(vec![DataItem::ascii("OK")]),
        ]);

        // Act
        let rendered = item.render("  ");

        // Assert
        let expected = "  <L[2]\n    <U4[1] 1001>\n    <L[1]\n      <A[2] \"OK\">\n    >\n  >";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_empty_list_stays_on_one_line() {
        assert_eq!(DataItem::list(vec![]).render(""), "<L[0]>");
    }
}
