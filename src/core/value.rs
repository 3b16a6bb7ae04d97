//! Purpose: Column value kinds and the payload codecs that turn raw cell bytes into text.
//! Exports: `ValueKind`, `hex_string`.
//! Role: Stand-in for the storage type system; every decoded cell goes through here.
//! Invariants: Rendering is pure; the same payload and kind always give the same text.
//! Invariants: An empty payload is an "empty value" and renders as the empty string.
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use time::OffsetDateTime;

use crate::core::error::{Error, ErrorKind, decode_error};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValueKind {
    Ascii,
    Text,
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Counter,
    Float,
    Double,
    Timestamp,
    Uuid,
    TimeUuid,
    Inet,
    Blob,
    List(Box<ValueKind>),
    Set(Box<ValueKind>),
    Map(Box<ValueKind>, Box<ValueKind>),
}

impl ValueKind {
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            ValueKind::List(_) | ValueKind::Set(_) | ValueKind::Map(_, _)
        )
    }

    /// Kinds whose payload is an 8-byte big-endian integer interchangeable with a timestamp.
    pub fn is_timestamp_compatible(&self) -> bool {
        matches!(
            self,
            ValueKind::Timestamp | ValueKind::BigInt | ValueKind::Counter
        )
    }

    /// Canonical text form of `payload` for this kind.
    pub fn render(&self, payload: &[u8]) -> Result<String, Error> {
        if payload.is_empty() {
            return Ok(String::new());
        }
        match self {
            ValueKind::Ascii => {
                if !payload.is_ascii() {
                    return Err(decode_error("non-ascii byte in ascii value"));
                }
                render_utf8(payload)
            }
            ValueKind::Text => render_utf8(payload),
            ValueKind::Boolean => {
                let [byte] = fixed::<1>(payload, self)?;
                Ok((byte != 0).to_string())
            }
            ValueKind::TinyInt => Ok(i8::from_be_bytes(fixed(payload, self)?).to_string()),
            ValueKind::SmallInt => Ok(i16::from_be_bytes(fixed(payload, self)?).to_string()),
            ValueKind::Int => Ok(i32::from_be_bytes(fixed(payload, self)?).to_string()),
            ValueKind::BigInt | ValueKind::Counter => {
                Ok(i64::from_be_bytes(fixed(payload, self)?).to_string())
            }
            ValueKind::Float => {
                let value = f32::from_be_bytes(fixed(payload, self)?);
                Ok(float_text(value, f64::from(value)))
            }
            ValueKind::Double => {
                let value = f64::from_be_bytes(fixed(payload, self)?);
                Ok(float_text(value, value))
            }
            ValueKind::Timestamp => {
                Ok(format_timestamp(i64::from_be_bytes(fixed(payload, self)?)))
            }
            ValueKind::Uuid | ValueKind::TimeUuid => Ok(format_uuid(&fixed::<16>(payload, self)?)),
            ValueKind::Inet => render_inet(payload),
            ValueKind::Blob => Ok(hex_string(payload)),
            ValueKind::List(_) | ValueKind::Set(_) | ValueKind::Map(_, _) => {
                self.render_collection(payload)
            }
        }
    }

    /// Raw 64-bit integer behind a timestamp-compatible payload, as plain digits.
    pub fn raw_integer(&self, payload: &[u8]) -> Result<String, Error> {
        if payload.is_empty() {
            return Ok(String::new());
        }
        Ok(i64::from_be_bytes(fixed(payload, self)?).to_string())
    }

    fn render_collection(&self, payload: &[u8]) -> Result<String, Error> {
        let mut reader = CollectionReader::new(payload);
        let count = reader.read_count()?;
        let rendered = match self {
            ValueKind::List(elem) => {
                let items = reader.render_elements(count, elem)?;
                format!("[{}]", items.join(", "))
            }
            ValueKind::Set(elem) => {
                let items = reader.render_elements(count, elem)?;
                format!("[{}]", items.join(", "))
            }
            ValueKind::Map(key, value) => {
                let mut entries = Vec::new();
                for _ in 0..count {
                    let key_text = render_element(reader.read_element()?, key)?;
                    let value_text = render_element(reader.read_element()?, value)?;
                    entries.push(format!("{key_text}={value_text}"));
                }
                format!("{{{}}}", entries.join(", "))
            }
            _ => return Err(Error::new(ErrorKind::Internal).with_message("not a collection")),
        };
        reader.finish()?;
        Ok(rendered)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Ascii => f.write_str("ascii"),
            ValueKind::Text => f.write_str("text"),
            ValueKind::Boolean => f.write_str("boolean"),
            ValueKind::TinyInt => f.write_str("tinyint"),
            ValueKind::SmallInt => f.write_str("smallint"),
            ValueKind::Int => f.write_str("int"),
            ValueKind::BigInt => f.write_str("bigint"),
            ValueKind::Counter => f.write_str("counter"),
            ValueKind::Float => f.write_str("float"),
            ValueKind::Double => f.write_str("double"),
            ValueKind::Timestamp => f.write_str("timestamp"),
            ValueKind::Uuid => f.write_str("uuid"),
            ValueKind::TimeUuid => f.write_str("timeuuid"),
            ValueKind::Inet => f.write_str("inet"),
            ValueKind::Blob => f.write_str("blob"),
            ValueKind::List(elem) => write!(f, "list<{elem}>"),
            ValueKind::Set(elem) => write!(f, "set<{elem}>"),
            ValueKind::Map(key, value) => write!(f, "map<{key}, {value}>"),
        }
    }
}

impl FromStr for ValueKind {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let name = input.trim();
        if let Some(open) = name.find('<') {
            let Some(inner) = name[open + 1..].strip_suffix('>') else {
                return Err(unknown_type(input));
            };
            let args = split_type_args(inner)
                .into_iter()
                .map(str::parse::<ValueKind>)
                .collect::<Result<Vec<_>, _>>()?;
            let outer = name[..open].trim().to_ascii_lowercase();
            return match (outer.as_str(), args.as_slice()) {
                ("frozen", [elem]) => Ok(elem.clone()),
                ("list", [elem]) => Ok(ValueKind::List(Box::new(elem.clone()))),
                ("set", [elem]) => Ok(ValueKind::Set(Box::new(elem.clone()))),
                ("map", [key, value]) => Ok(ValueKind::Map(
                    Box::new(key.clone()),
                    Box::new(value.clone()),
                )),
                _ => Err(unknown_type(input)),
            };
        }
        match name.to_ascii_lowercase().as_str() {
            "ascii" => Ok(ValueKind::Ascii),
            "text" | "varchar" => Ok(ValueKind::Text),
            "boolean" => Ok(ValueKind::Boolean),
            "tinyint" => Ok(ValueKind::TinyInt),
            "smallint" => Ok(ValueKind::SmallInt),
            "int" => Ok(ValueKind::Int),
            "bigint" => Ok(ValueKind::BigInt),
            "counter" => Ok(ValueKind::Counter),
            "float" => Ok(ValueKind::Float),
            "double" => Ok(ValueKind::Double),
            "timestamp" => Ok(ValueKind::Timestamp),
            "uuid" => Ok(ValueKind::Uuid),
            "timeuuid" => Ok(ValueKind::TimeUuid),
            "inet" => Ok(ValueKind::Inet),
            "blob" => Ok(ValueKind::Blob),
            _ => Err(unknown_type(input)),
        }
    }
}

fn unknown_type(input: &str) -> Error {
    Error::new(ErrorKind::Usage)
        .with_message(format!("unknown column type `{}`", input.trim()))
        .with_hint("Use a CQL type name such as int, text, timestamp, or list<int>.")
}

// Splits on commas that are not nested inside another `<...>`.
fn split_type_args(inner: &str) -> Vec<&str> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(&inner[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    args.push(&inner[start..]);
    args
}

pub fn hex_string(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

fn fixed<const N: usize>(payload: &[u8], kind: &ValueKind) -> Result<[u8; N], Error> {
    payload.try_into().map_err(|_| {
        decode_error(format!(
            "expected {N} bytes for {kind}, got {}",
            payload.len()
        ))
    })
}

fn render_utf8(payload: &[u8]) -> Result<String, Error> {
    std::str::from_utf8(payload)
        .map(str::to_owned)
        .map_err(|err| decode_error("invalid utf-8 in text value").with_source(err))
}

fn render_inet(payload: &[u8]) -> Result<String, Error> {
    let addr = match payload.len() {
        4 => IpAddr::V4(Ipv4Addr::from(fixed::<4>(payload, &ValueKind::Inet)?)),
        16 => IpAddr::V6(Ipv6Addr::from(fixed::<16>(payload, &ValueKind::Inet)?)),
        len => {
            return Err(decode_error(format!(
                "expected 4 or 16 bytes for inet, got {len}"
            )));
        }
    };
    Ok(addr.to_string())
}

// Outside the representable calendar range the raw millisecond count is shown instead.
fn format_timestamp(millis: i64) -> String {
    let nanos = i128::from(millis) * 1_000_000;
    match OffsetDateTime::from_unix_timestamp_nanos(nanos) {
        Ok(ts) => format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}Z",
            ts.year(),
            u8::from(ts.month()),
            ts.day(),
            ts.hour(),
            ts.minute(),
            ts.second(),
            ts.millisecond()
        ),
        Err(_) => millis.to_string(),
    }
}

// Plain decimal inside [1e-3, 1e7), otherwise `d.dddE<exp>`; a fractional digit is always shown.
fn float_text<T: fmt::Display + fmt::LowerExp>(value: T, wide: f64) -> String {
    if wide.is_nan() {
        return "NaN".to_string();
    }
    if wide.is_infinite() {
        let text = if wide > 0.0 { "Infinity" } else { "-Infinity" };
        return text.to_string();
    }
    let magnitude = wide.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let text = value.to_string();
        return if text.contains('.') {
            text
        } else {
            format!("{text}.0")
        };
    }
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}

fn format_uuid(bytes: &[u8; 16]) -> String {
    let hex = hex_string(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

fn render_element(element: Option<&[u8]>, kind: &ValueKind) -> Result<String, Error> {
    match element {
        Some(bytes) => kind.render(bytes),
        None => Ok("null".to_string()),
    }
}

// Cursor over the length-prefixed collection layout:
// i32 count, then per element an i32 length (negative = null) and the bytes.
struct CollectionReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> CollectionReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn read_i32(&mut self) -> Result<i32, Error> {
        let bytes = self.take(4)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(bytes);
        Ok(i32::from_be_bytes(out))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                decode_error(format!(
                    "collection truncated at offset {} (need {len} more bytes)",
                    self.offset
                ))
            })?;
        let bytes = &self.buf[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn read_count(&mut self) -> Result<usize, Error> {
        let count = self.read_i32()?;
        usize::try_from(count)
            .map_err(|_| decode_error(format!("negative collection size {count}")))
    }

    fn read_element(&mut self) -> Result<Option<&'a [u8]>, Error> {
        let len = self.read_i32()?;
        match usize::try_from(len) {
            Ok(len) => self.take(len).map(Some),
            Err(_) => Ok(None),
        }
    }

    fn render_elements(&mut self, count: usize, elem: &ValueKind) -> Result<Vec<String>, Error> {
        let mut items = Vec::new();
        for _ in 0..count {
            items.push(render_element(self.read_element()?, elem)?);
        }
        Ok(items)
    }

    fn finish(&self) -> Result<(), Error> {
        let trailing = self.buf.len() - self.offset;
        if trailing > 0 {
            return Err(decode_error(format!(
                "{trailing} trailing bytes after collection"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ValueKind, hex_string};
    use crate::core::error::ErrorKind;

    fn collection(elements: &[Option<&[u8]>]) -> Vec<u8> {
        let mut buf = (elements.len() as i32).to_be_bytes().to_vec();
        for element in elements {
            match element {
                Some(bytes) => {
                    buf.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                    buf.extend_from_slice(bytes);
                }
                None => buf.extend_from_slice(&(-1i32).to_be_bytes()),
            }
        }
        buf
    }

    #[test]
    fn fixed_width_numbers_render_as_digits() {
        assert_eq!(ValueKind::Int.render(&42i32.to_be_bytes()).unwrap(), "42");
        assert_eq!(ValueKind::BigInt.render(&(-7i64).to_be_bytes()).unwrap(), "-7");
        assert_eq!(ValueKind::SmallInt.render(&300i16.to_be_bytes()).unwrap(), "300");
        assert_eq!(ValueKind::TinyInt.render(&[0xff]).unwrap(), "-1");
        assert_eq!(ValueKind::Boolean.render(&[1]).unwrap(), "true");
        assert_eq!(ValueKind::Double.render(&1.0f64.to_be_bytes()).unwrap(), "1.0");
        assert_eq!(ValueKind::Float.render(&2.5f32.to_be_bytes()).unwrap(), "2.5");
    }

    #[test]
    fn wrong_width_is_a_decode_error() {
        let err = ValueKind::Int.render(&[0, 0, 1]).expect_err("short int");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.message(), Some("expected 4 bytes for int, got 3"));
    }

    #[test]
    fn empty_payload_is_empty_text() {
        assert_eq!(ValueKind::Int.render(&[]).unwrap(), "");
        assert_eq!(ValueKind::Timestamp.raw_integer(&[]).unwrap(), "");
    }

    #[test]
    fn text_rejects_invalid_utf8() {
        assert_eq!(ValueKind::Text.render("Alice".as_bytes()).unwrap(), "Alice");
        let err = ValueKind::Text.render(&[0xc3, 0x28]).expect_err("bad utf8");
        assert_eq!(err.kind(), ErrorKind::Decode);
        let err = ValueKind::Ascii.render("héllo".as_bytes()).expect_err("non-ascii");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn timestamp_renders_utc_millis() {
        let payload = 1_700_000_000_123i64.to_be_bytes();
        assert_eq!(
            ValueKind::Timestamp.render(&payload).unwrap(),
            "2023-11-14 22:13:20.123Z"
        );
        assert_eq!(
            ValueKind::Timestamp.raw_integer(&payload).unwrap(),
            "1700000000123"
        );
        assert_eq!(
            ValueKind::Timestamp.render(&0i64.to_be_bytes()).unwrap(),
            "1970-01-01 00:00:00.000Z"
        );
    }

    #[test]
    fn timestamps_beyond_four_digit_years_still_render() {
        let year_10000 = 253_402_300_800_000i64.to_be_bytes();
        let text = ValueKind::Timestamp.render(&year_10000).expect("year 10000");
        assert!(text.ends_with("10000-01-01 00:00:00.000Z"), "{text}");
        assert_eq!(
            ValueKind::Timestamp.render(&(-1i64).to_be_bytes()).unwrap(),
            "1969-12-31 23:59:59.999Z"
        );
        assert_eq!(
            ValueKind::Timestamp.render(&i64::MAX.to_be_bytes()).unwrap(),
            "9223372036854775807"
        );
        assert_eq!(
            ValueKind::Timestamp.render(&i64::MIN.to_be_bytes()).unwrap(),
            "-9223372036854775808"
        );
    }

    #[test]
    fn floats_keep_a_fraction_and_use_jvm_exponent_form() {
        let double = |value: f64| ValueKind::Double.render(&value.to_be_bytes()).unwrap();
        let float = |value: f32| ValueKind::Float.render(&value.to_be_bytes()).unwrap();
        assert_eq!(double(100.0), "100.0");
        assert_eq!(double(1234.5), "1234.5");
        assert_eq!(double(-0.0), "-0.0");
        assert_eq!(double(1e16), "1.0E16");
        assert_eq!(double(1.5e-7), "1.5E-7");
        assert_eq!(double(12_345_678.9), "1.23456789E7");
        assert_eq!(float(1e-7), "1.0E-7");
        assert_eq!(float(1e7), "1.0E7");
        assert_eq!(float(0.001), "0.001");
        assert_eq!(double(f64::INFINITY), "Infinity");
        assert_eq!(double(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(float(f32::NAN), "NaN");
    }

    #[test]
    fn uuid_inet_and_blob_render() {
        let uuid: Vec<u8> = (0u8..16).collect();
        assert_eq!(
            ValueKind::Uuid.render(&uuid).unwrap(),
            "00010203-0405-0607-0809-0a0b0c0d0e0f"
        );
        assert_eq!(ValueKind::Inet.render(&[127, 0, 0, 1]).unwrap(), "127.0.0.1");
        assert_eq!(ValueKind::Blob.render(&[0xde, 0xad]).unwrap(), "dead");
        assert_eq!(hex_string(&[0x00, 0x0f, 0xf0]), "000ff0");
    }

    #[test]
    fn collections_render_elements_recursively() {
        let one: &[u8] = &1i32.to_be_bytes();
        let two: &[u8] = &2i32.to_be_bytes();
        let list = collection(&[Some(one), None, Some(two)]);
        let kind: ValueKind = "list<int>".parse().unwrap();
        assert_eq!(kind.render(&list).unwrap(), "[1, null, 2]");

        let set = collection(&[Some("a".as_bytes()), Some("b".as_bytes())]);
        let kind: ValueKind = "set<text>".parse().unwrap();
        assert_eq!(kind.render(&set).unwrap(), "[a, b]");

        let mut map = 1i32.to_be_bytes().to_vec();
        map.extend_from_slice(&collection(&[Some("k".as_bytes()), Some(one)])[4..]);
        let kind: ValueKind = "map<text, int>".parse().unwrap();
        assert_eq!(kind.render(&map).unwrap(), "{k=1}");
    }

    #[test]
    fn truncated_collection_is_a_decode_error() {
        let one: &[u8] = &1i32.to_be_bytes();
        let mut list = collection(&[Some(one)]);
        list.truncate(list.len() - 1);
        let err = ValueKind::List(Box::new(ValueKind::Int))
            .render(&list)
            .expect_err("truncated");
        assert_eq!(err.kind(), ErrorKind::Decode);

        let mut trailing = collection(&[]);
        trailing.push(0);
        let err = ValueKind::Set(Box::new(ValueKind::Int))
            .render(&trailing)
            .expect_err("trailing");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn type_names_parse_with_nesting() {
        let kind: ValueKind = "map<text, frozen<list<int>>>".parse().unwrap();
        assert_eq!(
            kind,
            ValueKind::Map(
                Box::new(ValueKind::Text),
                Box::new(ValueKind::List(Box::new(ValueKind::Int)))
            )
        );
        assert_eq!(kind.to_string(), "map<text, list<int>>");
        assert_eq!("VARCHAR".parse::<ValueKind>().unwrap(), ValueKind::Text);
        let err = "decimal".parse::<ValueKind>().expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!("list<int".parse::<ValueKind>().is_err());
    }

    #[test]
    fn capability_checks() {
        assert!(ValueKind::Timestamp.is_timestamp_compatible());
        assert!(ValueKind::BigInt.is_timestamp_compatible());
        assert!(!ValueKind::Int.is_timestamp_compatible());
        assert!(ValueKind::Set(Box::new(ValueKind::Int)).is_collection());
        assert!(!ValueKind::Blob.is_collection());
    }
}
