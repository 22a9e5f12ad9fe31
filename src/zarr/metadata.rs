use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::Deserialize;
use serde_json::Value;
use crate::error::{Result, ViewerError};
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericKind {
    Int,
    UInt,
    Float,
}
/// Simple (non-structured) numpy dtype such as `<f4` or `>i2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataType {
    pub kind: NumericKind,
    pub size: usize,
    pub endian: Endian,
}
impl DataType {
    pub fn parse(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let (Some(order), Some(kind)) = (chars.next(), chars.next()) else {
            return Err(ViewerError::format(format!("unsupported dtype {text:?}")));
        };
        let size: usize = chars
            .as_str()
            .parse()
            .map_err(|_| ViewerError::format(format!("unsupported dtype {text:?}")))?;
        let kind = match kind {
            'i' => NumericKind::Int,
            'u' => NumericKind::UInt,
            'f' => NumericKind::Float,
            _ => return Err(ViewerError::format(format!("unsupported dtype {text:?}"))),
        };
        let endian = match order {
            '<' => Endian::Little,
            '>' => Endian::Big,
            '|' if size == 1 => Endian::Little,
            _ => return Err(ViewerError::format(format!("unsupported dtype {text:?}"))),
        };
        let valid = match kind {
            NumericKind::Float => matches!(size, 4 | 8),
            _ => matches!(size, 1 | 2 | 4 | 8),
        };
        if !valid {
            return Err(ViewerError::format(format!("unsupported dtype {text:?}")));
        }
        Ok(Self { kind, size, endian })
    }
    /// Widen raw chunk bytes to `f64` values.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<f64>> {
        if bytes.len() % self.size != 0 {
            return Err(ViewerError::format(format!(
                "{} bytes is not a whole number of {}-byte elements",
                bytes.len(),
                self.size
            )));
        }
        Ok(match self.endian {
            Endian::Little => self.decode_with::<LittleEndian>(bytes),
            Endian::Big => self.decode_with::<BigEndian>(bytes),
        })
    }
    fn decode_with<B: ByteOrder>(&self, bytes: &[u8]) -> Vec<f64> {
        bytes
            .chunks_exact(self.size)
            .map(|raw| match (self.kind, self.size) {
                (NumericKind::Float, 4) => B::read_f32(raw) as f64,
                (NumericKind::Float, _) => B::read_f64(raw),
                (NumericKind::Int, 1) => raw[0] as i8 as f64,
                (NumericKind::Int, 2) => B::read_i16(raw) as f64,
                (NumericKind::Int, 4) => B::read_i32(raw) as f64,
                (NumericKind::Int, _) => B::read_i64(raw) as f64,
                (NumericKind::UInt, 1) => raw[0] as f64,
                (NumericKind::UInt, 2) => B::read_u16(raw) as f64,
                (NumericKind::UInt, 4) => B::read_u32(raw) as f64,
                (NumericKind::UInt, _) => B::read_u64(raw) as f64,
            })
            .collect()
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    C,
    F,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compressor {
    Zlib,
    Gzip,
    /// Blosc frames are self-describing; the inner codec is read from each frame header.
    Blosc,
}
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayMetadata {
    pub shape: Vec<usize>,
    pub chunks: Vec<usize>,
    pub dtype: DataType,
    pub compressor: Option<Compressor>,
    pub fill_value: f64,
    pub order: Order,
    pub dimension_separator: char,
}
#[derive(Deserialize)]
struct RawArrayMetadata {
    zarr_format: u8,
    shape: Vec<usize>,
    chunks: Vec<usize>,
    dtype: Value,
    #[serde(default)]
    compressor: Option<Value>,
    #[serde(default)]
    fill_value: Value,
    #[serde(default = "default_order")]
    order: String,
    #[serde(default)]
    filters: Option<Vec<Value>>,
    #[serde(default)]
    dimension_separator: Option<String>,
}
fn default_order() -> String {
    "C".to_string()
}
impl ArrayMetadata {
    /// Parse the contents of a `.zarray` document.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let raw: RawArrayMetadata = serde_json::from_slice(bytes)?;
        if raw.zarr_format != 2 {
            return Err(ViewerError::format(format!(
                "zarr_format {} is not supported",
                raw.zarr_format
            )));
        }
        if raw.shape.len() != raw.chunks.len() {
            return Err(ViewerError::format("shape and chunks have different ranks"));
        }
        if raw.chunks.iter().any(|&c| c == 0) {
            return Err(ViewerError::format("chunk dimensions must be positive"));
        }
        if raw.filters.as_ref().is_some_and(|f| !f.is_empty()) {
            return Err(ViewerError::format("array filters are not supported"));
        }
        let dtype = match &raw.dtype {
            Value::String(text) => DataType::parse(text)?,
            other => {
                return Err(ViewerError::format(format!(
                    "structured dtype {other} is not supported"
                )))
            }
        };
        let order = match raw.order.as_str() {
            "C" => Order::C,
            "F" => Order::F,
            other => return Err(ViewerError::format(format!("unknown order {other:?}"))),
        };
        let dimension_separator = match raw.dimension_separator.as_deref() {
            None | Some(".") => '.',
            Some("/") => '/',
            Some(other) => {
                return Err(ViewerError::format(format!(
                    "unknown dimension_separator {other:?}"
                )))
            }
        };
        Ok(Self {
            shape: raw.shape,
            chunks: raw.chunks,
            dtype,
            compressor: parse_compressor(raw.compressor.as_ref())?,
            fill_value: parse_fill_value(&raw.fill_value)?,
            order,
            dimension_separator,
        })
    }
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
    pub fn chunk_len(&self) -> usize {
        self.chunks.iter().product()
    }
    /// Store key of the chunk at grid position `coords`, relative to the array.
    pub fn chunk_key(&self, coords: &[usize]) -> String {
        if coords.is_empty() {
            return "0".to_string();
        }
        coords
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(&self.dimension_separator.to_string())
    }
}
fn parse_compressor(value: Option<&Value>) -> Result<Option<Compressor>> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ViewerError::format("compressor has no id"))?;
    match id {
        "zlib" => Ok(Some(Compressor::Zlib)),
        "gzip" => Ok(Some(Compressor::Gzip)),
        "blosc" => Ok(Some(Compressor::Blosc)),
        other => Err(ViewerError::format(format!(
            "compressor {other:?} is not supported"
        ))),
    }
}
fn parse_fill_value(value: &Value) -> Result<f64> {
    match value {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ViewerError::format(format!("fill_value {n} is not representable"))),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => Err(ViewerError::format(format!("unknown fill_value {other:?}"))),
        },
        other => Err(ViewerError::format(format!("unknown fill_value {other}"))),
    }
}
