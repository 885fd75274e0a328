use std::{fmt, fs::File, io, ops::Range, path::Path};

use byteorder::{LittleEndian, ReadBytesExt};
use forge_sdk::{Dtype, OpaqueTable, PropertyValue, TensorBuffer, ValueKind};
use rustc_hash::FxHashMap;
use tracing::Span;

use super::{
    GGUFError, ReaderLimits,
    errors::ReadContext,
    quant_spec::{GGUFDtypeClass, classify_gguf_dtype},
    tensor_info::GGUFTensorInfo,
};

pub const GGUF_MAGIC: [u8; 4] = *b"GGUF";
pub const SUPPORTED_VERSIONS: [u32; 2] = [2, 3];
pub const ALIGNMENT_KEY: &str = "general.alignment";
pub const DEFAULT_ALIGNMENT: u64 = 32;
/// ggml never produces tensors with more dimensions than this.
pub const MAX_TENSOR_DIMS: u32 = 4;
const MAX_ARRAY_NESTING: usize = 8;
/// Upper bound for up-front allocations driven by header counts.
const MAX_PREALLOCATED_RECORDS: u64 = 4096;

/// ggml tensor type ids as stored in tensor records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum GGUFDataType {
    F32,
    F16,
    Q4_0,
    Q4_1,
    Q4_2,
    Q4_3,
    Q5_0,
    Q5_1,
    Q8_0,
    Q8_1,
    Q2_K,
    Q3_K,
    Q4_K,
    Q5_K,
    Q6_K,
    Q8_K,
    IQ2_XXS,
    IQ2_XS,
    IQ3_XXS,
    IQ1_S,
    IQ4_NL,
    IQ3_S,
    IQ2_S,
    IQ4_XS,
    I8,
    I16,
    I32,
    I64,
    F64,
    IQ1_M,
    BF16,
    Q4_0_4_4,
    Q4_0_4_8,
    Q4_0_8_8,
    TQ1_0,
    TQ2_0,
    IQ4_NL_4_4,
    IQ4_NL_4_8,
    IQ4_NL_8_8,
    MXFP4,
    Unknown(u32),
}

impl GGUFDataType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::F32,
            1 => Self::F16,
            2 => Self::Q4_0,
            3 => Self::Q4_1,
            4 => Self::Q4_2,
            5 => Self::Q4_3,
            6 => Self::Q5_0,
            7 => Self::Q5_1,
            8 => Self::Q8_0,
            9 => Self::Q8_1,
            10 => Self::Q2_K,
            11 => Self::Q3_K,
            12 => Self::Q4_K,
            13 => Self::Q5_K,
            14 => Self::Q6_K,
            15 => Self::Q8_K,
            16 => Self::IQ2_XXS,
            17 => Self::IQ2_XS,
            18 => Self::IQ3_XXS,
            19 => Self::IQ1_S,
            20 => Self::IQ4_NL,
            21 => Self::IQ3_S,
            22 => Self::IQ2_S,
            23 => Self::IQ4_XS,
            24 => Self::I8,
            25 => Self::I16,
            26 => Self::I32,
            27 => Self::I64,
            28 => Self::F64,
            29 => Self::IQ1_M,
            30 => Self::BF16,
            31 => Self::Q4_0_4_4,
            32 => Self::Q4_0_4_8,
            33 => Self::Q4_0_8_8,
            34 => Self::TQ1_0,
            35 => Self::TQ2_0,
            36 => Self::IQ4_NL_4_4,
            37 => Self::IQ4_NL_4_8,
            38 => Self::IQ4_NL_8_8,
            39 => Self::MXFP4,
            _ => Self::Unknown(value),
        }
    }

    pub fn to_u32(self) -> u32 {
        match self {
            Self::F32 => 0,
            Self::F16 => 1,
            Self::Q4_0 => 2,
            Self::Q4_1 => 3,
            Self::Q4_2 => 4,
            Self::Q4_3 => 5,
            Self::Q5_0 => 6,
            Self::Q5_1 => 7,
            Self::Q8_0 => 8,
            Self::Q8_1 => 9,
            Self::Q2_K => 10,
            Self::Q3_K => 11,
            Self::Q4_K => 12,
            Self::Q5_K => 13,
            Self::Q6_K => 14,
            Self::Q8_K => 15,
            Self::IQ2_XXS => 16,
            Self::IQ2_XS => 17,
            Self::IQ3_XXS => 18,
            Self::IQ1_S => 19,
            Self::IQ4_NL => 20,
            Self::IQ3_S => 21,
            Self::IQ2_S => 22,
            Self::IQ4_XS => 23,
            Self::I8 => 24,
            Self::I16 => 25,
            Self::I32 => 26,
            Self::I64 => 27,
            Self::F64 => 28,
            Self::IQ1_M => 29,
            Self::BF16 => 30,
            Self::Q4_0_4_4 => 31,
            Self::Q4_0_4_8 => 32,
            Self::Q4_0_8_8 => 33,
            Self::TQ1_0 => 34,
            Self::TQ2_0 => 35,
            Self::IQ4_NL_4_4 => 36,
            Self::IQ4_NL_4_8 => 37,
            Self::IQ4_NL_8_8 => 38,
            Self::MXFP4 => 39,
            Self::Unknown(value) => value,
        }
    }
}

impl From<Dtype> for GGUFDataType {
    fn from(dtype: Dtype) -> Self {
        match dtype {
            Dtype::F32 => Self::F32,
            Dtype::F16 => Self::F16,
            Dtype::F64 => Self::F64,
            Dtype::BF16 => Self::BF16,
            Dtype::I8 => Self::I8,
            Dtype::I16 => Self::I16,
            Dtype::I32 => Self::I32,
            Dtype::I64 => Self::I64,
            Dtype::Q4_0 => Self::Q4_0,
            Dtype::Q4_1 => Self::Q4_1,
            Dtype::Q5_0 => Self::Q5_0,
            Dtype::Q5_1 => Self::Q5_1,
            Dtype::Q8_0 => Self::Q8_0,
            Dtype::Q8_1 => Self::Q8_1,
            Dtype::Q2_K => Self::Q2_K,
            Dtype::Q3_K => Self::Q3_K,
            Dtype::Q4_K => Self::Q4_K,
            Dtype::Q5_K => Self::Q5_K,
            Dtype::Q6_K => Self::Q6_K,
            Dtype::Q8_K => Self::Q8_K,
        }
    }
}

impl fmt::Display for GGUFDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(value) => write!(f, "UNKNOWN({value})"),
            // Debug names already match ggml's type names.
            other => write!(f, "{other:?}"),
        }
    }
}

/// Wire tags for field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GGUFValueType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    Bool,
    String,
    Array,
    U64,
    I64,
    F64,
}

impl GGUFValueType {
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => Self::U8,
            1 => Self::I8,
            2 => Self::U16,
            3 => Self::I16,
            4 => Self::U32,
            5 => Self::I32,
            6 => Self::F32,
            7 => Self::Bool,
            8 => Self::String,
            9 => Self::Array,
            10 => Self::U64,
            11 => Self::I64,
            12 => Self::F64,
            _ => return None,
        })
    }

    pub fn to_u32(self) -> u32 {
        match self {
            Self::U8 => 0,
            Self::I8 => 1,
            Self::U16 => 2,
            Self::I16 => 3,
            Self::U32 => 4,
            Self::I32 => 5,
            Self::F32 => 6,
            Self::Bool => 7,
            Self::String => 8,
            Self::Array => 9,
            Self::U64 => 10,
            Self::I64 => 11,
            Self::F64 => 12,
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            Self::U8 => ValueKind::U8,
            Self::I8 => ValueKind::I8,
            Self::U16 => ValueKind::U16,
            Self::I16 => ValueKind::I16,
            Self::U32 => ValueKind::U32,
            Self::I32 => ValueKind::I32,
            Self::F32 => ValueKind::F32,
            Self::Bool => ValueKind::Bool,
            Self::String => ValueKind::String,
            Self::Array => ValueKind::Array,
            Self::U64 => ValueKind::U64,
            Self::I64 => ValueKind::I64,
            Self::F64 => ValueKind::F64,
        }
    }
}

impl From<ValueKind> for GGUFValueType {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::U8 => Self::U8,
            ValueKind::I8 => Self::I8,
            ValueKind::U16 => Self::U16,
            ValueKind::I16 => Self::I16,
            ValueKind::U32 => Self::U32,
            ValueKind::I32 => Self::I32,
            ValueKind::F32 => Self::F32,
            ValueKind::Bool => Self::Bool,
            ValueKind::String => Self::String,
            ValueKind::Array => Self::Array,
            ValueKind::U64 => Self::U64,
            ValueKind::I64 => Self::I64,
            ValueKind::F64 => Self::F64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GGUFHeader {
    pub version: u32,
    pub tensor_count: u64,
    pub field_count: u64,
}

/// Array field kept in encoded form: element tag, count, and the bytes
/// spanning the elements.
#[derive(Debug, Clone)]
pub struct GGUFArray {
    pub element_type: GGUFValueType,
    pub len: u64,
    pub bytes: TensorBuffer,
}

impl GGUFArray {
    pub fn to_table(&self) -> OpaqueTable {
        OpaqueTable {
            element_kind: self.element_type.kind(),
            len: self.len,
            bytes: self.bytes.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum GGUFValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    Bool(bool),
    /// Raw, not yet UTF-8 checked.
    String(TensorBuffer),
    Array(GGUFArray),
    U64(u64),
    I64(i64),
    F64(f64),
}

impl GGUFValue {
    pub fn value_type(&self) -> GGUFValueType {
        match self {
            Self::U8(_) => GGUFValueType::U8,
            Self::I8(_) => GGUFValueType::I8,
            Self::U16(_) => GGUFValueType::U16,
            Self::I16(_) => GGUFValueType::I16,
            Self::U32(_) => GGUFValueType::U32,
            Self::I32(_) => GGUFValueType::I32,
            Self::F32(_) => GGUFValueType::F32,
            Self::Bool(_) => GGUFValueType::Bool,
            Self::String(_) => GGUFValueType::String,
            Self::Array(_) => GGUFValueType::Array,
            Self::U64(_) => GGUFValueType::U64,
            Self::I64(_) => GGUFValueType::I64,
            Self::F64(_) => GGUFValueType::F64,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(bytes) => std::str::from_utf8(bytes.as_bytes()).ok(),
            _ => None,
        }
    }

    /// Non-negative integer value of any width.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::U8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::U64(v) => Some(v),
            Self::I8(v) => u64::try_from(v).ok(),
            Self::I16(v) => u64::try_from(v).ok(),
            Self::I32(v) => u64::try_from(v).ok(),
            Self::I64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Numeric and boolean values as properties. Strings and arrays need the
    /// caller's attention and yield `None`.
    pub fn scalar_property(&self) -> Option<PropertyValue> {
        Some(match *self {
            Self::U8(v) => PropertyValue::U8(v),
            Self::I8(v) => PropertyValue::I8(v),
            Self::U16(v) => PropertyValue::U16(v),
            Self::I16(v) => PropertyValue::I16(v),
            Self::U32(v) => PropertyValue::U32(v),
            Self::I32(v) => PropertyValue::I32(v),
            Self::F32(v) => PropertyValue::F32(v),
            Self::Bool(v) => PropertyValue::Bool(v),
            Self::U64(v) => PropertyValue::U64(v),
            Self::I64(v) => PropertyValue::I64(v),
            Self::F64(v) => PropertyValue::F64(v),
            Self::String(_) | Self::Array(_) => return None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct GGUFField {
    pub key: String,
    pub value: GGUFValue,
}

/// Parsed archive directory over a shared backing buffer.
#[derive(Debug)]
pub struct GGUFFile {
    pub header: GGUFHeader,
    pub fields: Vec<GGUFField>,
    field_index: FxHashMap<String, usize>,
    pub tensors: Vec<GGUFTensorInfo>,
    pub alignment: u64,
    /// Absolute offset of the tensor data section.
    pub data_offset: usize,
    buffer: TensorBuffer,
}

impl GGUFFile {
    pub fn open<P: AsRef<Path>>(path: P, limits: &ReaderLimits, span: &Span) -> Result<Self, GGUFError> {
        let file = File::open(path.as_ref())?;
        let buffer = TensorBuffer::map_file(&file).map_err(|e| GGUFError::MemoryMappingError(e.to_string()))?;
        tracing::debug!(parent: span, path = %path.as_ref().display(), bytes = buffer.len(), "mapped GGUF archive");
        Self::parse(buffer, limits, span)
    }

    pub fn parse(buffer: TensorBuffer, limits: &ReaderLimits, span: &Span) -> Result<Self, GGUFError> {
        let mut parser = Parser {
            buffer: &buffer,
            data: buffer.as_bytes(),
            rest: buffer.as_bytes(),
            limits,
            record: String::from("header"),
        };

        let header = parser.header()?;

        let mut fields = Vec::with_capacity(header.field_count.min(MAX_PREALLOCATED_RECORDS) as usize);
        let mut field_index = FxHashMap::default();
        for i in 0..header.field_count {
            let field = parser.field(i)?;
            tracing::debug!(parent: span, key = %field.key, kind = ?field.value.value_type(), "read field");
            if field_index.insert(field.key.clone(), fields.len()).is_some() {
                return Err(GGUFError::invalid(format!("field '{}'", field.key), "duplicate key"));
            }
            fields.push(field);
        }

        let mut tensors = Vec::with_capacity(header.tensor_count.min(MAX_PREALLOCATED_RECORDS) as usize);
        for i in 0..header.tensor_count {
            tensors.push(parser.tensor_info(i)?);
        }

        let alignment = match field_index.get(ALIGNMENT_KEY).map(|&i| &fields[i].value) {
            None => DEFAULT_ALIGNMENT,
            Some(value) => value
                .as_u64()
                .filter(|a| a.is_power_of_two())
                .ok_or_else(|| GGUFError::invalid(ALIGNMENT_KEY, format!("alignment must be a power of two, got {value:?}")))?,
        };
        let data_offset = align_up(parser.position(), alignment)
            .ok_or_else(|| GGUFError::invalid(ALIGNMENT_KEY, "tensor data offset overflows"))?;

        assign_byte_ranges(&mut tensors, data_offset, alignment, buffer.len(), limits, span)?;

        tracing::info!(
            parent: span,
            version = header.version,
            fields = fields.len(),
            tensors = tensors.len(),
            alignment,
            data_offset,
            "parsed GGUF archive"
        );

        Ok(Self {
            header,
            fields,
            field_index,
            tensors,
            alignment,
            data_offset,
            buffer,
        })
    }

    pub fn field(&self, key: &str) -> Option<&GGUFField> {
        self.field_index.get(key).map(|&i| &self.fields[i])
    }

    pub fn tensor(&self, name: &str) -> Option<&GGUFTensorInfo> {
        self.tensors.iter().find(|t| t.name == name)
    }

    pub fn buffer(&self) -> &TensorBuffer {
        &self.buffer
    }

    /// Raw bytes of `tensor`, or `None` when its storage size is unknown.
    pub fn tensor_data(&self, tensor: &GGUFTensorInfo) -> Option<&[u8]> {
        tensor.byte_range.clone().map(|range| &self.buffer.as_bytes()[range])
    }
}

fn align_up(position: usize, alignment: u64) -> Option<usize> {
    let alignment = usize::try_from(alignment).ok()?;
    position.checked_next_multiple_of(alignment)
}

/// Locate every tensor's bytes inside the data section and reject records
/// that run off the end of the archive or into each other.
fn assign_byte_ranges(
    tensors: &mut [GGUFTensorInfo],
    data_offset: usize,
    alignment: u64,
    archive_len: usize,
    limits: &ReaderLimits,
    span: &Span,
) -> Result<(), GGUFError> {
    for info in tensors.iter_mut() {
        if info.dimensions.contains(&0) {
            return Err(GGUFError::malformed(&info.name, format!("zero-sized dimension in {:?}", info.dimensions)));
        }
        let elements = info
            .element_count()
            .ok_or_else(|| GGUFError::malformed(&info.name, format!("element count of {:?} overflows", info.dimensions)))?;

        let size = match classify_gguf_dtype(info.data_type) {
            GGUFDtypeClass::Scalar { element_size_bytes } => elements.checked_mul(element_size_bytes as u64),
            GGUFDtypeClass::BlockQuant(spec) => {
                if elements % spec.weights_per_block as u64 != 0 {
                    return Err(GGUFError::malformed(
                        &info.name,
                        format!("{elements} elements is not a whole number of {}-weight {} blocks", spec.weights_per_block, info.data_type),
                    ));
                }
                (elements / spec.weights_per_block as u64).checked_mul(spec.block_bytes as u64)
            }
            GGUFDtypeClass::Deprecated { replacement_hint } => {
                tracing::debug!(parent: span, tensor = %info.name, tag = %info.data_type, hint = replacement_hint, "deprecated tensor type");
                continue;
            }
            GGUFDtypeClass::Unsupported { reason } => {
                tracing::debug!(parent: span, tensor = %info.name, tag = %info.data_type, reason, "unsized tensor type");
                continue;
            }
        };

        if info.offset % alignment != 0 {
            if limits.allow_unaligned_offsets {
                tracing::warn!(parent: span, tensor = %info.name, offset = info.offset, alignment, "tensor offset is not aligned");
            } else {
                return Err(GGUFError::malformed(
                    &info.name,
                    format!("offset {} is not a multiple of the {alignment}-byte alignment", info.offset),
                ));
            }
        }

        let range = size
            .and_then(|size| {
                let start = (data_offset as u64).checked_add(info.offset)?;
                Some(start..start.checked_add(size)?)
            })
            .ok_or_else(|| GGUFError::malformed(&info.name, "byte range overflows"))?;
        if range.end > archive_len as u64 {
            return Err(GGUFError::malformed(
                &info.name,
                format!(
                    "data {}..{} runs past the end of the archive ({archive_len} bytes)",
                    range.start, range.end
                ),
            ));
        }
        // Bounded by archive_len, so these fit in usize.
        info.byte_range = Some(range.start as usize..range.end as usize);
        tracing::debug!(parent: span, tensor = %info.name, tag = %info.data_type, dims = ?info.dimensions, range = ?info.byte_range, "located tensor");
    }

    let mut located: Vec<(&str, &Range<usize>)> = tensors
        .iter()
        .filter_map(|t| t.byte_range.as_ref().map(|r| (t.name.as_str(), r)))
        .collect();
    located.sort_by_key(|(_, range)| range.start);
    for pair in located.windows(2) {
        let ((name, range), (next, next_range)) = (pair[0], pair[1]);
        if range.end > next_range.start {
            return Err(GGUFError::malformed(
                name,
                format!("data {}..{} overlaps tensor '{next}' at {}", range.start, range.end, next_range.start),
            ));
        }
    }
    Ok(())
}

struct Parser<'a> {
    buffer: &'a TensorBuffer,
    data: &'a [u8],
    rest: &'a [u8],
    limits: &'a ReaderLimits,
    /// Record being decoded, for error messages.
    record: String,
}

impl<'a> Parser<'a> {
    fn position(&self) -> usize {
        self.data.len() - self.rest.len()
    }

    fn location(&self, what: &str) -> String {
        format!("{} {what}", self.record)
    }

    fn scalar<T>(&mut self, what: &str, read: impl FnOnce(&mut &'a [u8]) -> io::Result<T>) -> Result<T, GGUFError> {
        let value = read(&mut self.rest);
        value.context(|| self.location(what))
    }

    fn take(&mut self, len: usize, what: &str) -> Result<Range<usize>, GGUFError> {
        if len > self.rest.len() {
            return Err(GGUFError::Truncated {
                location: self.location(what),
            });
        }
        let start = self.position();
        self.rest = &self.rest[len..];
        Ok(start..start + len)
    }

    fn string_range(&mut self, what: &str) -> Result<Range<usize>, GGUFError> {
        let len = self.scalar(what, |r| r.read_u64::<LittleEndian>())?;
        let max = self.limits.max_string_bytes;
        let len = usize::try_from(len)
            .ok()
            .filter(|&len| len <= max)
            .ok_or_else(|| GGUFError::invalid(self.location(what), format!("string of {len} bytes exceeds the {max}-byte limit")))?;
        self.take(len, what)
    }

    fn name(&mut self, what: &str) -> Result<String, GGUFError> {
        let range = self.string_range(what)?;
        String::from_utf8(self.data[range].to_vec()).map_err(|_| GGUFError::invalid(self.location(what), "name is not valid UTF-8"))
    }

    fn view(&self, range: Range<usize>) -> Result<TensorBuffer, GGUFError> {
        self.buffer.slice(range).ok_or_else(|| GGUFError::Truncated {
            location: self.record.clone(),
        })
    }

    fn header(&mut self) -> Result<GGUFHeader, GGUFError> {
        let range = self.take(4, "magic")?;
        let magic: [u8; 4] = [self.data[range.start], self.data[range.start + 1], self.data[range.start + 2], self.data[range.start + 3]];
        if magic != GGUF_MAGIC {
            return Err(GGUFError::InvalidMagic(magic));
        }

        let version = self.scalar("version", |r| r.read_u32::<LittleEndian>())?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(GGUFError::UnsupportedVersion(version));
        }

        let tensor_count = self.scalar("tensor count", |r| r.read_u64::<LittleEndian>())?;
        let field_count = self.scalar("field count", |r| r.read_u64::<LittleEndian>())?;

        Ok(GGUFHeader {
            version,
            tensor_count,
            field_count,
        })
    }

    fn field(&mut self, index: u64) -> Result<GGUFField, GGUFError> {
        self.record = format!("field #{index}");
        let key = self.name("key")?;
        self.record = format!("field '{key}'");

        let tag = self.scalar("value type", |r| r.read_u32::<LittleEndian>())?;
        let value_type = GGUFValueType::from_u32(tag)
            .ok_or_else(|| GGUFError::invalid(self.record.clone(), format!("unknown value type {tag}")))?;
        let value = self.value(value_type)?;
        Ok(GGUFField { key, value })
    }

    fn value(&mut self, value_type: GGUFValueType) -> Result<GGUFValue, GGUFError> {
        const WHAT: &str = "value";
        Ok(match value_type {
            GGUFValueType::U8 => GGUFValue::U8(self.scalar(WHAT, |r| r.read_u8())?),
            GGUFValueType::I8 => GGUFValue::I8(self.scalar(WHAT, |r| r.read_i8())?),
            GGUFValueType::U16 => GGUFValue::U16(self.scalar(WHAT, |r| r.read_u16::<LittleEndian>())?),
            GGUFValueType::I16 => GGUFValue::I16(self.scalar(WHAT, |r| r.read_i16::<LittleEndian>())?),
            GGUFValueType::U32 => GGUFValue::U32(self.scalar(WHAT, |r| r.read_u32::<LittleEndian>())?),
            GGUFValueType::I32 => GGUFValue::I32(self.scalar(WHAT, |r| r.read_i32::<LittleEndian>())?),
            GGUFValueType::F32 => GGUFValue::F32(self.scalar(WHAT, |r| r.read_f32::<LittleEndian>())?),
            GGUFValueType::Bool => GGUFValue::Bool(self.scalar(WHAT, |r| r.read_u8())? != 0),
            GGUFValueType::U64 => GGUFValue::U64(self.scalar(WHAT, |r| r.read_u64::<LittleEndian>())?),
            GGUFValueType::I64 => GGUFValue::I64(self.scalar(WHAT, |r| r.read_i64::<LittleEndian>())?),
            GGUFValueType::F64 => GGUFValue::F64(self.scalar(WHAT, |r| r.read_f64::<LittleEndian>())?),
            GGUFValueType::String => {
                let range = self.string_range(WHAT)?;
                GGUFValue::String(self.view(range)?)
            }
            GGUFValueType::Array => GGUFValue::Array(self.array(0)?),
        })
    }

    /// Walk an array without decoding it, returning the span of its elements.
    fn array(&mut self, depth: usize) -> Result<GGUFArray, GGUFError> {
        if depth >= MAX_ARRAY_NESTING {
            return Err(GGUFError::invalid(self.record.clone(), format!("arrays nested deeper than {MAX_ARRAY_NESTING}")));
        }
        let tag = self.scalar("array element type", |r| r.read_u32::<LittleEndian>())?;
        let element_type = GGUFValueType::from_u32(tag)
            .ok_or_else(|| GGUFError::invalid(self.record.clone(), format!("unknown array element type {tag}")))?;
        let len = self.scalar("array length", |r| r.read_u64::<LittleEndian>())?;
        let max = self.limits.max_array_len;
        if len > max {
            return Err(GGUFError::invalid(
                self.record.clone(),
                format!("array of {len} elements exceeds the {max}-element limit"),
            ));
        }

        let start = self.position();
        match element_type.kind().fixed_size() {
            Some(size) => {
                let bytes = len
                    .checked_mul(size as u64)
                    .and_then(|b| usize::try_from(b).ok())
                    .ok_or_else(|| GGUFError::invalid(self.record.clone(), "array size overflows"))?;
                self.take(bytes, "array elements")?;
            }
            None if element_type == GGUFValueType::String => {
                for _ in 0..len {
                    self.string_range("array element")?;
                }
            }
            None => {
                for _ in 0..len {
                    self.array(depth + 1)?;
                }
            }
        }
        let bytes = self.view(start..self.position())?;
        Ok(GGUFArray { element_type, len, bytes })
    }

    fn tensor_info(&mut self, index: u64) -> Result<GGUFTensorInfo, GGUFError> {
        self.record = format!("tensor #{index}");
        let name = self.name("name")?;
        self.record = format!("tensor '{name}'");

        let n_dims = self.scalar("dimension count", |r| r.read_u32::<LittleEndian>())?;
        if n_dims > MAX_TENSOR_DIMS {
            return Err(GGUFError::invalid(
                self.record.clone(),
                format!("{n_dims} dimensions exceeds the maximum of {MAX_TENSOR_DIMS}"),
            ));
        }
        let mut dimensions = Vec::with_capacity(n_dims as usize);
        for _ in 0..n_dims {
            dimensions.push(self.scalar("dimensions", |r| r.read_u64::<LittleEndian>())?);
        }
        let data_type = GGUFDataType::from_u32(self.scalar("type", |r| r.read_u32::<LittleEndian>())?);
        let offset = self.scalar("offset", |r| r.read_u64::<LittleEndian>())?;

        Ok(GGUFTensorInfo {
            name,
            dimensions,
            data_type,
            offset,
            byte_range: None,
        })
    }
}

#[path = "file.test.rs"]
mod tests;
