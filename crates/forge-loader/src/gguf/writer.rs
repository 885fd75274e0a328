use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use byteorder::{LittleEndian, WriteBytesExt};
use forge_sdk::{InferenceTensor, PropertyValue, ValueKind};

use super::{
    GGUFDataType, GGUFError, GGUFValueType,
    file::{ALIGNMENT_KEY, DEFAULT_ALIGNMENT, GGUF_MAGIC, SUPPORTED_VERSIONS},
    quant_spec::tensor_storage_bytes_for_gguf_dtype,
};

#[derive(Debug, Clone)]
enum FieldPayload {
    Value(PropertyValue),
    Array { kind: ValueKind, values: Vec<PropertyValue> },
    Raw { tag: u32, bytes: Vec<u8> },
}

#[derive(Debug, Clone)]
struct PendingTensor {
    name: String,
    dimensions: Vec<u64>,
    data_type: GGUFDataType,
    data: Vec<u8>,
}

/// Builds a GGUF archive in memory and serializes it in one pass.
#[derive(Debug, Clone)]
pub struct GGUFWriter {
    version: u32,
    alignment: u64,
    fields: Vec<(String, FieldPayload)>,
    tensors: Vec<PendingTensor>,
}

impl Default for GGUFWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl GGUFWriter {
    pub fn new() -> Self {
        Self {
            version: 3,
            alignment: DEFAULT_ALIGNMENT,
            fields: Vec::new(),
            tensors: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: u32) -> Result<Self, GGUFError> {
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(GGUFError::UnsupportedVersion(version));
        }
        self.version = version;
        Ok(self)
    }

    /// Use a non-default data alignment. Records it as `general.alignment`.
    pub fn with_alignment(mut self, alignment: u32) -> Result<Self, GGUFError> {
        if !alignment.is_power_of_two() {
            return Err(GGUFError::invalid(ALIGNMENT_KEY, format!("alignment must be a power of two, got {alignment}")));
        }
        self.alignment = alignment.into();
        self.fields.retain(|(key, _)| key != ALIGNMENT_KEY);
        self.fields
            .push((ALIGNMENT_KEY.to_string(), FieldPayload::Value(PropertyValue::U32(alignment))));
        Ok(self)
    }

    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> &mut Self {
        self.fields.push((key.into(), FieldPayload::Value(value.into())));
        self
    }

    /// Array field; every value must be of `kind`.
    pub fn add_array(&mut self, key: impl Into<String>, kind: ValueKind, values: Vec<PropertyValue>) -> Result<&mut Self, GGUFError> {
        let key = key.into();
        if kind == ValueKind::Array {
            return Err(GGUFError::invalid(format!("field '{key}'"), "nested arrays are not supported by the writer"));
        }
        if let Some(value) = values.iter().find(|value| value_kind(value) != kind) {
            return Err(GGUFError::invalid(format!("field '{key}'"), format!("{value:?} is not a {kind:?} element")));
        }
        self.fields.push((key, FieldPayload::Array { kind, values }));
        Ok(self)
    }

    /// Field whose value bytes are already encoded, written after `tag` verbatim.
    pub fn add_raw_field(&mut self, key: impl Into<String>, tag: u32, bytes: Vec<u8>) -> &mut Self {
        self.fields.push((key.into(), FieldPayload::Raw { tag, bytes }));
        self
    }

    /// Tensor given in archive order (`dimensions` innermost first).
    pub fn add_tensor(
        &mut self,
        name: impl Into<String>,
        dimensions: Vec<u64>,
        data_type: GGUFDataType,
        data: Vec<u8>,
    ) -> Result<&mut Self, GGUFError> {
        let name = name.into();
        if let Some(expected) = tensor_storage_bytes_for_gguf_dtype(data_type, &dimensions)
            && expected != data.len()
        {
            return Err(GGUFError::malformed(
                name,
                format!("{data_type} {dimensions:?} needs {expected} bytes, got {}", data.len()),
            ));
        }
        self.tensors.push(PendingTensor {
            name,
            dimensions,
            data_type,
            data,
        });
        Ok(self)
    }

    /// Export a typed tensor, reversing its logical shape back to archive order.
    pub fn add_inference_tensor(&mut self, tensor: &InferenceTensor) -> Result<&mut Self, GGUFError> {
        let dimensions = tensor.shape().iter().rev().map(|&d| d as u64).collect();
        self.add_tensor(tensor.name(), dimensions, tensor.dtype().into(), tensor.raw().to_vec())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, GGUFError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GGUFError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), GGUFError> {
        let mut head = Vec::new();
        head.write_all(&GGUF_MAGIC)?;
        head.write_u32::<LittleEndian>(self.version)?;
        head.write_u64::<LittleEndian>(self.tensors.len() as u64)?;
        head.write_u64::<LittleEndian>(self.fields.len() as u64)?;

        for (key, payload) in &self.fields {
            write_string(&mut head, key)?;
            match payload {
                FieldPayload::Value(value) => {
                    head.write_u32::<LittleEndian>(value_type(value).to_u32())?;
                    write_value(&mut head, value)?;
                }
                FieldPayload::Array { kind, values } => {
                    head.write_u32::<LittleEndian>(GGUFValueType::Array.to_u32())?;
                    head.write_u32::<LittleEndian>(GGUFValueType::from(*kind).to_u32())?;
                    head.write_u64::<LittleEndian>(values.len() as u64)?;
                    for value in values {
                        write_value(&mut head, value)?;
                    }
                }
                FieldPayload::Raw { tag, bytes } => {
                    head.write_u32::<LittleEndian>(*tag)?;
                    head.write_all(bytes)?;
                }
            }
        }

        let alignment = self.alignment as usize;
        let mut offset = 0usize;
        let mut offsets = Vec::with_capacity(self.tensors.len());
        for tensor in &self.tensors {
            offsets.push(offset);
            offset = (offset + tensor.data.len()).next_multiple_of(alignment);
        }
        for (tensor, &offset) in self.tensors.iter().zip(&offsets) {
            write_string(&mut head, &tensor.name)?;
            head.write_u32::<LittleEndian>(tensor.dimensions.len() as u32)?;
            for &dim in &tensor.dimensions {
                head.write_u64::<LittleEndian>(dim)?;
            }
            head.write_u32::<LittleEndian>(tensor.data_type.to_u32())?;
            head.write_u64::<LittleEndian>(offset as u64)?;
        }

        out.write_all(&head)?;
        if self.tensors.is_empty() {
            return Ok(());
        }

        let zeros = vec![0u8; alignment];
        out.write_all(&zeros[..padding(head.len(), alignment)])?;
        for (i, tensor) in self.tensors.iter().enumerate() {
            out.write_all(&tensor.data)?;
            // No trailing padding after the last tensor.
            if i + 1 < self.tensors.len() {
                out.write_all(&zeros[..padding(tensor.data.len(), alignment)])?;
            }
        }
        Ok(())
    }
}

fn padding(len: usize, alignment: usize) -> usize {
    len.next_multiple_of(alignment) - len
}

fn write_string(out: &mut Vec<u8>, text: &str) -> Result<(), GGUFError> {
    out.write_u64::<LittleEndian>(text.len() as u64)?;
    out.write_all(text.as_bytes())?;
    Ok(())
}

fn value_kind(value: &PropertyValue) -> ValueKind {
    match value {
        PropertyValue::Bool(_) => ValueKind::Bool,
        PropertyValue::U8(_) => ValueKind::U8,
        PropertyValue::I8(_) => ValueKind::I8,
        PropertyValue::U16(_) => ValueKind::U16,
        PropertyValue::I16(_) => ValueKind::I16,
        PropertyValue::U32(_) => ValueKind::U32,
        PropertyValue::I32(_) => ValueKind::I32,
        PropertyValue::U64(_) => ValueKind::U64,
        PropertyValue::I64(_) => ValueKind::I64,
        PropertyValue::F32(_) => ValueKind::F32,
        PropertyValue::F64(_) => ValueKind::F64,
        PropertyValue::String(_) => ValueKind::String,
    }
}

fn value_type(value: &PropertyValue) -> GGUFValueType {
    value_kind(value).into()
}

fn write_value(out: &mut Vec<u8>, value: &PropertyValue) -> Result<(), GGUFError> {
    match value {
        PropertyValue::Bool(v) => out.write_u8(u8::from(*v))?,
        PropertyValue::U8(v) => out.write_u8(*v)?,
        PropertyValue::I8(v) => out.write_i8(*v)?,
        PropertyValue::U16(v) => out.write_u16::<LittleEndian>(*v)?,
        PropertyValue::I16(v) => out.write_i16::<LittleEndian>(*v)?,
        PropertyValue::U32(v) => out.write_u32::<LittleEndian>(*v)?,
        PropertyValue::I32(v) => out.write_i32::<LittleEndian>(*v)?,
        PropertyValue::U64(v) => out.write_u64::<LittleEndian>(*v)?,
        PropertyValue::I64(v) => out.write_i64::<LittleEndian>(*v)?,
        PropertyValue::F32(v) => out.write_f32::<LittleEndian>(*v)?,
        PropertyValue::F64(v) => out.write_f64::<LittleEndian>(*v)?,
        PropertyValue::String(v) => write_string(out, v)?,
    }
    Ok(())
}

#[path = "writer.test.rs"]
mod tests;
