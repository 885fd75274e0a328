use std::{collections::BTreeMap, path::Path};

use byteorder::{LittleEndian, ReadBytesExt};
use forge_sdk::{Dataset, LoaderError, OpaqueTable, Properties, PropertyValue, TensorBuffer, Theta, ValueKind};

use super::{
    GGUFError, GGUFFile, GGUFLoadOptions, GGUFValue,
    errors::ReadContext,
};

pub const SCHEMA_KEY: &str = "schema";
pub const SCHEMA: &str = "GGUF";

/// Load a GGUF archive with limits from the environment and the default binder.
pub fn load_gguf_file<P: AsRef<Path>>(path: P) -> Result<Dataset, LoaderError> {
    let options = GGUFLoadOptions::from_env()?;
    load_gguf_file_with(path, &options)
}

pub fn load_gguf_file_with<P: AsRef<Path>>(path: P, options: &GGUFLoadOptions) -> Result<Dataset, LoaderError> {
    let path = path.as_ref();
    tracing::info!(parent: &options.span, path = %path.display(), "loading GGUF file");
    let file = GGUFFile::open(path, &options.limits, &options.span)?;
    Ok(assemble(&file, options)?)
}

/// Load from an in-memory archive. The bytes are copied once into an aligned
/// buffer that every tensor then shares.
pub fn load_gguf_bytes(bytes: &[u8], options: &GGUFLoadOptions) -> Result<Dataset, LoaderError> {
    load_gguf_buffer(TensorBuffer::from_bytes(bytes), options)
}

pub fn load_gguf_buffer(buffer: TensorBuffer, options: &GGUFLoadOptions) -> Result<Dataset, LoaderError> {
    let file = GGUFFile::parse(buffer, &options.limits, &options.span)?;
    Ok(assemble(&file, options)?)
}

fn assemble(file: &GGUFFile, options: &GGUFLoadOptions) -> Result<Dataset, GGUFError> {
    let span = &options.span;
    let (properties, tables) = extract_properties(file, options);

    let tensors = file
        .tensors
        .iter()
        .map(|info| options.binder.bind(info, file.buffer()))
        .collect::<Result<Vec<_>, _>>()?;
    let root_theta = Theta::new(tensors)?;

    tracing::info!(
        parent: span,
        properties = properties.len(),
        tables = tables.len(),
        tensors = root_theta.len(),
        "assembled dataset"
    );
    Ok(Dataset {
        properties,
        tables,
        root_theta,
    })
}

/// Single-valued fields become properties; arrays are kept as opaque tables.
///
/// The header counts are exposed as `GGUF.version`, `GGUF.tensor_count` and
/// `GGUF.kv_count`. Strings that are not UTF-8 are skipped with a warning.
/// `schema` defaults to `"GGUF"`; an archive field of that name replaces it.
fn extract_properties(file: &GGUFFile, options: &GGUFLoadOptions) -> (Properties, BTreeMap<String, OpaqueTable>) {
    let span = &options.span;
    let mut properties = Properties::new();
    let mut tables = BTreeMap::new();

    properties.insert(SCHEMA_KEY, SCHEMA);
    properties.insert("GGUF.version", PropertyValue::U32(file.header.version));
    properties.insert("GGUF.tensor_count", PropertyValue::U64(file.header.tensor_count));
    properties.insert("GGUF.kv_count", PropertyValue::U64(file.header.field_count));

    for field in &file.fields {
        match &field.value {
            GGUFValue::Array(array) => {
                tables.insert(field.key.clone(), array.to_table());
            }
            GGUFValue::String(bytes) => match std::str::from_utf8(bytes.as_bytes()) {
                Ok(text) => {
                    properties.insert(field.key.as_str(), text);
                }
                Err(err) => {
                    tracing::warn!(parent: span, key = %field.key, error = %err, "skipping property with invalid UTF-8");
                }
            },
            scalar => {
                if let Some(value) = scalar.scalar_property() {
                    properties.insert(field.key.as_str(), value);
                }
            }
        }
    }

    (properties, tables)
}

/// Decode a table of scalars or strings into property values.
///
/// Tables of nested arrays have no flat representation and are rejected.
pub fn decode_table(key: &str, table: &OpaqueTable) -> Result<Vec<PropertyValue>, GGUFError> {
    let location = || format!("table '{key}'");
    let mut reader = table.bytes.as_bytes();
    let mut values = Vec::with_capacity(usize::try_from(table.len).unwrap_or(0).min(reader.len()));

    for _ in 0..table.len {
        let value = match table.element_kind {
            ValueKind::U8 => PropertyValue::U8(reader.read_u8().context(location)?),
            ValueKind::I8 => PropertyValue::I8(reader.read_i8().context(location)?),
            ValueKind::U16 => PropertyValue::U16(reader.read_u16::<LittleEndian>().context(location)?),
            ValueKind::I16 => PropertyValue::I16(reader.read_i16::<LittleEndian>().context(location)?),
            ValueKind::U32 => PropertyValue::U32(reader.read_u32::<LittleEndian>().context(location)?),
            ValueKind::I32 => PropertyValue::I32(reader.read_i32::<LittleEndian>().context(location)?),
            ValueKind::F32 => PropertyValue::F32(reader.read_f32::<LittleEndian>().context(location)?),
            ValueKind::Bool => PropertyValue::Bool(reader.read_u8().context(location)? != 0),
            ValueKind::U64 => PropertyValue::U64(reader.read_u64::<LittleEndian>().context(location)?),
            ValueKind::I64 => PropertyValue::I64(reader.read_i64::<LittleEndian>().context(location)?),
            ValueKind::F64 => PropertyValue::F64(reader.read_f64::<LittleEndian>().context(location)?),
            ValueKind::String => {
                let len = reader.read_u64::<LittleEndian>().context(location)?;
                let len = usize::try_from(len)
                    .ok()
                    .filter(|&len| len <= reader.len())
                    .ok_or_else(|| GGUFError::Truncated { location: location() })?;
                let (text, rest) = reader.split_at(len);
                reader = rest;
                let text = std::str::from_utf8(text).map_err(|err| GGUFError::invalid(location(), err.to_string()))?;
                PropertyValue::String(text.to_string())
            }
            ValueKind::Array => return Err(GGUFError::invalid(location(), "nested arrays cannot be decoded to scalar values")),
        };
        values.push(value);
    }
    Ok(values)
}

#[path = "dataset.test.rs"]
mod tests;
