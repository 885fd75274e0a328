use std::{fs, path::PathBuf};

use forge_loader::{
    Dtype, LoaderError, ModelLoader,
    gguf::{GGUFDataType, GGUFLoadOptions, GGUFWriter, load_gguf_file, load_gguf_file_with},
};
use forge_sdk::ThetaError;
use tempfile::TempDir;

fn write_archive(dir: &TempDir, name: &str, writer: &GGUFWriter) -> PathBuf {
    let path = dir.path().join(name);
    writer.write_file(&path).unwrap();
    path
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

#[test]
fn f32_tensor_loads_with_logical_shape() {
    let dir = TempDir::new().unwrap();
    let values: Vec<f32> = (0..24).map(|i| i as f32).collect();
    let mut writer = GGUFWriter::new();
    writer.add_tensor("t", vec![2, 3, 4], GGUFDataType::F32, f32_bytes(&values)).unwrap();
    let path = write_archive(&dir, "t.gguf", &writer);

    let dataset = load_gguf_file(&path).unwrap();
    let tensor = dataset.root_theta.tensor("t").unwrap();
    assert_eq!(tensor.shape(), &[4, 3, 2]);
    assert_eq!(tensor.dtype(), Dtype::F32);
    assert_eq!(tensor.buffer().len(), 96);
    assert!(tensor.buffer().is_mapped());
    assert_eq!(tensor.to_f32_vec().unwrap(), values);
}

#[test]
fn metadata_and_single_tensor_archive() {
    let dir = TempDir::new().unwrap();
    let mut writer = GGUFWriter::new();
    writer.add_field("general.name", "demo");
    writer.add_tensor("t", vec![4, 2], GGUFDataType::F32, f32_bytes(&[1.0; 8])).unwrap();
    let path = write_archive(&dir, "demo.gguf", &writer);

    let dataset = load_gguf_file(&path).unwrap();
    assert_eq!(dataset.properties.get_str("general.name"), Some("demo"));
    assert_eq!(dataset.properties.get_str("schema"), Some("GGUF"));
    assert_eq!(dataset.root_theta.keys().collect::<Vec<_>>(), vec!["t"]);
    assert_eq!(dataset.root_theta.tensor("t").unwrap().shape(), &[2, 4]);
}

#[test]
fn quantized_tensor_dequantizes_from_mapped_bytes() {
    let dir = TempDir::new().unwrap();
    // One Q8_0 block: scale 0.5, codes -16..16.
    let mut block = half::f16::from_f32(0.5).to_le_bytes().to_vec();
    block.extend((-16i8..16).map(|q| q as u8));
    let mut writer = GGUFWriter::new();
    writer.add_tensor("q", vec![32], GGUFDataType::Q8_0, block).unwrap();
    let path = write_archive(&dir, "q.gguf", &writer);

    let dataset = load_gguf_file(&path).unwrap();
    let tensor = dataset.root_theta.tensor("q").unwrap();
    assert!(tensor.is_quantized());
    let values = tensor.to_f32_vec().unwrap();
    assert_eq!(values[0], -8.0);
    assert_eq!(values[31], 7.5);
}

#[test]
fn truncated_tensor_data_is_malformed() {
    let dir = TempDir::new().unwrap();
    let mut writer = GGUFWriter::new();
    writer.add_tensor("w", vec![32, 2], GGUFDataType::Q8_0, vec![0; 68]).unwrap();
    let mut bytes = writer.to_bytes().unwrap();
    bytes.pop();
    let path = dir.path().join("short.gguf");
    fs::write(&path, bytes).unwrap();

    let err = load_gguf_file(&path).unwrap_err();
    assert!(matches!(&err, LoaderError::MalformedArchive { record, .. } if record == "w"), "{err}");
}

#[test]
fn unsupported_tensor_type_names_tensor_and_tag() {
    let dir = TempDir::new().unwrap();
    let mut writer = GGUFWriter::new();
    writer.add_tensor("w", vec![256], GGUFDataType::IQ4_XS, vec![0; 136]).unwrap();
    let path = write_archive(&dir, "iq.gguf", &writer);

    let err = load_gguf_file(&path).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, LoaderError::UnsupportedType { .. }));
    assert!(message.contains("'w'") && message.contains("IQ4_XS"), "{message}");
}

#[test]
fn duplicate_tensor_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut writer = GGUFWriter::new();
    writer.add_tensor("dup", vec![1], GGUFDataType::F32, vec![0; 4]).unwrap();
    writer.add_tensor("dup", vec![1], GGUFDataType::F32, vec![0; 4]).unwrap();
    let path = write_archive(&dir, "dup.gguf", &writer);

    let err = load_gguf_file(&path).unwrap_err();
    assert!(matches!(err, LoaderError::Theta(ThetaError::Duplicate(name)) if name == "dup"));
}

#[test]
fn loading_twice_gives_identical_datasets() {
    let dir = TempDir::new().unwrap();
    let mut writer = GGUFWriter::new();
    writer.add_field("general.architecture", "llama");
    writer.add_tensor("a", vec![2], GGUFDataType::F32, f32_bytes(&[1.0, 2.0])).unwrap();
    writer.add_tensor("b", vec![2], GGUFDataType::F16, vec![0; 4]).unwrap();
    let path = write_archive(&dir, "twice.gguf", &writer);

    let first = load_gguf_file(&path).unwrap();
    let second = load_gguf_file_with(&path, &GGUFLoadOptions::default()).unwrap();
    assert_eq!(first.properties, second.properties);
    assert_eq!(
        first.root_theta.keys().collect::<Vec<_>>(),
        second.root_theta.keys().collect::<Vec<_>>()
    );
    for (name, tensor) in first.root_theta.iter() {
        assert_eq!(tensor.raw(), second.root_theta.tensor(name).unwrap().raw());
    }
}

#[test]
fn model_loader_dispatches_on_extension() {
    let dir = TempDir::new().unwrap();
    let mut writer = GGUFWriter::new();
    writer.add_field("general.name", "upper");
    let path = write_archive(&dir, "MODEL.GGUF", &writer);
    assert_eq!(ModelLoader::from_file(&path).unwrap().properties.get_str("general.name"), Some("upper"));

    let other = dir.path().join("weights.safetensors");
    fs::write(&other, b"{}").unwrap();
    assert!(matches!(ModelLoader::from_file(&other).unwrap_err(), LoaderError::UnsupportedFormat(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_gguf_file(dir.path().join("absent.gguf")).unwrap_err();
    assert!(matches!(err, LoaderError::Io(_)));
}

#[test]
fn truncated_header_is_an_io_error_naming_the_location() {
    let dir = TempDir::new().unwrap();
    let mut writer = GGUFWriter::new();
    writer.add_field("general.name", "cut");
    let bytes = writer.to_bytes().unwrap();
    let path = dir.path().join("cut.gguf");
    fs::write(&path, &bytes[..12]).unwrap();

    let LoaderError::Io(err) = load_gguf_file(&path).unwrap_err() else {
        panic!("expected an IO error");
    };
    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    assert!(err.to_string().contains("tensor count"), "{err}");
}

#[test]
fn non_gguf_bytes_are_an_unsupported_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fake.gguf");
    fs::write(&path, b"PK\x03\x04not an archive").unwrap();
    assert!(matches!(load_gguf_file(&path).unwrap_err(), LoaderError::UnsupportedFormat(_)));
}
