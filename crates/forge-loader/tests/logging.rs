use std::{
    io,
    sync::{Arc, Mutex},
};

use forge_loader::gguf::{GGUFDataType, GGUFLoadOptions, GGUFWriter, load_gguf_bytes};
use tracing::Level;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn reader_events_are_emitted_under_the_injected_span() {
    let mut writer = GGUFWriter::new();
    writer.add_field("general.name", "demo");
    writer.add_tensor("t", vec![2], GGUFDataType::F32, vec![0; 8]).unwrap();
    let bytes = writer.to_bytes().unwrap();

    let capture = Capture::default();
    let make_writer = {
        let capture = capture.clone();
        move || capture.clone()
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_writer(make_writer)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let span = tracing::info_span!("import", model = "demo");
        let options = GGUFLoadOptions::default().with_span(span);
        load_gguf_bytes(&bytes, &options).unwrap();
    });

    let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("parsed GGUF archive"), "{output}");
    assert!(output.contains("assembled dataset"), "{output}");
    assert!(output.contains("import{model=\"demo\"}"), "{output}");
    assert!(output.contains("located tensor"), "{output}");
}
