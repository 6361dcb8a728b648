#![no_main]

use am_core::Document;
use am_extract::{classify, extract};
use am_layout::GridConfig;
use am_render_xml::{render_drawio, serialize_exchange};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    // a form feed splits the input into separate vault files
    let documents: Vec<Document> = text
        .split('\u{c}')
        .enumerate()
        .map(|(index, content)| Document::new(format!("doc-{index}.md"), content))
        .collect();

    let model = extract(&documents, "fuzz");
    assert!(model.validate().is_ok());

    let grid = GridConfig::default();
    let exchange = serialize_exchange(&model, &grid);
    assert!(exchange.ends_with("</model>"));

    let drawio = render_drawio(&classify(&model, &documents), &grid);
    assert!(drawio.combined.ends_with("</mxfile>"));
});
