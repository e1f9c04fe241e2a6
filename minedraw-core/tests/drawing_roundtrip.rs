use minedraw_core::demo::demo_document;
use minedraw_core::io::{load_drawing, parse_drawing, save_drawing, to_json};
use minedraw_core::storage::{load_document, save_document};
use minedraw_core::{Dimensions, FileStore};

#[test]
fn drawing_roundtrip() {
    let mut doc = demo_document(Dimensions::default());
    doc.toggle_visibility(1);
    doc.select(3).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("minedraw-demo.json");
    save_drawing(&path, &doc).unwrap();
    let back = load_drawing(&path, Dimensions::default()).unwrap();

    assert_eq!(back, doc);
    assert_eq!(back.active_layer_id, 3);
    assert!(!back.layer(1).unwrap().visible);
}

#[test]
fn autosave_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let doc = demo_document(Dimensions::default());

    let mut store = FileStore::new(dir.path());
    save_document(&mut store, &doc).unwrap();

    let reopened = FileStore::new(dir.path());
    let restored = load_document(&reopened, Dimensions::default())
        .unwrap()
        .unwrap();
    assert_eq!(restored, doc);
}

#[test]
fn exported_json_keeps_camel_case_field_names() {
    let doc = demo_document(Dimensions::default());
    let json: serde_json::Value = serde_json::from_str(&to_json(&doc).unwrap()).unwrap();

    assert_eq!(json["activeLayerId"], 2);
    assert_eq!(json["layers"][0]["name"], "Arrière-plan");
    assert_eq!(json["layers"][1]["gridData"][29][0], "textures/block/dirt.png");
    assert!(json["layers"][2]["gridData"][0][0].is_null());

    // Same text is accepted by the importer.
    let again = parse_drawing(&json.to_string(), Dimensions::default()).unwrap();
    assert_eq!(again, doc);
}
