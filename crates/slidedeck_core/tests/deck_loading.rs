use slidedeck_core::{
    resolve_background, resolve_element_style, resolve_length, resolve_length_str, to_percentage,
    Background, DeckSource, Document, DocumentError, EditingSession, EditorConfig, Element,
    InMemoryDeckSource, JsonFileDeckSource, Length, LoadError, Slide, SourceError, CANVAS_WIDTH,
};
use std::fs;

const DECK_JSON: &str = r##"{
  "slides": [
    {
      "id": "intro",
      "background": { "kind": "gradient", "value": "linear-gradient(90deg, #000, #fff)" },
      "notes": "Open with the headline",
      "elements": [
        {
          "id": "headline",
          "type": "text",
          "x": "10%",
          "y": 40,
          "width": "80%",
          "height": "auto",
          "content": "<h1>Quarterly <em>review</em></h1>",
          "style": { "color": "#1a1a1a", "align": "center", "font_size": "8%", "bold": true }
        },
        {
          "id": "logo",
          "type": "image",
          "x": 860,
          "y": 20,
          "width": 80,
          "height": 80,
          "src": "logo.png",
          "fit": "contain"
        }
      ]
    },
    {
      "id": "agenda",
      "background": { "kind": "color", "value": "not a color!" },
      "elements": [
        { "id": "items", "type": "list", "content": "<ul><li>One</li></ul>", "ordered": false },
        { "id": "grid", "type": "table", "rows": [["a", "b"], ["c", "d"]] },
        { "id": "box", "type": "shape", "shape": "ellipse", "fill": "#ff000080" }
      ]
    }
  ]
}"##;

#[test]
fn file_source_loads_deck_into_session() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("req-42.json"), DECK_JSON).unwrap();

    let source = JsonFileDeckSource::new(dir.path());
    let session = EditingSession::load(&source, "req-42", EditorConfig::default()).unwrap();

    let document = session.document();
    assert_eq!(document.len(), 2);
    let intro = document.slide(&"intro".into()).unwrap();
    assert_eq!(intro.notes.as_deref(), Some("Open with the headline"));
    assert_eq!(intro.element_count(), 2);
    assert!(!session.history().can_undo());

    let frame = session
        .render_frame(&"intro".into(), &"headline".into())
        .unwrap();
    assert_eq!(frame.x, 96.0);
    assert_eq!(frame.y, 40.0);
    assert_eq!(frame.width, 768.0);
    assert_eq!(frame.height, 0.0);
}

#[test]
fn missing_deck_is_a_terminal_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    let source = JsonFileDeckSource::new(dir.path());

    let err = EditingSession::load(&source, "absent", EditorConfig::default()).unwrap_err();
    let LoadError::LoadFailed { request_id, source } = err;
    assert_eq!(request_id, "absent");
    assert!(matches!(source, SourceError::NotFound(_)));
}

#[test]
fn malformed_deck_fails_to_decode() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.json"), "{\"slides\": [").unwrap();
    fs::write(
        dir.path().join("dupes.json"),
        r#"{"slides": [{"id": "s"}, {"id": "s"}]}"#,
    )
    .unwrap();
    let source = JsonFileDeckSource::new(dir.path());

    assert!(matches!(
        source.fetch_deck("broken"),
        Err(SourceError::Decode(DocumentError::Json(_)))
    ));
    assert!(matches!(
        source.fetch_deck("dupes"),
        Err(SourceError::Decode(DocumentError::Invalid(_)))
    ));
}

#[test]
fn export_preserves_wire_shape_and_unparsed_lengths() {
    let document = Document::from_json_str(DECK_JSON).unwrap();
    let exported = document.to_json_string().unwrap();
    let value: serde_json::Value = serde_json::from_str(&exported).unwrap();

    let headline = &value["slides"][0]["elements"][0];
    assert_eq!(headline["type"], "text");
    assert_eq!(headline["x"], "10%");
    assert_eq!(headline["height"], "auto");
    assert_eq!(headline["style"]["align"], "center");
    assert_eq!(value["slides"][0]["background"]["kind"], "gradient");
    assert_eq!(value["slides"][1]["elements"][2]["shape"], "ellipse");

    assert_eq!(Document::from_json_str(&exported).unwrap(), document);
}

#[test]
fn session_export_is_side_effect_free() {
    let source = InMemoryDeckSource::new().with_deck(
        "demo",
        Document::from_json_str(DECK_JSON).unwrap(),
    );
    let mut session = EditingSession::load(&source, "demo", EditorConfig::default()).unwrap();
    let exported = session.export_json().unwrap();

    session.reorder_slide(1, 0).unwrap();
    assert_ne!(session.export_json().unwrap(), exported);
    assert_eq!(Document::from_json_str(&exported).unwrap(), source.fetch_deck("demo").unwrap());
}

#[test]
fn malformed_background_and_styles_fall_back_to_defaults() {
    let document = Document::from_json_str(DECK_JSON).unwrap();

    let agenda = document.slide(&"agenda".into()).unwrap();
    let background = resolve_background(agenda.background.as_ref());
    assert_eq!(background.get("background-color").map(String::as_str), Some("#ffffff"));
    assert!(!background.contains_key("background-image"));

    let intro = document.slide(&"intro".into()).unwrap();
    let background = resolve_background(intro.background.as_ref());
    assert_eq!(
        background.get("background-image").map(String::as_str),
        Some("linear-gradient(90deg, #000, #fff)")
    );

    let headline = intro.element(&"headline".into()).unwrap();
    let style = resolve_element_style(headline);
    assert_eq!(style.get("color").map(String::as_str), Some("#1a1a1a"));
    assert_eq!(style.get("font-weight").map(String::as_str), Some("700"));
    assert_eq!(style.get("text-align").map(String::as_str), Some("center"));

    let image_background = resolve_background(Some(&Background::Image("  ".to_string())));
    assert_eq!(image_background.len(), 1);
}

#[test]
fn percentage_round_trip_holds_across_the_canvas() {
    let mut px = -50.0;
    while px <= CANVAS_WIDTH + 50.0 {
        let back = resolve_length(&to_percentage(px, CANVAS_WIDTH), CANVAS_WIDTH);
        assert!((back - px).abs() < 1e-6, "px={px} back={back}");
        px += 7.3;
    }
    assert_eq!(resolve_length(&Length::parse("garbage"), CANVAS_WIDTH), 0.0);
    assert_eq!(resolve_length_str("25%", CANVAS_WIDTH), 240.0);
    assert_eq!(resolve_length_str("garbage", CANVAS_WIDTH), 0.0);
}

#[test]
fn new_slides_and_elements_get_unique_ids() {
    let first = Slide::new(slidedeck_core::SlideId::generate());
    let second = Slide::new(slidedeck_core::SlideId::generate());
    assert_ne!(first.id, second.id);

    let element = Element::text(
        slidedeck_core::ElementId::generate(),
        Default::default(),
        "x",
    );
    assert!(!element.id.as_str().is_empty());
}
