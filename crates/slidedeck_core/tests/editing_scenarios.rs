use slidedeck_core::{
    ActionKind, Document, EditingSession, EditorConfig, EditorError, Element, ElementChange,
    ElementId, Geometry, HistoryError, Length, PatchError, PatchTarget, Replay, SessionError,
    Slide, SlideId, SurfaceHandle,
};

fn deck() -> Document {
    Document::new(vec![
        Slide::new("s1")
            .with_element(Element::text(
                "title",
                Geometry::new(Length::percent(10.0), Length::percent(10.0), 480.0, 80.0),
                "<p>Hello</p>",
            ))
            .with_element(Element::image(
                "hero",
                Geometry::new(0.0, 200.0, 960.0, 340.0),
                "hero.png",
            )),
        Slide::new("s2"),
        Slide::new("s3"),
    ])
    .unwrap()
}

fn session() -> EditingSession {
    EditingSession::from_document(deck(), EditorConfig::default())
}

fn title_content(session: &EditingSession) -> Option<String> {
    session
        .document()
        .element(&"s1".into(), &"title".into())
        .and_then(Element::content)
        .map(str::to_string)
}

#[test]
fn text_edit_is_recorded_with_preview_and_undone() {
    let mut session = session();
    session.attach(SurfaceHandle::new("s1", "title")).unwrap();

    assert!(session.save("<p>Hello <b>World</b></p>").unwrap());
    assert_eq!(title_content(&session).as_deref(), Some("<p>Hello <b>World</b></p>"));

    let toolbar = session.toolbar();
    assert!(toolbar.can_undo);
    assert!(!toolbar.can_redo);
    assert_eq!(
        toolbar.pending_undo_description.as_deref(),
        Some("Edit text of title: \"Hello World\"")
    );
    assert_eq!(toolbar.undo_label(), "Undo: Edit text of title: \"Hello World\"");

    let replay = session.undo().unwrap();
    assert_eq!(
        replay,
        Replay::Applied {
            kind: ActionKind::ElementUpdate,
            description: "Edit text of title: \"Hello World\"".to_string(),
        }
    );
    assert_eq!(title_content(&session).as_deref(), Some("<p>Hello</p>"));
    assert!(session.toolbar().can_redo);

    session.redo().unwrap();
    assert_eq!(title_content(&session).as_deref(), Some("<p>Hello <b>World</b></p>"));
}

#[test]
fn saving_unchanged_content_records_nothing() {
    let mut session = session();
    session.attach(SurfaceHandle::new("s1", "title")).unwrap();
    assert!(!session.save("<p>Hello</p>").unwrap());
    assert!(!session.history().can_undo());
}

#[test]
fn save_without_surface_is_rejected() {
    let mut session = session();
    let err = session.save("x").unwrap_err();
    assert_eq!(err, SessionError::Editor(EditorError::NoActiveSurface));
}

#[test]
fn image_cannot_host_a_text_surface() {
    let mut session = session();
    let err = session.attach(SurfaceHandle::new("s1", "hero")).unwrap_err();
    assert!(matches!(
        err.patch_error(),
        Some(PatchError::InvalidVariant { field: "content", .. })
    ));
    assert!(session.active_surface().is_none());
}

#[test]
fn reorder_moves_slide_and_undo_restores_order() {
    let mut session = session();
    session.reorder_slide(2, 0).unwrap();
    assert_eq!(
        session.document().slide_ids(),
        vec![SlideId::new("s3"), SlideId::new("s1"), SlideId::new("s2")]
    );
    assert_eq!(
        session.history().peek_undo().map(|action| action.kind()),
        Some(ActionKind::SlideReorder)
    );

    session.undo().unwrap();
    assert_eq!(session.document(), &deck());
}

#[test]
fn invalid_patch_is_rejected_without_side_effects() {
    let mut session = session();
    let before = session.export();

    let err = session
        .update_element(
            &"s1".into(),
            &"missing".into(),
            ElementChange::Content("x".to_string()),
            "edit missing",
        )
        .unwrap_err();
    assert_eq!(
        err,
        SessionError::History(HistoryError::Patch(PatchError::NotFound(
            PatchTarget::Element {
                slide_id: "s1".into(),
                element_id: "missing".into(),
            }
        )))
    );

    let err = session
        .update_element(
            &"s1".into(),
            &"hero".into(),
            ElementChange::Content("x".to_string()),
            "edit image text",
        )
        .unwrap_err();
    assert!(matches!(
        err.patch_error(),
        Some(PatchError::InvalidVariant { .. })
    ));

    assert_eq!(session.export(), before);
    assert!(!session.history().can_undo());
}

#[test]
fn out_of_range_reorder_is_rejected() {
    let mut session = session();
    let err = session.reorder_slide(0, 3).unwrap_err();
    assert_eq!(
        err.patch_error(),
        Some(&PatchError::IndexOutOfBounds { index: 3, len: 3 })
    );
    assert_eq!(session.document(), &deck());
}

#[test]
fn direct_manipulation_helpers_record_one_entry_each() {
    let mut session = session();
    let slide_id = SlideId::new("s1");
    let title = ElementId::new("title");

    session
        .move_element(&slide_id, &title, Length::px(20.0), Length::px(30.0))
        .unwrap();
    session
        .resize_element(&slide_id, &title, Length::percent(50.0), Length::px(90.0))
        .unwrap();
    let added = session
        .add_element(
            &slide_id,
            None,
            Element::text(ElementId::generate(), Geometry::default(), "new"),
        )
        .unwrap();
    session.set_slide_notes(&slide_id, Some("speak slowly".to_string())).unwrap();

    assert_eq!(session.history().past_len(), 4);
    let frame = session.render_frame(&slide_id, &title).unwrap();
    assert_eq!((frame.x, frame.y, frame.width, frame.height), (20.0, 30.0, 480.0, 90.0));

    let slide = session.document().slide(&slide_id).unwrap();
    assert_eq!(slide.element_count(), 3);
    assert_eq!(slide.element_index(&added), Some(2));
    assert_eq!(slide.notes.as_deref(), Some("speak slowly"));

    for _ in 0..4 {
        session.undo().unwrap();
    }
    assert_eq!(session.document(), &deck());
}

#[test]
fn deleting_attached_element_detaches_and_undo_restores_z_order() {
    let mut session = session();
    session.attach(SurfaceHandle::new("s1", "title")).unwrap();
    session.delete_element(&"s1".into(), &"title".into()).unwrap();

    assert!(session.active_surface().is_none());
    assert!(session.document().element(&"s1".into(), &"title".into()).is_none());

    session.undo().unwrap();
    let slide = session.document().slide(&"s1".into()).unwrap();
    assert_eq!(slide.element_index(&"title".into()), Some(0));
    assert_eq!(slide.element_index(&"hero".into()), Some(1));
}

#[test]
fn slide_add_and_delete_are_undoable() {
    let mut session = session();
    let added = session.add_slide(Some(1), Slide::new(SlideId::generate())).unwrap();
    assert_eq!(session.document().slide_index(&added), Some(1));

    session.delete_slide(&"s1".into()).unwrap();
    assert_eq!(session.document().len(), 3);

    session.undo().unwrap();
    session.undo().unwrap();
    assert_eq!(session.document(), &deck());
}

#[test]
fn render_slide_projects_background_and_elements_in_order() {
    let session = session();
    let rendered = session.render_slide(&"s1".into()).unwrap();
    assert_eq!(
        rendered.background.get("background-color").map(String::as_str),
        Some("#ffffff")
    );
    let ids: Vec<&str> = rendered.elements.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["title", "hero"]);
    assert_eq!(
        rendered.elements[0].1.get("left").map(String::as_str),
        Some("96px")
    );
    assert!(session.render_slide(&"nope".into()).is_none());
}

#[test]
fn reset_clears_history_and_replaces_document() {
    let mut session = session();
    session.reorder_slide(0, 1).unwrap();
    session.reset(Document::empty());

    assert!(session.document().is_empty());
    assert!(!session.history().can_undo());
    assert_eq!(session.undo().unwrap(), Replay::Nothing);
}

#[test]
fn non_finite_geometry_is_stored_as_zero_and_exports_cleanly() {
    let mut session = session();
    session
        .move_element(
            &"s1".into(),
            &"title".into(),
            Length::Px(f64::NAN),
            Length::Percent(f64::INFINITY),
        )
        .unwrap();

    let frame = session.render_frame(&"s1".into(), &"title".into()).unwrap();
    assert_eq!(frame.x, 0.0);
    assert_eq!(frame.y, 0.0);

    let exported = session.export_json().unwrap();
    let reloaded = Document::from_json_str(&exported).unwrap();
    assert_eq!(reloaded, session.export());
}
