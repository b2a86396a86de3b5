mod common;

use a2dl::config::ScanOptions;
use a2dl::library::report::{ScanIssueCode, ScanSeverity};
use a2dl::library::{read_mxlibrary, Library};
use a2dl::A2dlError;
use tempfile::tempdir;

#[test]
fn folder_to_container_keeps_every_icon() {
    let temp = tempdir().expect("create temp dir");
    let icons = temp.path().join("icons");
    common::write_png(&icons.join("images/pump.png"), 100, 50);
    common::write_adoc(
        &icons.join("pump.adoc"),
        &common::icon_adoc(
            "Pump",
            Some("images/pump.png"),
            &[("Function", "function", "Moves water.")],
        ),
    );
    common::write_adoc(
        &icons.join("sub/valve.adoc"),
        &common::icon_adoc("Valve", None, &[("Size", "size", "DN50")]),
    );

    let (library, report) = Library::from_folder(&icons, &ScanOptions::default()).expect("scan");
    assert_eq!(report.scanned, 2);
    assert_eq!(report.icons, 2);
    assert!(report.issues.is_empty());
    assert_eq!(library.names(), &["Pump", "Valve"]);

    let out = temp.path().join("out/icons.xml");
    library.write(&out).expect("write library");
    let entries = read_mxlibrary(&out).expect("read library");
    assert_eq!(entries.len(), 2);

    let pump = entries[0].object().expect("pump object");
    assert_eq!(pump.attr("name"), Some("Pump"));
    assert_eq!(pump.attr("function"), Some("Moves water."));
    assert_eq!((entries[0].w, entries[0].h), (80.0, 40.0));
    let style = pump
        .child("mxCell")
        .and_then(|cell| cell.attr("style"))
        .expect("cell style");
    assert!(style.contains("image=data:image/png,iVBORw0KGgo"));

    let valve = entries[1].object().expect("valve object");
    assert_eq!(valve.attr("size"), Some("DN50"));
    assert_eq!((entries[1].w, entries[1].h), (80.0, 80.0));
}

#[test]
fn non_icons_are_counted_as_warnings() {
    let temp = tempdir().expect("create temp dir");
    let icons = temp.path().join("icons");
    for idx in 0..3 {
        common::write_adoc(
            &icons.join(format!("icon{idx}.adoc")),
            &common::icon_adoc(&format!("Icon{idx}"), None, &[("T", "v", "x")]),
        );
    }
    for idx in 0..2 {
        common::write_note(&icons.join(format!("note{idx}.adoc")));
    }

    let (library, report) = Library::from_folder(&icons, &ScanOptions::default()).expect("scan");
    assert_eq!(library.len(), 3);
    assert_eq!(report.warning_count(), 2);
    assert_eq!(report.error_count(), 0);
    assert!(report
        .issues
        .iter()
        .all(|issue| issue.code == ScanIssueCode::NotAnIcon));
    assert!(report.to_string().contains("note0.adoc"));
}

#[test]
fn missing_image_is_an_error_but_scan_continues() {
    let temp = tempdir().expect("create temp dir");
    let icons = temp.path().join("icons");
    common::write_adoc(
        &icons.join("broken.adoc"),
        &common::icon_adoc("Broken", Some("images/missing.png"), &[]),
    );
    common::write_adoc(
        &icons.join("ok.adoc"),
        &common::icon_adoc("Ok", None, &[("T", "v", "x")]),
    );

    let (library, report) = Library::from_folder(&icons, &ScanOptions::default()).expect("scan");
    assert_eq!(library.names(), &["Ok"]);
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.issues[0].severity, ScanSeverity::Error);
    assert_eq!(report.issues[0].code, ScanIssueCode::ReadFailed);
}

#[test]
fn glob_limits_scanned_documents() {
    let temp = tempdir().expect("create temp dir");
    let icons = temp.path().join("icons");
    common::write_adoc(
        &icons.join("keep/a.adoc"),
        &common::icon_adoc("A", None, &[("T", "v", "x")]),
    );
    common::write_adoc(
        &icons.join("drop/b.adoc"),
        &common::icon_adoc("B", None, &[("T", "v", "x")]),
    );

    let opts = ScanOptions {
        glob: "keep/*.adoc".to_string(),
        ..Default::default()
    };
    let (library, report) = Library::from_folder(&icons, &opts).expect("scan");
    assert_eq!(library.names(), &["A"]);
    assert_eq!(report.scanned, 1);
}

#[test]
fn image_base_path_overrides_document_folder() {
    let temp = tempdir().expect("create temp dir");
    let icons = temp.path().join("icons");
    let images = temp.path().join("shared");
    common::write_png(&images.join("tank.png"), 40, 80);
    common::write_adoc(
        &icons.join("tank.adoc"),
        &common::icon_adoc("Tank", Some("tank.png"), &[]),
    );

    let mut opts = ScanOptions::default();
    opts.build.image_base_path = Some(images);
    let (library, _) = Library::from_folder(&icons, &opts).expect("scan");
    let tank = library.get("Tank").expect("tank");
    assert_eq!(tank.image.as_ref().and_then(|image| image.size), Some((40, 80)));
    assert_eq!(library.placement(tank).height, 160.0);
}

#[test]
fn missing_folder_fails() {
    let temp = tempdir().expect("create temp dir");
    let err = Library::from_folder(&temp.path().join("nope"), &ScanOptions::default()).unwrap_err();
    assert!(matches!(err, A2dlError::NotFound { .. }));
}
