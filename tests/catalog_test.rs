//! End-to-end tests over a VirtualBox-style catalog on disk.

#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use std::path::{
    Path,
    PathBuf,
};

use pretty_assertions::assert_eq;
use ts_catalog::Translator;
use ts_catalog::catalog::{
    TranslationState,
    load_catalog,
    parse_catalog,
    write_catalog,
};
use ts_catalog::config::{
    DiagnosticsConfig,
    LookupConfig,
};
use ts_catalog::diagnostics::{
    DiagnosticKind,
    generate_diagnostics,
};

const SAVED_STATE: &str = "<p>Are you sure you want to discard the saved state of the following %n virtual machine(s)?</p><p><b>%1</b></p>";

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/VirtualBox_en.ts")
}

fn translator() -> Translator {
    let catalog = load_catalog(&fixture()).unwrap();
    Translator::from_catalog(catalog, &LookupConfig::default()).unwrap()
}

#[test]
fn test_fixture_structure() {
    let catalog = load_catalog(&fixture()).unwrap();

    assert_eq!(catalog.version, "2.1");
    assert_eq!(catalog.language.as_deref(), Some("en"));
    let names: Vec<&str> = catalog.contexts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["VBoxGlobal", "UIMessageCenter"]);
    assert_eq!(catalog.message_count(), 7);

    let saved_state = catalog.message("UIMessageCenter", SAVED_STATE).unwrap();
    assert!(saved_state.plural);
    assert_eq!(saved_state.translation.body.form_count(), 2);

    let discard = catalog.message("UIMessageCenter", "Discard").unwrap();
    assert_eq!(discard.comment.as_deref(), Some("saved state"));
    assert_eq!(discard.extra_comment.as_deref(), Some("Button label"));
    assert_eq!(discard.translation.state, TranslationState::Unfinished);
}

#[test]
fn test_write_then_parse_keeps_catalog() {
    let catalog = load_catalog(&fixture()).unwrap();

    let written = write_catalog(&catalog).unwrap();
    let reparsed = parse_catalog(&written).unwrap();

    assert_eq!(reparsed, catalog);
}

#[test]
fn test_year_plurals() {
    let translator = translator();

    assert_eq!(translator.translate("VBoxGlobal", "%n year(s)", Some(1)), "1 year");
    assert_eq!(translator.translate("VBoxGlobal", "%n year(s)", Some(5)), "5 years");
    assert_eq!(translator.translate("VBoxGlobal", "%n day(s)", Some(0)), "0 days");
}

#[test]
fn test_saved_state_question() {
    let translator = translator();

    assert_eq!(
        translator.translate_with_args("UIMessageCenter", SAVED_STATE, Some(1), &["vm1"]),
        "<p>Are you sure you want to discard the saved state of the following virtual machine?</p><p><b>vm1</b></p>"
    );
    assert_eq!(
        translator.translate_with_args("UIMessageCenter", SAVED_STATE, Some(3), &["vm1, vm2, vm3"]),
        "<p>Are you sure you want to discard the saved state of the following 3 virtual machines?</p><p><b>vm1, vm2, vm3</b></p>"
    );
}

#[test]
fn test_missing_and_retired_fall_back_to_source() {
    let translator = translator();

    assert_eq!(translator.translate("UIMessageCenter", "Discard", None), "Discard");
    assert_eq!(
        translator.lookup(
            "UIMessageCenter",
            "Failed to create the host-only network interface.",
            None
        ),
        None
    );
    assert_eq!(translator.translate("Nowhere", "Unknown %n", Some(2)), "Unknown 2");
}

#[test]
fn test_diagnostics_flag_unfinished_message() {
    let catalog = load_catalog(&fixture()).unwrap();

    let diagnostics = generate_diagnostics(&catalog, &DiagnosticsConfig::default());

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Unfinished);
    assert_eq!(diagnostics[0].context, "UIMessageCenter");
    assert_eq!(diagnostics[0].source, "Discard");
}
