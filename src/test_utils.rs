//! Shared catalog builders for unit tests.
#![cfg(test)]

use crate::catalog::{
    Catalog,
    Message,
    TranslationState,
};
use crate::types::SourceLocation;

/// Source text of the saved-state plural message.
pub(crate) const SAVED_STATE_SOURCE: &str = "<p>Are you sure you want to discard the saved state of \
     the following %n virtual machine(s)?</p><p><b>%1</b></p>";

/// English catalog covering every lookup path:
///
/// - `VBoxGlobal`: `%n year(s)` plural
/// - `UIMessageCenter`: saved-state plural, a positional message, a vanished
///   entry, an empty unfinished entry and a non-empty unfinished entry
pub(crate) fn sample_catalog() -> Catalog {
    let mut catalog = Catalog::new("en");
    catalog.context_or_insert("VBoxGlobal").messages.push(
        Message::plural("%n year(s)", ["%n year", "%n years"])
            .with_location(SourceLocation::new("../src/globals/VBoxGlobal.cpp", 1828)),
    );

    let center = catalog.context_or_insert("UIMessageCenter");
    center.messages.push(Message::plural(
        SAVED_STATE_SOURCE,
        [
            "<p>Are you sure you want to discard the saved state of the following virtual \
             machine?</p><p><b>%1</b></p>",
            "<p>Are you sure you want to discard the saved state of the following %n virtual \
             machines?</p><p><b>%1</b></p>",
        ],
    ));
    center.messages.push(Message::new("Machine <b>%1</b>", "Machine <b>%1</b>"));
    center.messages.push(Message::new("Old text", "Old").with_state(TranslationState::Vanished));
    center.messages.push(Message::new("Pending", "").with_state(TranslationState::Unfinished));
    center
        .messages
        .push(Message::new("Draft", "Draft translation").with_state(TranslationState::Unfinished));
    catalog
}
