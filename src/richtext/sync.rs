// src/richtext/sync.rs
//! Reconciles an editor's live content with a value controlled from outside (form state)

use super::{normalize_markup, plain_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Editor has focus and already shows the same text; keep the user's markup and caret
    FocusedSameText,
    /// The value is the one this editor just emitted
    OwnEcho,
    /// Only whitespace differs
    SameMarkup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    Skip(SkipReason),
    Replace,
}

/// Editor-side state for one rich-text field
#[derive(Debug, Clone, Default)]
pub struct RichTextSync {
    content: String,
    focused: bool,
    last_emitted: Option<String>,
}

impl RichTextSync {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            content: initial.into(),
            focused: false,
            last_emitted: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// The user changed the editor; returns the value to emit upstream
    pub fn user_edit(&mut self, html: impl Into<String>) -> String {
        let html = html.into();
        self.content = html.clone();
        self.last_emitted = Some(html.clone());
        html
    }

    /// Decide whether an external value should overwrite the editor, without applying it
    pub fn decide(&self, incoming: &str) -> SyncDecision {
        if incoming == self.content {
            return SyncDecision::Skip(SkipReason::SameMarkup);
        }

        if self.focused && plain_text(incoming) == plain_text(&self.content) {
            return SyncDecision::Skip(SkipReason::FocusedSameText);
        }

        if self.last_emitted.as_deref() == Some(incoming) {
            return SyncDecision::Skip(SkipReason::OwnEcho);
        }

        // Inter-tag whitespace can be visible between inline elements, so the
        // text has to match as well
        if normalize_markup(incoming) == normalize_markup(&self.content)
            && plain_text(incoming) == plain_text(&self.content)
        {
            return SyncDecision::Skip(SkipReason::SameMarkup);
        }

        SyncDecision::Replace
    }

    /// Apply an external value (form reset, record load, parent state update)
    pub fn receive_external(&mut self, incoming: &str) -> SyncDecision {
        let decision = self.decide(incoming);
        if decision == SyncDecision::Replace {
            self.content = incoming.to_string();
            self.last_emitted = None;
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focused_editor_keeps_in_progress_markup() {
        let mut editor = RichTextSync::new("<p>Hello world</p>");
        editor.focus();
        editor.user_edit("<p>Hello <strong>world</strong></p>");

        // Parent re-renders with an older serialization of the same text
        let decision = editor.receive_external("<p>Hello world</p>");

        assert_eq!(decision, SyncDecision::Skip(SkipReason::FocusedSameText));
        assert_eq!(editor.content(), "<p>Hello <strong>world</strong></p>");
    }

    #[test]
    fn unfocused_reset_replaces_content_exactly() {
        let mut editor = RichTextSync::new("<p>Old text</p>");
        editor.user_edit("<p>Old text edited</p>");
        editor.blur();

        let decision = editor.receive_external("<p>Brand new</p>");

        assert_eq!(decision, SyncDecision::Replace);
        assert_eq!(editor.content(), "<p>Brand new</p>");
    }

    #[test]
    fn own_emitted_value_is_not_reapplied() {
        let mut editor = RichTextSync::new("");
        editor.focus();
        let emitted = editor.user_edit("<p>typed</p>");
        editor.user_edit("<p>typed more</p>");

        // Stale echo of the first emission arrives while the user keeps typing
        assert_eq!(
            editor.decide(&emitted),
            SyncDecision::Replace,
            "a stale echo that is not the last emission is a real change"
        );

        let last = editor.user_edit("<p>typed more!</p>");
        editor.blur();
        assert_eq!(
            editor.receive_external(&last),
            SyncDecision::Skip(SkipReason::SameMarkup)
        );
    }

    #[test]
    fn echo_of_last_emission_is_skipped_when_content_moved_on() {
        let mut editor = RichTextSync::new("");
        let emitted = editor.user_edit("<p>draft</p>");
        // Content diverges without emitting (e.g. editor-side formatting pass)
        editor.content = "<p>draft <em>styled</em></p>".to_string();

        assert_eq!(
            editor.receive_external(&emitted),
            SyncDecision::Skip(SkipReason::OwnEcho)
        );
        assert_eq!(editor.content(), "<p>draft <em>styled</em></p>");
    }

    #[test]
    fn whitespace_only_difference_is_skipped() {
        let mut editor = RichTextSync::new("<p>Hello world</p>");
        assert_eq!(
            editor.receive_external("<p>Hello   world</p>\n"),
            SyncDecision::Skip(SkipReason::SameMarkup)
        );
    }

    #[test]
    fn unfocused_same_text_different_markup_is_replaced() {
        let mut editor = RichTextSync::new("<p>Hello world</p>");
        assert_eq!(
            editor.receive_external("<p>Hello <em>world</em></p>"),
            SyncDecision::Replace
        );
        assert_eq!(editor.content(), "<p>Hello <em>world</em></p>");
    }

    #[test]
    fn unfocused_reset_dropping_space_between_inline_tags_is_replaced() {
        let mut editor = RichTextSync::new("<p><strong>Hello</strong> <em>world</em></p>");

        let incoming = "<p><strong>Hello</strong><em>world</em></p>";
        assert_eq!(editor.receive_external(incoming), SyncDecision::Replace);
        assert_eq!(editor.content(), incoming);
    }

    #[test]
    fn whitespace_between_blocks_is_skipped() {
        let mut editor = RichTextSync::new("<p>a</p> <p>b</p>");
        assert_eq!(
            editor.receive_external("<p>a</p>\n<p>b</p>"),
            SyncDecision::Skip(SkipReason::SameMarkup)
        );
    }
}
