use proptest::prelude::*;
use sshpot::shell::commands::{CommandTable, Dispatcher};
use sshpot::shell::terminal::{EditAction, LineEditor, MAX_LINE_LENGTH};
use std::sync::Arc;
use std::time::Duration;

fn feed(editor: &mut LineEditor, bytes: &[u8]) -> Vec<EditAction> {
    bytes.iter().map(|&b| editor.process_byte(b)).collect()
}

proptest! {
    #[test]
    fn printable_line_submits_verbatim(line in "[ -~]{0,200}") {
        let mut editor = LineEditor::new();
        let mut actions = feed(&mut editor, line.as_bytes());
        let last = editor.process_byte(b'\r');
        actions.push(last.clone());
        prop_assert_eq!(last, EditAction::Submit(line.clone()));
        prop_assert!(editor.is_empty());

        let echoed: Vec<u8> = actions.iter().flat_map(|a| a.echo().to_vec()).collect();
        let mut expected = line.into_bytes();
        expected.extend_from_slice(b"\r\n");
        prop_assert_eq!(echoed, expected);
    }

    #[test]
    fn buffer_never_exceeds_cap(bytes in proptest::collection::vec(any::<u8>(), 0..6000)) {
        let mut editor = LineEditor::new();
        for b in bytes {
            editor.process_byte(b);
            prop_assert!(editor.buffer().len() <= MAX_LINE_LENGTH);
        }
    }

    #[test]
    fn erase_undoes_typed_ascii(word in "[a-z]{1,40}", extra in "[a-z]{1,40}") {
        let mut editor = LineEditor::new();
        feed(&mut editor, word.as_bytes());
        feed(&mut editor, extra.as_bytes());
        for _ in 0..extra.len() {
            editor.process_byte(0x7f);
        }
        prop_assert_eq!(editor.current_line(), word);
    }

    #[test]
    fn erase_removes_whole_unicode_char(prefix in "[a-z]{0,10}", ch in any::<char>().prop_filter("multi-byte", |c| c.len_utf8() > 1)) {
        let mut editor = LineEditor::new();
        feed(&mut editor, prefix.as_bytes());
        let mut buf = [0u8; 4];
        feed(&mut editor, ch.encode_utf8(&mut buf).as_bytes());
        editor.process_byte(0x08);
        prop_assert_eq!(editor.current_line(), prefix);
    }

    #[test]
    fn ctrl_c_always_clears(bytes in proptest::collection::vec(0x20u8..0x7f, 0..100)) {
        let mut editor = LineEditor::new();
        feed(&mut editor, &bytes);
        prop_assert_eq!(editor.process_byte(0x03), EditAction::Interrupt);
        prop_assert!(editor.is_empty());
    }

    #[test]
    fn dispatch_never_panics(line in "\\PC{0,200}", user in "[a-z]{0,12}") {
        let dispatcher = Dispatcher::new(
            Arc::new(CommandTable::standard()),
            "prod-server".to_string(),
            Duration::ZERO,
        );
        let _ = dispatcher.dispatch(&line, &user);
    }
}
