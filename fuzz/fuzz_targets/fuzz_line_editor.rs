#![no_main]
use libfuzzer_sys::fuzz_target;
use sshpot::shell::commands::{CommandTable, Dispatcher};
use sshpot::shell::terminal::{EditAction, LineEditor, MAX_LINE_LENGTH};
use std::sync::Arc;
use std::time::Duration;

fuzz_target!(|data: &[u8]| {
    let dispatcher = Dispatcher::new(
        Arc::new(CommandTable::standard()),
        "fuzz".to_string(),
        Duration::ZERO,
    );
    let mut editor = LineEditor::new();
    for &byte in data {
        if let EditAction::Submit(line) = editor.process_byte(byte) {
            let _ = dispatcher.dispatch(&line, "fuzz");
        }
        assert!(editor.buffer().len() <= MAX_LINE_LENGTH);
    }
});
