pub const MAX_LINE_LENGTH: usize = 4096;

const LINE_END_ECHO: &[u8] = b"\r\n";
const INTERRUPT_ECHO: &[u8] = b"^C\r\n";
const ERASE_ECHO: &[u8] = b"\x08 \x08";
const BEL: u8 = 0x07;

/// Outcome of feeding one byte to the [`LineEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    /// Buffer changed (or refused a byte); echo these bytes.
    Echo(Vec<u8>),
    /// CR or LF: the line is complete. Carries the raw, untrimmed text.
    Submit(String),
    /// Ctrl+C: the partial line was discarded.
    Interrupt,
    /// Nothing to echo (erase on an empty buffer).
    Ignore,
}

impl EditAction {
    /// Bytes to send back to the client for this action.
    pub fn echo(&self) -> &[u8] {
        match self {
            EditAction::Echo(bytes) => bytes,
            EditAction::Submit(_) => LINE_END_ECHO,
            EditAction::Interrupt => INTERRUPT_ECHO,
            EditAction::Ignore => &[],
        }
    }
}

/// Server-side line editing for a dumb client terminal.
///
/// Bytes are classified one at a time. Multi-byte UTF-8 input is buffered
/// raw and decoded lossily when the line is submitted. CR and LF both end a
/// line; an LF directly after a CR belongs to the same line end.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: Vec<u8>,
    after_cr: bool,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_byte(&mut self, byte: u8) -> EditAction {
        let after_cr = std::mem::replace(&mut self.after_cr, byte == b'\r');
        match byte {
            b'\n' if after_cr => EditAction::Ignore,
            b'\r' | b'\n' => {
                let line = String::from_utf8_lossy(&self.buffer).into_owned();
                self.buffer.clear();
                EditAction::Submit(line)
            }
            0x03 => {
                self.buffer.clear();
                EditAction::Interrupt
            }
            0x7f | 0x08 => {
                if self.erase_last_char() {
                    EditAction::Echo(ERASE_ECHO.to_vec())
                } else {
                    EditAction::Ignore
                }
            }
            _ => {
                if self.buffer.len() >= MAX_LINE_LENGTH {
                    return EditAction::Echo(vec![BEL]);
                }
                self.buffer.push(byte);
                EditAction::Echo(vec![byte])
            }
        }
    }

    /// Drop the last character: a whole UTF-8 sequence when the buffer ends
    /// in a complete one, a single byte otherwise.
    fn erase_last_char(&mut self) -> bool {
        if self.buffer.is_empty() {
            return false;
        }
        let len = self.buffer.len();
        let floor = len.saturating_sub(4);
        let start = (floor..len)
            .rev()
            .find(|&i| self.buffer[i] & 0xC0 != 0x80)
            .unwrap_or(len - 1);
        let whole_char = std::str::from_utf8(&self.buffer[start..])
            .map(|s| s.chars().count() == 1)
            .unwrap_or(false);
        if whole_char {
            self.buffer.truncate(start);
        } else {
            self.buffer.pop();
        }
        true
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Current line buffer, decoded lossily
    pub fn current_line(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
