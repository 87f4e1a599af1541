use std::io::{self, Write};

/// Writes help text without a trailing newline of its own.
pub fn write_stdout_text(text: &str) -> io::Result<()> {
    emit(&mut io::stdout().lock(), text, false)
}

pub fn write_stdout_line(text: &str) -> io::Result<()> {
    emit(&mut io::stdout().lock(), text, true)
}

/// A closed pipe (`cashcast ... | head`) is treated as a successful write.
fn emit<W: Write>(writer: &mut W, text: &str, newline: bool) -> io::Result<()> {
    let result = writer
        .write_all(text.as_bytes())
        .and_then(|()| if newline { writer.write_all(b"\n") } else { Ok(()) })
        .and_then(|()| writer.flush());
    match result {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
