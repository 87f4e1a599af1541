use std::fs;
use std::io::{IsTerminal, Read};

use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum SourceKind {
    File,
    Stdin,
}

impl SourceKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Stdin => "stdin",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedSource {
    pub(crate) kind: SourceKind,
    pub(crate) content: String,
}

/// Reads a JSON payload from `path`, or from stdin when `path` is `-` or
/// absent. `stdin_override` stands in for the process stdin.
pub(crate) fn resolve_source(
    path: Option<&str>,
    stdin_override: Option<String>,
    command: &str,
) -> ClientResult<ResolvedSource> {
    let stdin_body = read_stdin(stdin_override)?;

    match path {
        Some("-") | None => match stdin_body {
            Some(content) => Ok(ResolvedSource {
                kind: SourceKind::Stdin,
                content,
            }),
            None => Err(ClientError::invalid_argument_for_command(
                "No input provided. Pass a JSON file path or pipe JSON via stdin.",
                Some(command),
            )),
        },
        Some(path_value) => {
            if stdin_body.is_some() {
                return Err(ClientError::invalid_argument_for_command(
                    "Both stdin and a file path were provided. Pass exactly one source.",
                    Some(command),
                ));
            }
            let content = fs::read_to_string(path_value).map_err(|error| {
                ClientError::invalid_argument_with_recovery(
                    &format!("Could not read input file `{path_value}`: {error}"),
                    vec![
                        "Verify the path exists and is readable.".to_string(),
                        format!("Rerun `cashcast {command} <path>`."),
                    ],
                )
            })?;
            Ok(ResolvedSource {
                kind: SourceKind::File,
                content,
            })
        }
    }
}

fn read_stdin(stdin_override: Option<String>) -> ClientResult<Option<String>> {
    if let Some(value) = stdin_override {
        return Ok(Some(value).filter(|body| !body.trim().is_empty()));
    }

    if std::io::stdin().is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|error| {
            ClientError::invalid_argument_with_recovery(
                &format!("Could not read stdin: {error}"),
                vec!["Retry with an explicit file path argument.".to_string()],
            )
        })?;

    if buffer.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(buffer))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{SourceKind, resolve_source};

    #[test]
    fn dash_reads_the_stdin_override() {
        let source = resolve_source(Some("-"), Some("[]".to_string()), "txn create");
        assert!(source.is_ok());
        if let Ok(source) = source {
            assert_eq!(source.kind, SourceKind::Stdin);
            assert_eq!(source.content, "[]");
        }
    }

    #[test]
    fn empty_stdin_without_path_is_rejected() {
        let source = resolve_source(None, Some("   ".to_string()), "txn create");
        assert!(source.is_err());
        if let Err(error) = source {
            assert_eq!(error.code, "invalid_argument");
        }
    }

    #[test]
    fn file_path_is_read_when_stdin_is_empty() {
        let temp = TempDir::new();
        assert!(temp.is_ok());
        let Ok(temp) = temp else {
            return;
        };
        let path = temp.path().join("drafts.json");
        assert!(fs::write(&path, "[{}]").is_ok());

        let path_text = path.display().to_string();
        let source = resolve_source(Some(&path_text), Some(String::new()), "txn create");
        assert!(source.is_ok());
        if let Ok(source) = source {
            assert_eq!(source.kind.as_str(), "file");
            assert_eq!(source.content, "[{}]");
        }
    }
}
