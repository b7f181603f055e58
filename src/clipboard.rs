use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("no clipboard tool available")]
    Unavailable,
    #[error("clipboard tool {tool} failed: {message}")]
    Failed { tool: &'static str, message: String },
}

/// Write text to the system clipboard
pub fn write_clipboard_text(text: &str) -> Result<(), ClipboardError> {
    #[cfg(target_os = "macos")]
    {
        pipe_to("pbcopy", &[], text)
    }

    #[cfg(target_os = "windows")]
    {
        pipe_to("clip", &[], text)
    }

    #[cfg(target_os = "linux")]
    {
        // Try xclip first, then xsel
        match pipe_to("xclip", &["-selection", "clipboard"], text) {
            Ok(()) => Ok(()),
            Err(first) => {
                tracing::debug!(error = %first, "xclip unavailable, trying xsel");
                pipe_to("xsel", &["--clipboard", "--input"], text)
            }
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        let _ = text;
        Err(ClipboardError::Unavailable)
    }
}

fn pipe_to(tool: &'static str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ClipboardError::Unavailable,
            _ => ClipboardError::Failed {
                tool,
                message: e.to_string(),
            },
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| ClipboardError::Failed {
                tool,
                message: e.to_string(),
            })?;
    }

    let status = child.wait().map_err(|e| ClipboardError::Failed {
        tool,
        message: e.to_string(),
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(ClipboardError::Failed {
            tool,
            message: format!("exit status {}", status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_clipboard_reports_outcome() {
        // Depends on system state: either a tool took the text or a typed error comes back.
        match write_clipboard_text("A1") {
            Ok(()) | Err(ClipboardError::Unavailable) | Err(ClipboardError::Failed { .. }) => {}
        }
    }

    #[test]
    fn test_missing_tool_is_unavailable() {
        let err = pipe_to("definitely-not-a-clipboard-tool", &[], "A1").unwrap_err();
        assert!(matches!(err, ClipboardError::Unavailable));
    }
}
