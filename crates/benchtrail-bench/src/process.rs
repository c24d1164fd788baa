//! Helpers shared by everything that spawns a subprocess.

use std::process::Output;

use benchtrail_core::constants::STDERR_TAIL_BYTES;

/// Shell-like rendering of an argv, for logs and error messages.
pub fn render_command(argv: &[String]) -> String {
    argv.iter()
        .map(|a| {
            if a.is_empty() || a.contains(char::is_whitespace) {
                format!("{a:?}")
            } else {
                a.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Last `STDERR_TAIL_BYTES` of a byte stream, lossily decoded and trimmed.
pub fn tail(bytes: &[u8]) -> String {
    let start = bytes.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&bytes[start..]).trim().to_string()
}

/// Log both captured streams of a finished child at debug level.
pub fn log_output(label: &str, output: &Output) {
    if !output.stdout.is_empty() {
        tracing::debug!(process = label, stdout = %String::from_utf8_lossy(&output.stdout), "captured stdout");
    }
    if !output.stderr.is_empty() {
        tracing::debug!(process = label, stderr = %String::from_utf8_lossy(&output.stderr), "captured stderr");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_quotes_spaces_and_empty() {
        let argv = vec!["uv".to_string(), "run".to_string(), "a b".to_string(), String::new()];
        assert_eq!(render_command(&argv), "uv run \"a b\" \"\"");
    }

    #[test]
    fn tail_keeps_end() {
        let long = vec![b'x'; STDERR_TAIL_BYTES + 10];
        assert_eq!(tail(&long).len(), STDERR_TAIL_BYTES);
        assert_eq!(tail(b"  oops \n"), "oops");
    }
}
