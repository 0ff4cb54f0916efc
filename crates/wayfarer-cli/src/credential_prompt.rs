//! Interactive API key prompt.
//!
//! Shown when a request needs a credential and none is stored. An empty
//! answer or end of input cancels the waiting request.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use wayfarer_core::i18n::Translate;

/// Asks the user for an API key.
pub trait CredentialPrompt {
    /// `Ok(None)` when the user declined.
    fn ask(&mut self, tr: &dyn Translate) -> Result<Option<String>>;
}

/// Reads the answer from `input` and writes the prompt text to `output`.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompt<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompt on stderr so stdout stays clean for `--json` output.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> CredentialPrompt for LinePrompt<R, W> {
    fn ask(&mut self, tr: &dyn Translate) -> Result<Option<String>> {
        writeln!(self.output, "{}", tr.t("apiKeyModalTitle"))?;
        writeln!(self.output, "{}", tr.t("apiKeyModalDescription"))?;
        writeln!(self.output, "{}", tr.t("apiKeyModalGetYourKey"))?;
        write!(self.output, "{}: ", tr.t("apiKeyModalInputLabel"))?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read API key")?;
        if read == 0 {
            writeln!(self.output)?;
        }

        let answer = line.trim();
        if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(answer.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use wayfarer_core::i18n::Catalog;
    use wayfarer_store::models::Locale;

    fn ask(input: &str) -> (Option<String>, String) {
        let catalog = Catalog::builtin(Locale::En);
        let mut output = Vec::new();
        let answer = LinePrompt::new(Cursor::new(input.as_bytes()), &mut output)
            .ask(&catalog)
            .unwrap();
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn answer_is_trimmed() {
        let (answer, shown) = ask("  AIza-test-key \n");
        assert_eq!(answer.as_deref(), Some("AIza-test-key"));
        assert!(shown.contains("Enter your Gemini API key"));
        assert!(shown.contains("aistudio.google.com"));
    }

    #[test]
    fn blank_answer_declines() {
        assert_eq!(ask("   \n").0, None);
    }

    #[test]
    fn end_of_input_declines() {
        assert_eq!(ask("").0, None);
    }
}
