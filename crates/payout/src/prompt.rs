//! Interactive prompting
//!
//! All operator input goes through [`Prompter`] so the payout workflow can be
//! driven from a terminal or from a script.

use rustyline::{error::ReadlineError, DefaultEditor};
use tracing::debug;

use crate::{
    error::{PayoutError, PayoutResult},
    output::OutputHandler,
};

pub trait Prompter {
    /// Read one line of visible input
    fn read_line(&mut self, prompt: &str) -> PayoutResult<String>;

    /// Read one line without echoing it
    fn read_secret(&mut self, prompt: &str) -> PayoutResult<String>;
}

/// Prompter backed by the controlling terminal
pub struct TerminalPrompter {
    editor: DefaultEditor,
}

impl TerminalPrompter {
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> PayoutResult<String> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(line.trim().to_string()),
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                Err(PayoutError::InputClosed)
            }
            Err(e) => {
                debug!("Terminal read failed: {}", e);
                Err(PayoutError::InputClosed)
            }
        }
    }

    fn read_secret(&mut self, prompt: &str) -> PayoutResult<String> {
        rpassword::prompt_password(prompt).map_err(|e| {
            debug!("Passphrase read failed: {}", e);
            PayoutError::InputClosed
        })
    }
}

/// Use `provided` if given, otherwise ask for it
pub fn value_or_prompt(
    prompter: &mut dyn Prompter,
    provided: Option<String>,
    prompt: &str,
    secret: bool,
) -> PayoutResult<(String, bool)> {
    match provided {
        Some(value) => Ok((value, false)),
        None if secret => Ok((prompter.read_secret(prompt)?, true)),
        None => Ok((prompter.read_line(prompt)?, true)),
    }
}

/// Show a keyed menu and return the chosen value. Empty input picks
/// `default`; anything unknown prints an error and asks again.
pub fn prompt_menu<T: Clone>(
    prompter: &mut dyn Prompter,
    output: &OutputHandler,
    message: &str,
    options: &[(String, String, T)],
    default: &str,
) -> PayoutResult<T> {
    loop {
        output.print_blank();
        output.print_indent(message);
        for (key, label, _) in options {
            output.print_indent(&format!("{}. {}", key, label));
        }
        output.print_blank();

        let answer = prompter.read_line(&format!("{}Choice [{}] ", output.indent(), default))?;
        let key = if answer.is_empty() { default } else { answer.as_str() };

        if let Some((_, _, value)) = options.iter().find(|(k, _, _)| k == key) {
            return Ok(value.clone());
        }
        output.print_error("Invalid Choice, please try again");
    }
}

/// Yes/No question defaulting to yes
pub fn confirm(prompter: &mut dyn Prompter, output: &OutputHandler, message: &str) -> PayoutResult<bool> {
    let options = [
        ("y".to_string(), "Yes".to_string(), true),
        ("n".to_string(), "No".to_string(), false),
    ];
    let answer = prompt_menu(prompter, output, message, &options, "y")?;
    output.print_blank();
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedPrompter;

    fn output() -> OutputHandler {
        OutputHandler::new("TestPool")
    }

    #[test]
    fn test_menu_default_on_empty_input() {
        let mut prompter = ScriptedPrompter::new([""]);
        let options = [
            ("1".to_string(), "One".to_string(), 1),
            ("2".to_string(), "Two".to_string(), 2),
        ];
        let choice = prompt_menu(&mut prompter, &output(), "Pick", &options, "2").unwrap();
        assert_eq!(choice, 2);
    }

    #[test]
    fn test_menu_reprompts_on_invalid_choice() {
        let mut prompter = ScriptedPrompter::new(["7", "x", "1"]);
        let options = [
            ("1".to_string(), "One".to_string(), 1),
            ("2".to_string(), "Two".to_string(), 2),
        ];
        let choice = prompt_menu(&mut prompter, &output(), "Pick", &options, "2").unwrap();
        assert_eq!(choice, 1);
        assert_eq!(prompter.asked().len(), 3);
    }

    #[test]
    fn test_menu_gives_up_when_input_closes() {
        let mut prompter = ScriptedPrompter::new(["9"]);
        let options = [("1".to_string(), "One".to_string(), 1)];
        let err = prompt_menu(&mut prompter, &output(), "Pick", &options, "1").unwrap_err();
        assert!(matches!(err, PayoutError::InputClosed));
    }

    #[test]
    fn test_confirm() {
        let mut prompter = ScriptedPrompter::new(["n", ""]);
        assert!(!confirm(&mut prompter, &output(), "Process it?").unwrap());
        assert!(confirm(&mut prompter, &output(), "Process it?").unwrap());
    }

    #[test]
    fn test_value_or_prompt() {
        let mut prompter = ScriptedPrompter::new(["typed"]);
        let (value, prompted) =
            value_or_prompt(&mut prompter, Some("given".into()), "User: ", false).unwrap();
        assert_eq!((value.as_str(), prompted), ("given", false));

        let (value, prompted) = value_or_prompt(&mut prompter, None, "Pass: ", true).unwrap();
        assert_eq!((value.as_str(), prompted), ("typed", true));
    }
}
