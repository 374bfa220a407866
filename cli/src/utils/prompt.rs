//! Line-oriented prompts for the interactive flows.
//!
//! Every question returns `None` when the operator hits Ctrl-C or Ctrl-D,
//! which callers treat as "cancel this flow".

use anyhow::Result;
use colored::*;
use policy_client::models::{is_valid_key, Permission};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

pub struct Prompt {
    editor: DefaultEditor,
}

impl Prompt {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }

    pub fn ask(&mut self, label: &str) -> Option<String> {
        match self.editor.readline(&format!("{} ", label.cyan())) {
            Ok(line) => {
                let line = line.trim().to_string();
                if !line.is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        debug!("Could not record history entry: {}", e);
                    }
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
            Err(e) => {
                warn!("Failed to read input: {}", e);
                None
            }
        }
    }

    /// Ask with a default used on empty input.
    pub fn ask_or(&mut self, label: &str, default: &str) -> Option<String> {
        let answer = self.ask(&format!("{} [{}]:", label, default))?;
        if answer.is_empty() {
            Some(default.to_string())
        } else {
            Some(answer)
        }
    }

    /// Ask until the answer is non-empty.
    pub fn ask_required(&mut self, label: &str) -> Option<String> {
        loop {
            let answer = self.ask(label)?;
            if !answer.is_empty() {
                return Some(answer);
            }
            println!("{}", "A value is required".yellow());
        }
    }

    /// Ask until the answer is a valid key.
    pub fn ask_key(&mut self, label: &str) -> Option<String> {
        loop {
            let answer = self.ask(label)?;
            if is_valid_key(&answer) {
                return Some(answer);
            }
            println!(
                "{}",
                "Keys must start with a lowercase letter and contain only a-z, 0-9, '_' or '-'"
                    .yellow()
            );
        }
    }

    /// Comma separated list of keys; empty input yields an empty list.
    pub fn ask_keys(&mut self, label: &str) -> Option<Vec<String>> {
        loop {
            let answer = self.ask(label)?;
            let keys = split_list(&answer);
            match keys.iter().find(|k| !is_valid_key(k)) {
                Some(bad) => println!("{} '{}'", "Invalid key".yellow(), bad),
                None => return Some(keys),
            }
        }
    }

    /// Comma separated `resource:action` list; empty input yields an empty list.
    pub fn ask_permissions(&mut self, label: &str) -> Option<Vec<Permission>> {
        loop {
            let answer = self.ask(label)?;
            let parsed: Vec<Option<Permission>> =
                split_list(&answer).iter().map(|p| Permission::parse(p)).collect();
            if parsed.iter().all(Option::is_some) {
                return Some(parsed.into_iter().flatten().collect());
            }
            println!("{}", "Permissions must look like resource:action".yellow());
        }
    }

    pub fn confirm(&mut self, question: &str) -> bool {
        matches!(
            self.ask(&format!("{} [y/N]:", question))
                .map(|a| a.to_lowercase())
                .as_deref(),
            Some("y") | Some("yes")
        )
    }
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("read, create ,,update"), vec!["read", "create", "update"]);
        assert!(split_list("  ").is_empty());
    }
}
