use crate::constants::{MAX_EXTENSION_LEN, MAX_FILENAME_LEN};
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SecurityError {
    #[error("Control characters in engine argument: {arg:?}")]
    ControlCharacters { arg: String },
    #[error("Suspicious virtual file name: {name}")]
    SuspiciousName { name: String },
    #[error("Too many arguments: {count} (max: {max})")]
    TooManyArguments { count: usize, max: usize },
    #[error("Target extension is empty")]
    EmptyExtension,
    #[error("Invalid target extension: {extension}")]
    InvalidExtension { extension: String },
}

// No shell sits between us and the engine, so only workspace escapes and
// control characters are rejected.
#[derive(Debug)]
pub struct SecurityValidator {
    control_pattern: Regex,
    extension_pattern: Regex,
    max_args: usize,
}

impl SecurityValidator {
    pub fn new() -> Self {
        Self {
            control_pattern: Regex::new(r"[\r\n\x00]").expect("valid regex"),
            extension_pattern: Regex::new(&format!(r"^[A-Za-z0-9]{{1,{}}}$", MAX_EXTENSION_LEN))
                .expect("valid regex"),
            max_args: 32,
        }
    }

    /// Trims whitespace and a single leading dot, then checks the extension
    /// is plain alphanumeric text.
    pub fn normalize_extension(&self, raw: &str) -> Result<String, SecurityError> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix('.').unwrap_or(trimmed);

        if trimmed.is_empty() {
            return Err(SecurityError::EmptyExtension);
        }

        if !self.extension_pattern.is_match(trimmed) {
            return Err(SecurityError::InvalidExtension {
                extension: raw.to_string(),
            });
        }

        Ok(trimmed.to_string())
    }

    /// Virtual names live flat inside the engine workspace.
    pub fn validate_virtual_name(&self, name: &str) -> Result<(), SecurityError> {
        let suspicious = name.is_empty()
            || name.len() > MAX_FILENAME_LEN
            || name.starts_with('-')
            || name.contains('/')
            || name.contains('\\')
            || name == "."
            || name == ".."
            || self.control_pattern.is_match(name);

        if suspicious {
            return Err(SecurityError::SuspiciousName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_engine_args(&self, args: &[String]) -> Result<(), SecurityError> {
        if args.len() > self.max_args {
            return Err(SecurityError::TooManyArguments {
                count: args.len(),
                max: self.max_args,
            });
        }

        if let Some(arg) = args.iter().find(|a| self.control_pattern.is_match(a)) {
            return Err(SecurityError::ControlCharacters { arg: arg.clone() });
        }

        Ok(())
    }
}

impl Default for SecurityValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Makes `filename` safe to create in any directory. A single leading dot
/// survives so hidden base names stay hidden.
pub fn sanitize_filename(filename: &str) -> String {
    let replaced: String = filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim();
    let hidden = trimmed.starts_with('.');
    let core = trimmed.trim_matches('.');

    let mut sanitized = if core.is_empty() {
        "unnamed".to_string()
    } else if hidden {
        format!(".{}", core)
    } else {
        core.to_string()
    };

    if sanitized.len() > MAX_FILENAME_LEN {
        let mut cut = MAX_FILENAME_LEN;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
    }

    sanitized
}
