//! Keyboard shortcut that toggles the voice session

use crate::VoiceError;
use std::fmt;
use std::str::FromStr;

/// Modifier state of a key press
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

/// A key press as reported by the host UI
///
/// `code` uses physical key names (`Space`, `KeyV`, `F2`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub code: String,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(code: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            code: code.into(),
            modifiers,
        }
    }

    /// Convenience for `Ctrl+<code>`
    pub fn ctrl(code: impl Into<String>) -> Self {
        Self::new(
            code,
            Modifiers {
                ctrl: true,
                ..Default::default()
            },
        )
    }
}

/// Parsed shortcut such as `Ctrl+Space`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shortcut {
    pub modifiers: Modifiers,
    pub code: String,
}

impl Shortcut {
    /// Modifiers must match exactly, so `Ctrl+Space` does not fire on
    /// `Ctrl+Shift+Space` the way a bare ctrl check would. Key codes
    /// compare case-insensitively.
    pub fn matches(&self, key: &KeyPress) -> bool {
        self.modifiers == key.modifiers && self.code.eq_ignore_ascii_case(&key.code)
    }
}

impl Default for Shortcut {
    fn default() -> Self {
        Self {
            modifiers: Modifiers {
                ctrl: true,
                ..Default::default()
            },
            code: "Space".to_string(),
        }
    }
}

impl FromStr for Shortcut {
    type Err = VoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let (code, mods) = match parts.split_last() {
            Some((code, mods)) if !code.is_empty() => (*code, mods),
            _ => {
                return Err(VoiceError::Config(format!(
                    "shortcut {:?} has no key",
                    s
                )))
            }
        };

        let mut modifiers = Modifiers::default();
        for m in mods {
            match m.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "super" => modifiers.meta = true,
                other => {
                    return Err(VoiceError::Config(format!(
                        "unknown modifier {:?} in shortcut {:?}",
                        other, s
                    )))
                }
            }
        }

        Ok(Self {
            modifiers,
            code: code.to_string(),
        })
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.modifiers.alt {
            write!(f, "Alt+")?;
        }
        if self.modifiers.shift {
            write!(f, "Shift+")?;
        }
        if self.modifiers.meta {
            write!(f, "Meta+")?;
        }
        write!(f, "{}", self.code)
    }
}
