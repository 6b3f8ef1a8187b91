use std::fmt;

/// Clipboard write failure; export falls back to a manual copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardError(pub String);

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clipboard unavailable: {}", self.0)
    }
}

impl std::error::Error for ClipboardError {}

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// How an export reached the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Copied,
    /// The host should show this text for the user to copy by hand.
    ManualCopy(String),
}

pub fn export_to_clipboard(clipboard: &mut dyn Clipboard, json: String) -> ExportOutcome {
    match clipboard.write_text(&json) {
        Ok(()) => {
            log::info!("map copied to clipboard ({} bytes)", json.len());
            ExportOutcome::Copied
        }
        Err(e) => {
            log::warn!("{}, falling back to manual copy", e);
            ExportOutcome::ManualCopy(json)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records writes, or refuses them all.
    #[derive(Default)]
    pub(crate) struct FakeClipboard {
        pub broken: bool,
        pub text: Option<String>,
    }

    impl Clipboard for FakeClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.broken {
                return Err(ClipboardError("permission denied".into()));
            }
            self.text = Some(text.to_owned());
            Ok(())
        }
    }

    #[test]
    fn copies_when_available() {
        let mut cb = FakeClipboard::default();
        assert_eq!(export_to_clipboard(&mut cb, "{}".into()), ExportOutcome::Copied);
        assert_eq!(cb.text.as_deref(), Some("{}"));
    }

    #[test]
    fn falls_back_to_manual_copy() {
        let mut cb = FakeClipboard {
            broken: true,
            ..Default::default()
        };
        assert_eq!(
            export_to_clipboard(&mut cb, "{\"a\":1}".into()),
            ExportOutcome::ManualCopy("{\"a\":1}".into())
        );
    }
}
