//! Purpose: Fixed color table used by the table renderer.
//! Exports: `Palette`.
//! Role: Maps borders and key roles to escape sequences; passed by value, never global.
//! Invariants: `Palette::plain()` emits no escapes at all.
use crate::core::result::KeyRole;

const ANSI_RESET: &str = "\u{1b}[0m";
const ANSI_RED: &str = "\u{1b}[31m";
const ANSI_CYAN: &str = "\u{1b}[36m";
const ANSI_WHITE: &str = "\u{1b}[37m";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Palette {
    pub border: &'static str,
    pub reset: &'static str,
    pub partition_key: &'static str,
    pub clustering: &'static str,
}

impl Palette {
    pub fn ansi() -> Self {
        Self {
            border: ANSI_WHITE,
            reset: ANSI_RESET,
            partition_key: ANSI_RED,
            clustering: ANSI_CYAN,
        }
    }

    pub fn plain() -> Self {
        Self {
            border: "",
            reset: "",
            partition_key: "",
            clustering: "",
        }
    }

    pub fn for_role(&self, role: KeyRole) -> &'static str {
        match role {
            KeyRole::PartitionKey => self.partition_key,
            KeyRole::Clustering => self.clustering,
            KeyRole::Regular => "",
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::ansi()
    }
}
