//! Declarative DOCX assembly.
//!
//! A [`spec::DocumentSpec`] is walked block by block and translated into
//! `docx-rs` builder calls. Cosmetic problems (unknown style, bad colour,
//! unreachable image) never abort the build: they are collected as
//! [`Warning`]s and returned next to the finished document. Only
//! [`AssemblyError`]s abort.

use std::fmt;

use serde::Serialize;

pub mod assembler;
pub mod format;
pub mod images;
pub mod layout;
pub mod metadata;
pub mod spec;
pub mod styles;

pub use assembler::{Assembly, assemble};
pub use spec::DocumentSpec;

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("level must be in range 0-9, got {0}")]
    HeadingLevel(i64),
    #[error("failed to serialize document: {0}")]
    Serialize(String),
}

/// A soft failure: the offending option was skipped and the build went on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub location: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

#[derive(Debug, Default)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn push(&mut self, location: &str, message: impl Into<String>) {
        let warning = Warning {
            location: location.to_string(),
            message: message.into(),
        };
        log::warn!("{warning}");
        self.0.push(warning);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.0
    }
}
