//! Box references.
//!
//! A box is a named piece of storage owned by an application. Callers name
//! boxes by application id; the wire form names them by position in the
//! transaction's foreign-apps array instead, with `0` meaning "the app being
//! called". Translation happens when a transaction is built (so an
//! unresolvable reference never produces a transaction) and is reversed on
//! decode.

use crate::error::{Error, Result};

/// A reference to box `name` of application `app_index` (`0` = self).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BoxReference {
    pub app_index: u64,
    pub name: Vec<u8>,
}

impl BoxReference {
    pub fn new(app_index: u64, name: impl Into<Vec<u8>>) -> Self {
        Self {
            app_index,
            name: name.into(),
        }
    }
}

/// The wire form of a [`BoxReference`]: `{i: foreign index, n: name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBoxReference {
    pub index: u64,
    pub name: Vec<u8>,
}

fn translate(
    reference: &BoxReference,
    foreign_apps: &[u64],
    app_index: u64,
) -> Result<EncodedBoxReference> {
    // Foreign apps are numbered from 1; 0 is the called app itself.
    let index = match foreign_apps.iter().position(|id| *id == reference.app_index) {
        Some(pos) => pos as u64 + 1,
        None if reference.app_index == 0 || reference.app_index == app_index => 0,
        None => {
            return Err(Error::Reference(format!(
                "box reference to app {} is not in the foreign apps array",
                reference.app_index
            )))
        }
    };
    Ok(EncodedBoxReference {
        index,
        name: reference.name.clone(),
    })
}

/// Translate app-id box references into foreign-index references.
pub fn translate_box_references(
    references: &[BoxReference],
    foreign_apps: &[u64],
    app_index: u64,
) -> Result<Vec<EncodedBoxReference>> {
    references
        .iter()
        .map(|r| translate(r, foreign_apps, app_index))
        .collect()
}

/// Reverse [`translate_box_references`]. Index `0` resolves to app id `0`
/// (the called app), which is how a decoded reference to "self" reads back.
pub fn resolve_box_references(
    encoded: &[EncodedBoxReference],
    foreign_apps: &[u64],
) -> Result<Vec<BoxReference>> {
    encoded
        .iter()
        .map(|e| {
            let app_index = match e.index {
                0 => 0,
                i => *foreign_apps.get(i as usize - 1).ok_or_else(|| {
                    Error::Reference(format!(
                        "box reference index {} exceeds {} foreign apps",
                        i,
                        foreign_apps.len()
                    ))
                })?,
            };
            Ok(BoxReference {
                app_index,
                name: e.name.clone(),
            })
        })
        .collect()
}
