//! Versioned legal texts shown to the signer.
//!
//! Legal texts are fetched before a workflow starts, displayed by the UI, and their version
//! is recorded on the consent. Fetching is not part of the orchestration sequence; what to
//! do when it fails is up to the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vetrec_types::NonEmptyText;

use crate::error::{CoreError, CoreResult};
use crate::model::{ConsentKind, ConsentPayload};
use crate::session::SessionIdentity;

/// One versioned legal text for a consent kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalText {
    pub kind: ConsentKind,
    pub version: NonEmptyText,
    pub title: String,
    pub body: String,
}

/// The current legal text for each consent kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegalTextCatalogue {
    texts: BTreeMap<ConsentKind, LegalText>,
}

impl LegalTextCatalogue {
    /// Builds a catalogue, rejecting more than one text per consent kind.
    pub fn from_texts(texts: impl IntoIterator<Item = LegalText>) -> CoreResult<Self> {
        let mut catalogue = BTreeMap::new();
        for text in texts {
            let kind = text.kind;
            if catalogue.insert(kind, text).is_some() {
                return Err(CoreError::DuplicateLegalText(kind));
            }
        }
        Ok(Self { texts: catalogue })
    }

    pub fn get(&self, kind: ConsentKind) -> Option<&LegalText> {
        self.texts.get(&kind)
    }

    pub fn version_for(&self, kind: ConsentKind) -> Option<&str> {
        self.texts.get(&kind).map(|text| text.version.as_str())
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LegalText> {
        self.texts.values()
    }

    /// Starts a consent for `kind` pinned to the current legal text version.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingLegalText`] if the catalogue has no text for `kind`.
    pub fn draft_consent(
        &self,
        identity: &SessionIdentity,
        kind: ConsentKind,
    ) -> CoreResult<ConsentPayload> {
        let version = self
            .version_for(kind)
            .ok_or(CoreError::MissingLegalText(kind))?;
        Ok(ConsentPayload::prefilled(identity, kind, version))
    }
}
