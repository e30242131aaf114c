//! # Watermark: `__pf_wm` Provenance Stamp
//!
//! Every JSON artifact in a bundle carries a top-level `__pf_wm` object tying
//! it to the license pack and the modules actually used to produce it.
//! Markdown artifacts carry a textual badge containing [`MARKDOWN_BADGE`].
//!
//! The verifier never corrects a watermark. A pack mismatch or a module
//! outside the license set is reported as a failure.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PfError;
use crate::identity::{ModuleId, PackId};

/// JSON key under which the watermark is embedded.
pub const WATERMARK_KEY: &str = "__pf_wm";

/// Branding marker every markdown artifact must contain.
pub const MARKDOWN_BADGE: &str = "Verified by PromptForge";

/// Provenance metadata embedded in an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    /// Pack the artifact was produced under.
    pub pack: PackId,
    /// Modules used to produce the artifact.
    pub modules: Vec<ModuleId>,
}

impl Watermark {
    /// Create a watermark.
    pub fn new(pack: PackId, modules: Vec<ModuleId>) -> Self {
        Self { pack, modules }
    }

    /// Embed this watermark at the top level of a JSON object, replacing any
    /// existing one.
    pub fn stamp(&self, document: &mut Value) -> Result<(), PfError> {
        let obj = document.as_object_mut().ok_or_else(|| {
            PfError::Validation("watermark target must be a JSON object".to_string())
        })?;
        obj.insert(WATERMARK_KEY.to_string(), serde_json::to_value(self)?);
        Ok(())
    }

    /// Read the watermark of a JSON document.
    ///
    /// Returns `Ok(None)` when the key is absent and an error when it is
    /// present but malformed.
    pub fn extract(document: &Value) -> Result<Option<Self>, PfError> {
        match document.get(WATERMARK_KEY) {
            None => Ok(None),
            Some(raw) => serde_json::from_value(raw.clone())
                .map(Some)
                .map_err(|e| PfError::Validation(format!("malformed {WATERMARK_KEY}: {e}"))),
        }
    }

    /// Modules listed in this watermark that are not in `allowed`, in
    /// watermark order, without duplicates.
    pub fn unauthorized_modules(&self, allowed: &BTreeSet<ModuleId>) -> Vec<ModuleId> {
        let mut seen = BTreeSet::new();
        self.modules
            .iter()
            .filter(|m| !allowed.contains(*m) && seen.insert((*m).clone()))
            .cloned()
            .collect()
    }

    /// Markdown badge line stamped into markdown artifacts.
    pub fn markdown_badge(&self) -> String {
        let modules: Vec<&str> = self.modules.iter().map(ModuleId::as_str).collect();
        format!(
            "> {MARKDOWN_BADGE} · pack `{}` · modules {}",
            self.pack,
            modules.join(", ")
        )
    }
}
