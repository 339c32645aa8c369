use base64::{prelude::BASE64_STANDARD, Engine};
use serde::Serialize;

use crate::types::Decision;

const API_VERSION: &str = "admission.k8s.io/v1";
const PATCH_TYPE: &str = "JSONPatch";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionStatus {
    pub message: String,
}

/// The `response` of an `AdmissionReview`, built from a [`Decision`].
///
/// Requests are always allowed. Non-matches and errors carry a status
/// message; patches are base64-encoded JSON Patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionOutcome {
    pub uid: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<String>,
}

/// Envelope returned to the API server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub response: AdmissionOutcome,
}

impl AdmissionOutcome {
    #[must_use]
    pub fn from_decision(uid: &str, decision: &Decision) -> Self {
        let mut outcome = Self {
            uid: uid.to_owned(),
            allowed: true,
            status: None,
            patch: None,
            patch_type: None,
        };
        match decision {
            Decision::NoMatch => outcome.status = Some(status("no selector match")),
            Decision::MatchNoChange => {}
            Decision::MatchWithPatch(patch) => {
                outcome.patch = Some(BASE64_STANDARD.encode(patch.to_json()));
                outcome.patch_type = Some(PATCH_TYPE.to_owned());
            }
            Decision::Error(err) => outcome.status = Some(status(&err.to_string())),
        }
        outcome
    }

    /// The decoded patch, if this outcome carries one.
    #[must_use]
    pub fn decoded_patch(&self) -> Option<Vec<u8>> {
        self.patch
            .as_deref()
            .and_then(|p| BASE64_STANDARD.decode(p).ok())
    }

    #[must_use]
    pub fn into_review(self) -> AdmissionReview {
        AdmissionReview {
            api_version: API_VERSION,
            kind: "AdmissionReview",
            response: self,
        }
    }
}

fn status(message: &str) -> AdmissionStatus {
    AdmissionStatus {
        message: message.to_owned(),
    }
}
