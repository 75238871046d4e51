//! Upload session lifecycle
//!
//! `REGISTERED → UPLOADING → VERIFYING → {DEPLOYED | FAILED}`. Transition
//! legality lives in [`allowed_transitions`] and nowhere else.

use crate::error::TransitionError;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an upload session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeployStatus {
    /// No live or persisted session
    Unknown,
    /// Session allocated, no bytes yet
    Registered,
    /// Receiving chunks
    Uploading,
    /// Archive handed to the pipeline
    Verifying,
    /// Pipeline failed
    Failed,
    /// Pipeline succeeded
    Deployed,
}

impl DeployStatus {
    /// Numeric wire code
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Registered => 1,
            Self::Uploading => 2,
            Self::Verifying => 3,
            Self::Failed => 4,
            Self::Deployed => 5,
        }
    }

    /// Status for a wire code
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Registered),
            2 => Some(Self::Uploading),
            3 => Some(Self::Verifying),
            4 => Some(Self::Failed),
            5 => Some(Self::Deployed),
            _ => None,
        }
    }

    /// Default human-readable message
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Unknown => "Not found",
            Self::Registered => "Registered",
            Self::Uploading => "Uploading",
            Self::Verifying => "Verifying",
            Self::Failed => "Failed",
            Self::Deployed => "Deployed",
        }
    }

    /// No further transitions
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Deployed | Self::Failed)
    }

    /// A protocol error may still discard the session
    #[inline]
    #[must_use]
    pub fn is_discardable(self) -> bool {
        matches!(self, Self::Registered | Self::Uploading)
    }

    /// Every status, in code order
    pub const ALL: [Self; 6] = [
        Self::Unknown,
        Self::Registered,
        Self::Uploading,
        Self::Verifying,
        Self::Failed,
        Self::Deployed,
    ];
}

impl std::fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::Registered => "REGISTERED",
            Self::Uploading => "UPLOADING",
            Self::Verifying => "VERIFYING",
            Self::Failed => "FAILED",
            Self::Deployed => "DEPLOYED",
        };
        f.write_str(name)
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: DeployStatus) -> &'static [DeployStatus] {
    use DeployStatus::*;
    match from {
        Unknown => &[Registered],
        Registered => &[Uploading, Verifying],
        Uploading => &[Uploading, Verifying],
        Verifying => &[Deployed, Failed],
        Failed | Deployed => &[],
    }
}

/// Check a single status change
///
/// # Errors
/// Returns [`TransitionError`] when `to` is not reachable from `from`
pub fn validate_transition(from: DeployStatus, to: DeployStatus) -> Result<(), TransitionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn happy_path() {
        use DeployStatus::*;
        for (from, to) in [
            (Unknown, Registered),
            (Registered, Uploading),
            (Uploading, Uploading),
            (Uploading, Verifying),
            (Verifying, Deployed),
        ] {
            assert!(validate_transition(from, to).is_ok(), "{from} -> {to}");
        }
    }

    #[test]
    fn empty_archive_may_be_finalized() {
        assert!(validate_transition(DeployStatus::Registered, DeployStatus::Verifying).is_ok());
    }

    #[test]
    fn no_chunks_while_verifying() {
        let err = validate_transition(DeployStatus::Verifying, DeployStatus::Uploading).unwrap_err();
        assert_eq!(err.from, DeployStatus::Verifying);
        assert!(validate_transition(DeployStatus::Verifying, DeployStatus::Verifying).is_err());
    }

    #[test]
    fn codes_round_trip() {
        for status in DeployStatus::ALL {
            assert_eq!(DeployStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(DeployStatus::from_code(42), None);
    }

    #[test]
    fn serde_uses_upper_case() {
        assert_eq!(serde_json::to_string(&DeployStatus::Verifying).unwrap(), "\"VERIFYING\"");
    }

    fn any_status() -> impl Strategy<Value = DeployStatus> {
        prop_oneof![
            Just(DeployStatus::Unknown),
            Just(DeployStatus::Registered),
            Just(DeployStatus::Uploading),
            Just(DeployStatus::Verifying),
            Just(DeployStatus::Failed),
            Just(DeployStatus::Deployed),
        ]
    }

    proptest! {
        #[test]
        fn terminal_states_are_final(to in any_status()) {
            prop_assert!(validate_transition(DeployStatus::Deployed, to).is_err());
            prop_assert!(validate_transition(DeployStatus::Failed, to).is_err());
        }

        #[test]
        fn codes_never_decrease_except_by_failure(from in any_status(), to in any_status()) {
            if validate_transition(from, to).is_ok() {
                prop_assert!(to.code() >= from.code() || to == DeployStatus::Failed);
            }
        }

        #[test]
        fn only_early_states_are_discardable(status in any_status()) {
            let reaches_upload = validate_transition(status, DeployStatus::Uploading).is_ok();
            prop_assert_eq!(status.is_discardable(), reaches_upload);
        }
    }
}
