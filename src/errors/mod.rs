use thiserror::Error;

/// Errors that drive control flow in the ingestion pipeline.
///
/// `Parse` and `ReferentialIntegrity` abort processing of the affected
/// event only; sibling events in the same batch continue. `IdentityConflict`
/// pauses merge automation for the affected player pair. `Validation`
/// rejects the offending record or batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("parse error in event {event}: {reason}")]
    Parse { event: String, reason: String },

    #[error("referential integrity error in event {event}: {reason}")]
    ReferentialIntegrity { event: String, reason: String },

    #[error("identity conflict for {name}: {reason}")]
    IdentityConflict { name: String, reason: String },

    #[error("validation failed: {reason}")]
    Validation { reason: String },
}

impl PipelineError {
    pub fn parse(event: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            event: event.into(),
            reason: reason.into(),
        }
    }

    pub fn integrity(event: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ReferentialIntegrity {
            event: event.into(),
            reason: reason.into(),
        }
    }

    pub fn conflict(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IdentityConflict {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_record() {
        assert_eq!(
            PipelineError::conflict("김철수", "gender flip").to_string(),
            "identity conflict for 김철수: gender flip"
        );
        assert_eq!(
            PipelineError::validation("no final ranking").to_string(),
            "validation failed: no final ranking"
        );
        assert_eq!(
            PipelineError::parse("KFC2025/WE-SR", "ragged pool grid").to_string(),
            "parse error in event KFC2025/WE-SR: ragged pool grid"
        );
    }
}
