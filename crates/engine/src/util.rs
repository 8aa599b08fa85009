//! Small parsing helpers shared by the engine's callers.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a group or expense id received from outside (URL path, CLI
/// argument) and return a labeled error on failure.
pub fn parse_id(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|_| EngineError::InvalidId(format!("invalid {label} id: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hyphenated_ids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&format!(" {id} "), "group").unwrap(), id);
    }

    #[test]
    fn labels_the_rejected_value() {
        assert_eq!(
            parse_id("nope", "expense").unwrap_err(),
            EngineError::InvalidId("invalid expense id: nope".to_string())
        );
    }
}
