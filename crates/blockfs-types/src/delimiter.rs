use serde::{Deserialize, Serialize};

/// Chunk boundary policy for the block splitter.
///
/// Chosen once per put operation and constant for its duration. The set of
/// policies is closed: new policies require a new variant here, not a plugin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delimiter {
    /// Cut on newline boundaries.
    #[default]
    Line,
    /// Cut on well-formed JSON value boundaries, one decoded value per unit.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_line() {
        assert_eq!(Delimiter::default(), Delimiter::Line);
    }

    #[test]
    fn serde_roundtrip() {
        for delimiter in [Delimiter::Line, Delimiter::Json] {
            let json = serde_json::to_string(&delimiter).unwrap();
            let parsed: Delimiter = serde_json::from_str(&json).unwrap();
            assert_eq!(delimiter, parsed);
        }
    }
}
