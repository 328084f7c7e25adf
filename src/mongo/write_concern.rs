use std::fmt;
use std::str::FromStr;

use mongodb::options::{Acknowledgment, WriteConcern};

use crate::global::model::ParseEnumError;

/// Named write concern levels accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteConcernLevel {
    Acknowledged,
    Unacknowledged,
    W1,
    W2,
    W3,
    Journaled,
    Fsynced,
    Majority,
    ReplicaAcknowledged,
}

const EXPECTED: &[&str] = &[
    "ACKNOWLEDGED",
    "SAFE",
    "UNACKNOWLEDGED",
    "NORMAL",
    "W1",
    "W2",
    "W3",
    "JOURNALED",
    "JOURNAL_SAFE",
    "FSYNCED",
    "FSYNC_SAFE",
    "MAJORITY",
    "REPLICA_ACKNOWLEDGED",
    "REPLICAS_SAFE",
];

impl WriteConcernLevel {
    pub const ALL: [WriteConcernLevel; 9] = [
        WriteConcernLevel::Acknowledged,
        WriteConcernLevel::Unacknowledged,
        WriteConcernLevel::W1,
        WriteConcernLevel::W2,
        WriteConcernLevel::W3,
        WriteConcernLevel::Journaled,
        WriteConcernLevel::Fsynced,
        WriteConcernLevel::Majority,
        WriteConcernLevel::ReplicaAcknowledged,
    ];

    /// Every identifier (including legacy aliases) that parses successfully.
    pub fn identifiers() -> &'static [&'static str] {
        EXPECTED
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WriteConcernLevel::Acknowledged => "ACKNOWLEDGED",
            WriteConcernLevel::Unacknowledged => "UNACKNOWLEDGED",
            WriteConcernLevel::W1 => "W1",
            WriteConcernLevel::W2 => "W2",
            WriteConcernLevel::W3 => "W3",
            WriteConcernLevel::Journaled => "JOURNALED",
            WriteConcernLevel::Fsynced => "FSYNCED",
            WriteConcernLevel::Majority => "MAJORITY",
            WriteConcernLevel::ReplicaAcknowledged => "REPLICA_ACKNOWLEDGED",
        }
    }

    /// Driver write concern for this level.
    ///
    /// The driver has no fsync flag, so `FSYNCED` asks for a journal
    /// acknowledgment, which is what servers with journaling do for fsync.
    pub fn to_write_concern(&self) -> WriteConcern {
        let mut write_concern = WriteConcern::default();
        match self {
            WriteConcernLevel::Acknowledged | WriteConcernLevel::W1 => {
                write_concern.w = Some(Acknowledgment::Nodes(1));
            }
            WriteConcernLevel::Unacknowledged => {
                write_concern.w = Some(Acknowledgment::Nodes(0));
            }
            WriteConcernLevel::W2 | WriteConcernLevel::ReplicaAcknowledged => {
                write_concern.w = Some(Acknowledgment::Nodes(2));
            }
            WriteConcernLevel::W3 => {
                write_concern.w = Some(Acknowledgment::Nodes(3));
            }
            WriteConcernLevel::Journaled | WriteConcernLevel::Fsynced => {
                write_concern.w = Some(Acknowledgment::Nodes(1));
                write_concern.journal = Some(true);
            }
            WriteConcernLevel::Majority => {
                write_concern.w = Some(Acknowledgment::Majority);
            }
        }
        write_concern
    }
}

impl FromStr for WriteConcernLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_ascii_uppercase().as_str() {
            "ACKNOWLEDGED" | "SAFE" => WriteConcernLevel::Acknowledged,
            "UNACKNOWLEDGED" | "NORMAL" => WriteConcernLevel::Unacknowledged,
            "W1" => WriteConcernLevel::W1,
            "W2" => WriteConcernLevel::W2,
            "W3" => WriteConcernLevel::W3,
            "JOURNALED" | "JOURNAL_SAFE" => WriteConcernLevel::Journaled,
            "FSYNCED" | "FSYNC_SAFE" => WriteConcernLevel::Fsynced,
            "MAJORITY" => WriteConcernLevel::Majority,
            "REPLICA_ACKNOWLEDGED" | "REPLICAS_SAFE" => WriteConcernLevel::ReplicaAcknowledged,
            _ => {
                return Err(ParseEnumError {
                    enum_name: "WriteConcern",
                    value: s.to_string(),
                    expected: EXPECTED,
                });
            }
        };
        Ok(level)
    }
}

impl fmt::Display for WriteConcernLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_identifier_parses() {
        for identifier in WriteConcernLevel::identifiers() {
            assert!(
                identifier.parse::<WriteConcernLevel>().is_ok(),
                "{identifier} should parse"
            );
        }
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for level in WriteConcernLevel::ALL {
            assert_eq!(level.as_str().parse::<WriteConcernLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("majority".parse::<WriteConcernLevel>().unwrap(), WriteConcernLevel::Majority);
        assert_eq!(" Journal_Safe ".parse::<WriteConcernLevel>().unwrap(), WriteConcernLevel::Journaled);
    }

    #[test]
    fn test_unknown_identifier_is_rejected() {
        let err = "BOGUS".parse::<WriteConcernLevel>().unwrap_err();
        assert_eq!(err.enum_name, "WriteConcern");
        assert_eq!(err.value, "BOGUS");
        assert!(err.to_string().contains("MAJORITY"));

        assert!("".parse::<WriteConcernLevel>().is_err());
    }

    #[test]
    fn test_driver_mapping() {
        let majority = WriteConcernLevel::Majority.to_write_concern();
        assert_eq!(majority.w, Some(Acknowledgment::Majority));
        assert_eq!(majority.journal, None);

        let unacknowledged = WriteConcernLevel::Unacknowledged.to_write_concern();
        assert_eq!(unacknowledged.w, Some(Acknowledgment::Nodes(0)));

        let journaled = WriteConcernLevel::Journaled.to_write_concern();
        assert_eq!(journaled.w, Some(Acknowledgment::Nodes(1)));
        assert_eq!(journaled.journal, Some(true));

        let replicas = WriteConcernLevel::ReplicaAcknowledged.to_write_concern();
        assert_eq!(replicas.w, Some(Acknowledgment::Nodes(2)));

        assert_eq!(WriteConcernLevel::W3.to_write_concern().w, Some(Acknowledgment::Nodes(3)));
    }
}
