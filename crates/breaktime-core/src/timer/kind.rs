use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// The four reminder cadences.
///
/// Priority is compiled in: a lower rank is shown first and may preempt
/// a popup with a higher rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BigBreak,
    SmallBreak,
    EyeExercise,
    WaterReminder,
}

impl EventKind {
    /// All kinds, in priority order.
    pub const ALL: [EventKind; 4] = [
        EventKind::BigBreak,
        EventKind::SmallBreak,
        EventKind::EyeExercise,
        EventKind::WaterReminder,
    ];

    /// Priority rank (1 = highest).
    pub fn priority(self) -> u8 {
        match self {
            EventKind::BigBreak => 1,
            EventKind::SmallBreak => 2,
            EventKind::EyeExercise => 3,
            EventKind::WaterReminder => 4,
        }
    }

    /// Whether `self` should interrupt a visible `other`.
    pub fn outranks(self, other: EventKind) -> bool {
        self.priority() < other.priority()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::BigBreak => "big_break",
            EventKind::SmallBreak => "small_break",
            EventKind::EyeExercise => "eye_exercise",
            EventKind::WaterReminder => "water_reminder",
        }
    }

    pub(crate) fn index(self) -> usize {
        self.priority() as usize - 1
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_follow_declaration_order() {
        let ranks: Vec<u8> = EventKind::ALL.iter().map(|k| k.priority()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn big_break_outranks_everything_else() {
        assert!(EventKind::BigBreak.outranks(EventKind::SmallBreak));
        assert!(EventKind::BigBreak.outranks(EventKind::WaterReminder));
        assert!(!EventKind::WaterReminder.outranks(EventKind::EyeExercise));
        assert!(!EventKind::SmallBreak.outranks(EventKind::SmallBreak));
    }

    #[test]
    fn parses_snake_and_kebab_case() {
        assert_eq!("big_break".parse::<EventKind>().unwrap(), EventKind::BigBreak);
        assert_eq!("Water-Reminder".parse::<EventKind>().unwrap(), EventKind::WaterReminder);
        assert!("lunch".parse::<EventKind>().is_err());
    }

    #[test]
    fn index_is_dense() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
