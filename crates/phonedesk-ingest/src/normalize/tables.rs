//! Static lookup tables from form labels to service-desk choice ids
//!
//! Labels match after trimming, ignoring ASCII case. Only choices whose ids
//! are confirmed against the live form are listed; anything else maps to the
//! unknown installation code or is dropped.

/// Installation type recorded when the label has no mapping
pub const UNKNOWN_INSTALLATION_CODE: &str = "unknown";

/// "Telephone lines and installations" (form question 157)
pub const INSTALLATION_TYPES: &[(&str, &str)] = &[
    ("New extension including new cabling and socket", "160"),
];

/// "Handsets and headsets" (form question 159)
pub const EQUIPMENT: &[(&str, &str)] = &[
    ("Handset speaker phone", "164"),
    ("Cordless headset", "165"),
];

/// Usage duration classes (form question 205)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageDuration {
    /// Three months or less; requires an ending date
    Temporary,
    Permanent,
}

impl UsageDuration {
    pub fn code(self) -> &'static str {
        match self {
            UsageDuration::Temporary => "183",
            // TODO: confirm the permanent choice id against the live form
            UsageDuration::Permanent => "184",
        }
    }
}

pub const USAGE_DURATIONS: &[(&str, UsageDuration)] = &[
    ("Temporary", UsageDuration::Temporary),
    ("Temporary use (three months or less)", UsageDuration::Temporary),
    ("Permanent", UsageDuration::Permanent),
    ("Permanent use", UsageDuration::Permanent),
];

/// Find the value for `label` in a lookup table
pub fn lookup<T: Copy>(table: &[(&str, T)], label: &str) -> Option<T> {
    let label = label.trim();
    table
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(label))
        .map(|(_, value)| *value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmed_choice_ids() {
        assert_eq!(
            lookup(INSTALLATION_TYPES, "New extension including new cabling and socket"),
            Some("160")
        );
        assert_eq!(lookup(EQUIPMENT, "Handset speaker phone"), Some("164"));
        assert_eq!(lookup(EQUIPMENT, " cordless HEADSET "), Some("165"));
        assert_eq!(UsageDuration::Temporary.code(), "183");
    }

    #[test]
    fn test_unlisted_labels_do_not_map() {
        assert_eq!(lookup(INSTALLATION_TYPES, "Remove extension"), None);
        assert_eq!(lookup(EQUIPMENT, "Conference phone"), None);
    }
}
