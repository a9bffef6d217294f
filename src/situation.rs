/// Option value signaling that the matching custom free-text field
/// supplies the effective value.
pub const CUSTOM_SENTINEL: &str = "Other (Custom)";

pub const RELATIONSHIPS: &[&str] = &[
    "Client",
    "Customer",
    "Friend",
    "Family Member",
    "Roommate",
    "Colleague",
];

pub const CHANNELS: &[&str] = &["WhatsApp", "SMS", "Email", "Phone Call"];

pub const DELAY_REASONS: &[&str] = &[
    "Cash flow problems",
    "Forgot about it",
    "Disputing the amount",
    "Waiting on their own payment",
    "Avoiding contact",
    CUSTOM_SENTINEL,
];

pub const SOLUTIONS: &[&str] = &[
    "Pay in full now",
    "Installments",
    "Partial payment now, rest later",
    "New firm deadline",
    CUSTOM_SENTINEL,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Collect,
    Negotiate,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Collect => "Collect Payment",
            Mode::Negotiate => "Negotiate Delay",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Hinglish,
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Hinglish => "Hinglish",
            Language::English => "English",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hinglish" => Some(Language::Hinglish),
            "english" => Some(Language::English),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Language::Hinglish => Language::English,
            Language::English => Language::Hinglish,
        }
    }
}

/// The user-entered description of the overdue-payment scenario.
/// Lives for the whole session, mutated one field at a time.
#[derive(Debug, Clone)]
pub struct SituationDetails {
    pub mode: Mode,
    pub amount: String,
    pub overdue: String,
    pub relationship: String,
    pub channel: String,
    pub language: Language,
    pub customer_name: String,
    pub your_name: String,
    pub other_info: String,
    pub delay_reason: String,
    pub custom_reason: String,
    pub proposed_solution: String,
    pub custom_solution: String,
}

impl Default for SituationDetails {
    fn default() -> Self {
        Self {
            mode: Mode::Collect,
            amount: String::new(),
            overdue: String::new(),
            relationship: RELATIONSHIPS[0].to_string(),
            channel: CHANNELS[0].to_string(),
            language: Language::Hinglish,
            customer_name: String::new(),
            your_name: String::new(),
            other_info: String::new(),
            delay_reason: DELAY_REASONS[0].to_string(),
            custom_reason: String::new(),
            proposed_solution: SOLUTIONS[0].to_string(),
            custom_solution: String::new(),
        }
    }
}

impl SituationDetails {
    /// The delay reason that actually goes into the prompt: the custom
    /// free text when the sentinel is selected, the option otherwise.
    pub fn effective_delay_reason(&self) -> &str {
        if self.delay_reason == CUSTOM_SENTINEL {
            &self.custom_reason
        } else {
            &self.delay_reason
        }
    }

    pub fn effective_solution(&self) -> &str {
        if self.proposed_solution == CUSTOM_SENTINEL {
            &self.custom_solution
        } else {
            &self.proposed_solution
        }
    }
}

/// Step through a fixed option list, wrapping at both ends.
/// An unknown current value restarts at the first option.
pub fn cycle_option(options: &[&str], current: &str, forward: bool) -> String {
    let len = options.len();
    let idx = options.iter().position(|o| *o == current);
    let next = match idx {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    options[next].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_reason_uses_selected_option() {
        let details = SituationDetails::default();
        assert_eq!(details.effective_delay_reason(), "Cash flow problems");
    }

    #[test]
    fn test_effective_reason_uses_custom_text_for_sentinel() {
        let mut details = SituationDetails::default();
        details.delay_reason = CUSTOM_SENTINEL.to_string();
        details.custom_reason = "Flight delay".to_string();
        assert_eq!(details.effective_delay_reason(), "Flight delay");
    }

    #[test]
    fn test_effective_solution_uses_custom_text_for_sentinel() {
        let mut details = SituationDetails::default();
        details.proposed_solution = CUSTOM_SENTINEL.to_string();
        details.custom_solution = "Barter for services".to_string();
        assert_eq!(details.effective_solution(), "Barter for services");
    }

    #[test]
    fn test_cycle_option_wraps_forward() {
        let last = CHANNELS[CHANNELS.len() - 1];
        assert_eq!(cycle_option(CHANNELS, last, true), CHANNELS[0]);
    }

    #[test]
    fn test_cycle_option_wraps_backward() {
        assert_eq!(
            cycle_option(CHANNELS, CHANNELS[0], false),
            CHANNELS[CHANNELS.len() - 1]
        );
    }

    #[test]
    fn test_cycle_option_resets_on_unknown_value() {
        assert_eq!(cycle_option(CHANNELS, "Carrier Pigeon", true), CHANNELS[0]);
    }
}
