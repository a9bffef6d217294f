use ratatui::widgets::ListState;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::gemini::GeminiClient;
use crate::reminders::ReminderSet;
use crate::situation::{
    cycle_option, Language, Mode, SituationDetails, CHANNELS, CUSTOM_SENTINEL, DELAY_REASONS,
    RELATIONSHIPS, SOLUTIONS,
};

/// How long the "copied" badge stays up after a copy.
pub const COPY_ACK_WINDOW: Duration = Duration::from_secs(2);

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Form,
    Results,
}

/// One row of the situation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Amount,
    Overdue,
    Relationship,
    Channel,
    Language,
    CustomerName,
    YourName,
    OtherInfo,
    DelayReason,
    CustomReason,
    ProposedSolution,
    CustomSolution,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Amount => "Amount due",
            Field::Overdue => "Overdue for",
            Field::Relationship => "Relationship",
            Field::Channel => "Channel",
            Field::Language => "Language",
            Field::CustomerName => "Their name",
            Field::YourName => "Your name",
            Field::OtherInfo => "Anything else",
            Field::DelayReason => "Delay reason",
            Field::CustomReason => "Custom reason",
            Field::ProposedSolution => "Proposed solution",
            Field::CustomSolution => "Custom solution",
        }
    }

    /// Select rows cycle through fixed options instead of taking text.
    pub fn is_select(&self) -> bool {
        matches!(
            self,
            Field::Relationship
                | Field::Channel
                | Field::Language
                | Field::DelayReason
                | Field::ProposedSolution
        )
    }
}

/// Identity of one copyable output, used to key the copied badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSlot {
    Variant(usize),
    VoiceNote,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Situation form
    pub details: SituationDetails,
    pub field_idx: usize,
    pub edit_cursor: usize, // char position within the focused text field

    // Generation state
    pub loading: bool,
    pub error: Option<String>,
    pub reminders: Option<ReminderSet>,
    pub generate_task: Option<tokio::task::JoinHandle<anyhow::Result<ReminderSet>>>,

    // Results state
    pub selected_output: usize, // index into output_slots()
    pub variants_state: ListState,
    pub copied: Option<(OutputSlot, Instant)>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // API key input state
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_cursor: usize,

    // Backend
    pub client: Option<GeminiClient>,
    pub model: String,
}

impl App {
    pub fn new() -> Self {
        Self::with_config(Config::load().unwrap_or_default())
    }

    pub fn with_config(config: Config) -> Self {
        let client = config.resolve_api_key().map(|key| GeminiClient::new(&key));
        let model = config
            .default_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut details = SituationDetails::default();
        if let Some(language) = config
            .default_language
            .as_deref()
            .and_then(Language::from_str)
        {
            details.language = language;
        }

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Form,

            details,
            field_idx: 0,
            edit_cursor: 0,

            loading: false,
            error: None,
            reminders: None,
            generate_task: None,

            selected_output: 0,
            variants_state: ListState::default(),
            copied: None,

            animation_frame: 0,

            show_api_key_input: false,
            api_key_input: String::new(),
            api_key_cursor: 0,

            client,
            model,
        }
    }

    // Form fields

    /// The rows currently on screen. Negotiate mode adds the delay and
    /// resolution rows; the custom rows appear only while their select
    /// sits on the sentinel.
    pub fn visible_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::Amount,
            Field::Overdue,
            Field::Relationship,
            Field::Channel,
            Field::Language,
            Field::CustomerName,
            Field::YourName,
            Field::OtherInfo,
        ];

        if self.details.mode == Mode::Negotiate {
            fields.push(Field::DelayReason);
            if self.details.delay_reason == CUSTOM_SENTINEL {
                fields.push(Field::CustomReason);
            }
            fields.push(Field::ProposedSolution);
            if self.details.proposed_solution == CUSTOM_SENTINEL {
                fields.push(Field::CustomSolution);
            }
        }

        fields
    }

    pub fn focused_field(&self) -> Field {
        let fields = self.visible_fields();
        fields[self.field_idx.min(fields.len() - 1)]
    }

    pub fn field_value(&self, field: Field) -> &str {
        match field {
            Field::Amount => &self.details.amount,
            Field::Overdue => &self.details.overdue,
            Field::Relationship => &self.details.relationship,
            Field::Channel => &self.details.channel,
            Field::Language => self.details.language.as_str(),
            Field::CustomerName => &self.details.customer_name,
            Field::YourName => &self.details.your_name,
            Field::OtherInfo => &self.details.other_info,
            Field::DelayReason => &self.details.delay_reason,
            Field::CustomReason => &self.details.custom_reason,
            Field::ProposedSolution => &self.details.proposed_solution,
            Field::CustomSolution => &self.details.custom_solution,
        }
    }

    /// Mutable access for text rows; select rows go through [`Self::cycle_field`].
    pub fn field_value_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Amount => Some(&mut self.details.amount),
            Field::Overdue => Some(&mut self.details.overdue),
            Field::CustomerName => Some(&mut self.details.customer_name),
            Field::YourName => Some(&mut self.details.your_name),
            Field::OtherInfo => Some(&mut self.details.other_info),
            Field::CustomReason => Some(&mut self.details.custom_reason),
            Field::CustomSolution => Some(&mut self.details.custom_solution),
            _ => None,
        }
    }

    pub fn field_down(&mut self) {
        let len = self.visible_fields().len();
        self.field_idx = (self.field_idx + 1).min(len - 1);
    }

    pub fn field_up(&mut self) {
        self.field_idx = self.field_idx.saturating_sub(1);
    }

    /// Step the focused select row through its options. No-op on text rows.
    pub fn cycle_field(&mut self, forward: bool) {
        match self.focused_field() {
            Field::Relationship => {
                self.details.relationship =
                    cycle_option(RELATIONSHIPS, &self.details.relationship, forward);
            }
            Field::Channel => {
                self.details.channel = cycle_option(CHANNELS, &self.details.channel, forward);
            }
            Field::Language => {
                self.details.language = self.details.language.toggled();
            }
            Field::DelayReason => {
                self.details.delay_reason =
                    cycle_option(DELAY_REASONS, &self.details.delay_reason, forward);
            }
            Field::ProposedSolution => {
                self.details.proposed_solution =
                    cycle_option(SOLUTIONS, &self.details.proposed_solution, forward);
            }
            _ => {}
        }
        self.clamp_field_idx();
    }

    fn clamp_field_idx(&mut self) {
        let len = self.visible_fields().len();
        self.field_idx = self.field_idx.min(len - 1);
    }

    /// Switch between Collect and Negotiate. Stale output must not be
    /// shown under a changed mode, so the result and error are dropped.
    pub fn select_mode(&mut self, mode: Mode) {
        self.details.mode = mode;
        self.reminders = None;
        self.error = None;
        self.copied = None;
        self.selected_output = 0;
        self.variants_state.select(None);
        self.focus = FocusPane::Form;
        self.clamp_field_idx();
    }

    // Results

    pub fn output_slots(&self) -> Vec<OutputSlot> {
        match &self.reminders {
            Some(set) => {
                let mut slots: Vec<OutputSlot> =
                    (0..set.variants.len()).map(OutputSlot::Variant).collect();
                slots.push(OutputSlot::VoiceNote);
                slots
            }
            None => Vec::new(),
        }
    }

    pub fn selected_slot(&self) -> Option<OutputSlot> {
        self.output_slots().get(self.selected_output).copied()
    }

    pub fn output_down(&mut self) {
        let len = self.output_slots().len();
        if len > 0 {
            self.selected_output = (self.selected_output + 1).min(len - 1);
        }
    }

    pub fn output_up(&mut self) {
        self.selected_output = self.selected_output.saturating_sub(1);
    }

    /// The text behind one output slot.
    pub fn slot_text(&self, slot: OutputSlot) -> Option<String> {
        let set = self.reminders.as_ref()?;
        match slot {
            OutputSlot::Variant(i) => set.variants.get(i).map(|v| v.content.clone()),
            OutputSlot::VoiceNote => Some(set.voice_note.clone()),
        }
    }

    // Copy acknowledgement

    pub fn mark_copied(&mut self, slot: OutputSlot) {
        self.copied = Some((slot, Instant::now()));
    }

    pub fn is_copied(&self, slot: OutputSlot) -> bool {
        matches!(self.copied, Some((s, _)) if s == slot)
    }

    /// Tick handler: advances the loading animation and expires the
    /// copied badge once its window has passed.
    pub fn tick(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if let Some((_, at)) = self.copied {
            if at.elapsed() >= COPY_ACK_WINDOW {
                self.copied = None;
            }
        }
    }

    // API key

    pub fn set_api_key(&mut self, key: &str) {
        self.client = Some(GeminiClient::new(key));
        if let Err(err) = Config::save_api_key(key) {
            tracing::warn!(error = %err, "failed to persist API key");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminders::ReminderMessage;

    fn app() -> App {
        App::with_config(Config::default())
    }

    fn sample_set() -> ReminderSet {
        ReminderSet {
            summary: "Be warm, be specific.".to_string(),
            principles: vec!["Urgency".to_string()],
            variants: vec![ReminderMessage {
                variant: "A".to_string(),
                title: "Nudge".to_string(),
                content: "Hey, about that payment...".to_string(),
            }],
            voice_note: "Hi, quick one...".to_string(),
        }
    }

    #[test]
    fn test_select_mode_clears_previous_result() {
        let mut app = app();
        app.reminders = Some(sample_set());
        app.error = Some("old error".to_string());

        app.select_mode(Mode::Negotiate);

        assert!(app.reminders.is_none());
        assert!(app.error.is_none());
        assert_eq!(app.details.mode, Mode::Negotiate);
    }

    #[test]
    fn test_collect_mode_hides_negotiation_rows() {
        let app = app();
        let fields = app.visible_fields();
        assert!(!fields.contains(&Field::DelayReason));
        assert!(!fields.contains(&Field::ProposedSolution));
    }

    #[test]
    fn test_custom_rows_appear_with_sentinel() {
        let mut app = app();
        app.select_mode(Mode::Negotiate);
        assert!(!app.visible_fields().contains(&Field::CustomReason));

        app.details.delay_reason = CUSTOM_SENTINEL.to_string();
        let fields = app.visible_fields();
        let reason = fields.iter().position(|f| *f == Field::DelayReason).unwrap();
        assert_eq!(fields[reason + 1], Field::CustomReason);
    }

    #[test]
    fn test_field_idx_clamped_when_rows_disappear() {
        let mut app = app();
        app.select_mode(Mode::Negotiate);
        app.field_idx = app.visible_fields().len() - 1;

        app.select_mode(Mode::Collect);
        assert!(app.field_idx < app.visible_fields().len());
        // focused_field must not panic afterwards
        let _ = app.focused_field();
    }

    #[test]
    fn test_copied_badge_expires_after_window() {
        let mut app = app();
        let slot = OutputSlot::Variant(0);
        let past = Instant::now()
            .checked_sub(COPY_ACK_WINDOW + Duration::from_secs(1))
            .unwrap();
        app.copied = Some((slot, past));

        app.tick();
        assert!(!app.is_copied(slot));
        assert!(app.copied.is_none());
    }

    #[test]
    fn test_fresh_copy_survives_tick() {
        let mut app = app();
        let slot = OutputSlot::Variant(1);
        app.mark_copied(slot);

        app.tick();
        assert!(app.is_copied(slot));
    }

    #[test]
    fn test_new_copy_replaces_previous_indicator() {
        let mut app = app();
        app.mark_copied(OutputSlot::Variant(0));
        app.mark_copied(OutputSlot::VoiceNote);

        assert!(!app.is_copied(OutputSlot::Variant(0)));
        assert!(app.is_copied(OutputSlot::VoiceNote));
    }

    #[test]
    fn test_output_slots_include_voice_note() {
        let mut app = app();
        app.reminders = Some(sample_set());

        let slots = app.output_slots();
        assert_eq!(slots, vec![OutputSlot::Variant(0), OutputSlot::VoiceNote]);
        assert_eq!(
            app.slot_text(OutputSlot::VoiceNote).as_deref(),
            Some("Hi, quick one...")
        );
    }
}
