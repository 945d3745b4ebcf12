use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::BTreeMap;
use vms_core::{Alert, HealthInfo, StreamDescriptor};
use vms_sync::{ActionDispatcher, EngineEvent, PollState, StartForm};

pub const MAX_VISIBLE_ALERTS: usize = 6;

const DEFAULT_FORM_SOURCE: &str = "0";
const DEFAULT_FORM_MODELS: &str = "asset_detection,defect_analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Streams,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    StreamId,
    Source,
    Models,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::StreamId => "stream id",
            FormField::Source => "source",
            FormField::Models => "models",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            FormField::StreamId => FormField::Source,
            FormField::Source => FormField::Models,
            FormField::Models => FormField::StreamId,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::StreamId => FormField::Models,
            FormField::Source => FormField::StreamId,
            FormField::Models => FormField::Source,
        }
    }
}

/// One row of the streams table. The descriptor arrives with the registry's
/// list events; poll state arrives from the row's poller, gated by the
/// generation it was tagged with at spawn.
#[derive(Debug)]
pub struct StreamRow {
    pub descriptor: Option<StreamDescriptor>,
    pub generation: u64,
    pub poll: PollState,
}

pub struct App {
    dispatcher: ActionDispatcher,
    pub health: Option<HealthInfo>,
    pub rows: BTreeMap<String, StreamRow>,
    pub alerts: Vec<Alert>,
    pub mode: Mode,
    pub form: StartForm,
    pub form_field: FormField,
    pub selected: usize,
    pub status_note: Option<String>,
    should_quit: bool,
}

fn default_form() -> StartForm {
    StartForm {
        stream_id: String::new(),
        source: DEFAULT_FORM_SOURCE.to_string(),
        models: DEFAULT_FORM_MODELS.to_string(),
    }
}

impl App {
    pub fn new(dispatcher: ActionDispatcher) -> Self {
        Self {
            dispatcher,
            health: None,
            rows: BTreeMap::new(),
            alerts: Vec::new(),
            mode: Mode::Streams,
            form: default_form(),
            form_field: FormField::StreamId,
            selected: 0,
            status_note: None,
            should_quit: false,
        }
    }

    pub fn set_health(&mut self, health: HealthInfo) {
        self.health = Some(health);
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn apply_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::StreamAdded {
                stream_id,
                generation,
            } => {
                // A re-added id starts from scratch; nothing of a previous
                // poller's state may leak into the new row.
                self.rows.insert(
                    stream_id,
                    StreamRow {
                        descriptor: None,
                        generation,
                        poll: PollState::default(),
                    },
                );
            }
            EngineEvent::StreamRemoved(stream_id) => {
                self.rows.remove(&stream_id);
                self.clamp_selection();
            }
            EngineEvent::Streams(streams) => {
                for descriptor in streams {
                    if let Some(row) = self.rows.get_mut(&descriptor.stream_id) {
                        row.descriptor = Some(descriptor);
                    }
                }
            }
            EngineEvent::Poll {
                stream_id,
                generation,
                state,
            } => {
                if let Some(row) = self.rows.get_mut(&stream_id) {
                    // Stale snapshot from a destroyed poller; drop it.
                    if row.generation != generation {
                        return;
                    }
                    row.poll = state;
                }
            }
            EngineEvent::Alerts(mut alerts) => {
                alerts.sort_by(|a, b| {
                    b.timestamp
                        .partial_cmp(&a.timestamp)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                alerts.truncate(MAX_VISIBLE_ALERTS);
                self.alerts = alerts;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.mode {
            Mode::Streams => self.handle_streams_key(key),
            Mode::Form => self.handle_form_key(key),
        }
    }

    fn handle_streams_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Char('s') => {
                self.mode = Mode::Form;
                self.form_field = FormField::StreamId;
            }
            KeyCode::Char('x') => self.stop_selected(),
            KeyCode::Esc => self.status_note = None,
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Streams,
            KeyCode::Tab | KeyCode::Down => self.form_field = self.form_field.next(),
            KeyCode::BackTab | KeyCode::Up => self.form_field = self.form_field.prev(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Backspace => {
                self.focused_field_mut().pop();
            }
            KeyCode::Char(c) => self.focused_field_mut().push(c),
            _ => {}
        }
    }

    fn focused_field_mut(&mut self) -> &mut String {
        match self.form_field {
            FormField::StreamId => &mut self.form.stream_id,
            FormField::Source => &mut self.form.source,
            FormField::Models => &mut self.form.models,
        }
    }

    fn submit_form(&mut self) {
        match self.dispatcher.start(&self.form) {
            Ok(stream_id) => {
                self.status_note = Some(format!("start requested: {stream_id}"));
                self.form = default_form();
                self.mode = Mode::Streams;
            }
            Err(err) => self.status_note = Some(err.to_string()),
        }
    }

    fn stop_selected(&mut self) {
        let Some(stream_id) = self.selected_stream_id() else {
            return;
        };
        self.dispatcher.stop(&stream_id);
        self.status_note = Some(format!("stop requested: {stream_id}"));
    }

    pub fn selected_stream_id(&self) -> Option<String> {
        self.rows.keys().nth(self.selected).cloned()
    }

    fn select_next(&mut self) {
        if !self.rows.is_empty() && self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        if self.rows.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.rows.len() {
            self.selected = self.rows.len() - 1;
        }
    }
}
