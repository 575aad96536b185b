use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;

use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use regex::Regex;
use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Note {
    pub title: String,
    pub html: String,
    #[serde(default)]
    pub linked_note_ids: Vec<String>,
    #[serde(default)]
    pub backlink_note_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NoteError {
    Network(String),
    Http(u16),
    Decode(String),
}

impl fmt::Display for NoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteError::Network(detail) => write!(f, "network error: {detail}"),
            NoteError::Http(status) => write!(f, "server responded with status {status}"),
            NoteError::Decode(detail) => write!(f, "malformed note payload: {detail}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NoteState {
    Pending,
    Ready(Arc<Note>),
    Failed(NoteError),
}

// An anchor href counts as a note ID only if it is a bare slug; anything
// absolute, external or fragment-shaped falls through to the browser.
pub fn is_note_id(candidate: &str) -> bool {
    static RE_NOTE_ID: OnceLock<Regex> = OnceLock::new();
    let re = RE_NOTE_ID.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());
    re.is_match(candidate)
}

pub fn prefetch_targets(note: &Note) -> Vec<&str> {
    let mut targets: Vec<&str> = Vec::new();
    for id in note
        .linked_note_ids
        .iter()
        .chain(note.backlink_note_ids.iter())
    {
        let id = id.as_str();
        if is_note_id(id) && !targets.contains(&id) {
            targets.push(id);
        }
    }
    targets
}

#[derive(Clone, Copy)]
pub struct NoteStore {
    slots: StoredValue<HashMap<String, RwSignal<NoteState>>>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self {
            slots: StoredValue::new(HashMap::new()),
        }
    }

    // Get-or-create: the first caller for an ID starts the fetch, every later
    // caller shares the same slot and therefore the same in-flight request.
    pub fn ensure(&self, note_id: &str) -> RwSignal<NoteState> {
        if let Some(slot) = self.slots.with_value(|slots| slots.get(note_id).copied()) {
            return slot;
        }

        let slot = RwSignal::new(NoteState::Pending);
        self.slots.update_value(|slots| {
            slots.insert(note_id.to_string(), slot);
        });

        let note_id = note_id.to_string();
        spawn_local(async move {
            match fetch_note(&note_id).await {
                Ok(note) => slot.set(NoteState::Ready(Arc::new(note))),
                Err(err) => {
                    warn!("failed to load note {note_id}: {err}");
                    slot.set(NoteState::Failed(err));
                }
            }
        });

        slot
    }

    // Fire-and-forget warm-up of everything a note links to; failures stay
    // in their own slots.
    pub fn prefetch(&self, note: &Note) {
        for id in prefetch_targets(note) {
            self.ensure(id);
        }
    }
}

async fn fetch_note(note_id: &str) -> Result<Note, NoteError> {
    let response = JsFuture::from(window().fetch_with_str(&format!("/notes/{note_id}.json")))
        .await
        .map_err(|err| NoteError::Network(format!("{err:?}")))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| NoteError::Network("fetch did not yield a response".to_string()))?;
    if !response.ok() {
        return Err(NoteError::Http(response.status()));
    }
    let payload = JsFuture::from(
        response
            .json()
            .map_err(|err| NoteError::Decode(format!("{err:?}")))?,
    )
    .await
    .map_err(|err| NoteError::Decode(format!("{err:?}")))?;
    serde_wasm_bindgen::from_value(payload).map_err(|err| NoteError::Decode(err.to_string()))
}
