use std::cell::Cell;
use std::rc::Rc;

use leptos::html;
use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlAnchorElement, MouseEvent, PopStateEvent, ScrollBehavior, ScrollToOptions};

use crate::layout::{self, PaneStyles, PanesLayoutState};
use crate::notes::{is_note_id, NoteState, NoteStore};
use crate::stack::{PaneNode, PaneStack, StackAction};

const DEFAULT_ROOT_NOTE_ID: &str = "index";

// At most one layout recomputation per animation frame; extra triggers in
// the same frame are dropped until the scheduled one has run.
#[derive(Clone, Default)]
pub struct FrameGate(Rc<Cell<bool>>);

impl FrameGate {
    pub fn try_acquire(&self) -> bool {
        if self.0.get() {
            return false;
        }
        self.0.set(true);
        true
    }

    pub fn release(&self) {
        self.0.set(false);
    }
}

fn on_next_frame(callback: impl FnOnce() + 'static) {
    let callback = Closure::once_into_js(callback);
    let _ = window().request_animation_frame(callback.unchecked_ref::<js_sys::Function>());
}

fn stack_from_location() -> PaneStack {
    let location = window().location();
    let pathname = location.pathname().unwrap_or_default();
    let search = location.search().unwrap_or_default();
    PaneStack::parse_href(&pathname, &search, DEFAULT_ROOT_NOTE_ID)
}

// Mirror the stack into the navigable URL; the pushed state carries the full
// ID list so popstate can restore without reparsing.
fn push_stack_url(stack: &PaneStack) {
    if stack.is_empty() {
        return;
    }
    let payload = serde_json::to_string(&stack.ids()).unwrap_or_default();
    if let Ok(history) = window().history() {
        let _ = history.push_state_with_url(
            &JsValue::from_str(&payload),
            "",
            Some(&stack.to_href()),
        );
    }
}

#[component]
pub fn App() -> impl IntoView {
    provide_context(NoteStore::new());

    let panes_ref: NodeRef<html::Div> = NodeRef::new();
    let stack = RwSignal::new(stack_from_location());
    let layout_state = RwSignal::new(PanesLayoutState::default());
    let scroll_target = RwSignal::new(stack.with_untracked(|s| s.len().checked_sub(1)));

    let measure = move || {
        if let Some(el) = panes_ref.get_untracked() {
            layout_state.set(PanesLayoutState {
                scroll_x: el.scroll_left() as f64,
                offset_width: el.offset_width() as f64,
            });
        }
    };

    let gate = FrameGate::default();
    let schedule_measure = move || {
        if !gate.try_acquire() {
            return;
        }
        let gate = gate.clone();
        on_next_frame(move || {
            gate.release();
            measure();
        });
    };

    // First measurement once the container exists.
    Effect::new(move |_| {
        if panes_ref.get().is_some() {
            measure();
        }
    });

    // Bring the requested pane into view after the DOM has caught up.
    Effect::new(move |_| {
        let _ = panes_ref.get();
        let Some(index) = scroll_target.get() else {
            return;
        };
        if let Some(el) = panes_ref.get_untracked() {
            let options = ScrollToOptions::new();
            options.set_left(layout::pane_scroll_x(index));
            options.set_behavior(ScrollBehavior::Smooth);
            el.scroll_to_with_scroll_to_options(&options);
        }
    });

    let request_note = move |from_index: usize, note_id: String| {
        let Some(action) = stack.try_update(|s| s.request_note(from_index, &note_id)) else {
            return;
        };
        match action {
            StackAction::ScrollTo(index) => scroll_target.set(Some(index)),
            StackAction::Opened(index) => {
                stack.with_untracked(push_stack_url);
                scroll_target.set(Some(index));
            }
        }
    };

    {
        let schedule_measure = schedule_measure.clone();
        let resize = Closure::<dyn FnMut()>::new(move || schedule_measure());
        let _ = window().add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref());
        resize.forget();
    }

    // Back/forward restores a whole stack, from the pushed state when it is
    // usable and from the location otherwise.
    {
        let popstate = Closure::<dyn FnMut(PopStateEvent)>::new(move |event: PopStateEvent| {
            let restored = event
                .state()
                .as_string()
                .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
                .filter(|ids| !ids.is_empty())
                .map(PaneStack::from_ids)
                .unwrap_or_else(stack_from_location);
            let last = restored.len().checked_sub(1);
            stack.set(restored);
            scroll_target.set(last);
        });
        let _ =
            window().add_event_listener_with_callback("popstate", popstate.as_ref().unchecked_ref());
        popstate.forget();
    }

    // One left-fold pass per frame; every pane reads from the same snapshot.
    let pane_styles = Memo::new(move |_| {
        let state = layout_state.get();
        let count = stack.with(|s| s.len());
        layout::compute_stack(&state, count)
    });

    let on_scroll = schedule_measure.clone();
    view! {
        <div class="app">
            <div class="panes-container" node_ref=panes_ref on:scroll=move |_| on_scroll()>
                <div
                    class="panes"
                    style=move || format!("width: {}px;", layout::panes_width(stack.with(|s| s.len())))
                >
                    <For
                        each=move || stack.with(|s| s.nodes().to_vec())
                        key=|node| (node.index, node.note_id.clone())
                        children=move |node: PaneNode| {
                            let i = node.index;
                            let styles = Signal::derive(move || {
                                pane_styles.with(|all| all.get(i).cloned().unwrap_or_default())
                            });
                            let on_request_note =
                                Callback::new(move |note_id: String| request_note(i, note_id));
                            view! {
                                <NotePane
                                    note_id=node.note_id
                                    styles=styles
                                    on_request_note=on_request_note
                                />
                            }
                        }
                    />
                </div>
            </div>
        </div>
    }
}

#[component]
fn NotePane(
    note_id: String,
    #[prop(into)] styles: Signal<PaneStyles>,
    on_request_note: Callback<String>,
) -> impl IntoView {
    let store = expect_context::<NoteStore>();
    let slot = store.ensure(&note_id);

    // Once the note is on screen, warm the cache for everything it links to.
    Effect::new(move |_| {
        if let NoteState::Ready(note) = slot.get() {
            store.prefetch(&note);
        }
    });

    let title = Signal::derive(move || match slot.get() {
        NoteState::Ready(note) => Some(note.title.clone()),
        _ => None,
    });

    let intercept_note_link = move |event: MouseEvent| {
        let Some(target) = event.target() else {
            return;
        };
        let Some(anchor) = target.dyn_ref::<HtmlAnchorElement>() else {
            return;
        };
        let Some(href) = anchor.get_attribute("href") else {
            return;
        };
        if !is_note_id(&href) {
            return;
        }
        event.prevent_default();
        on_request_note.run(href);
    };

    view! {
        <Pane styles=styles title=title>
            {move || match slot.get() {
                NoteState::Pending => {
                    view! { <p class="pane-status">"Loading…"</p> }.into_any()
                }
                NoteState::Failed(_) => {
                    view! { <p class="pane-status">"Couldn't load this note."</p> }.into_any()
                }
                NoteState::Ready(note) => {
                    let backlinks = (!note.backlink_note_ids.is_empty()).then(|| {
                        let items = note
                            .backlink_note_ids
                            .iter()
                            .map(|backlink_id| {
                                view! {
                                    <BacklinkNote
                                        note_id=backlink_id.clone()
                                        on_request_note=on_request_note
                                    />
                                }
                            })
                            .collect::<Vec<_>>();
                        view! { <div class="backlink-notes">{items}</div> }
                    });
                    view! {
                        <div
                            class="note-content"
                            inner_html=note.html.clone()
                            on:click=intercept_note_link
                        ></div>
                        {backlinks}
                    }
                    .into_any()
                }
            }}
        </Pane>
    }
}

// A single bad backlink renders its own error state without touching the
// parent pane or its siblings.
#[component]
fn BacklinkNote(note_id: String, on_request_note: Callback<String>) -> impl IntoView {
    let store = expect_context::<NoteStore>();
    let slot = store.ensure(&note_id);

    view! {
        <div class="backlink-note">
            {move || match slot.get() {
                NoteState::Pending => {
                    view! { <p class="pane-status">"Loading…"</p> }.into_any()
                }
                NoteState::Failed(_) => {
                    view! { <p class="pane-status">"Couldn't load this backlink."</p> }.into_any()
                }
                NoteState::Ready(note) => {
                    let note_id = note_id.clone();
                    view! {
                        <div
                            class="backlink-note-content"
                            inner_html=note.html.clone()
                            on:click=move |event: MouseEvent| {
                                event.prevent_default();
                                on_request_note.run(note_id.clone());
                            }
                        ></div>
                    }
                    .into_any()
                }
            }}
        </div>
    }
}

#[component]
fn Pane(
    #[prop(into)] styles: Signal<PaneStyles>,
    #[prop(into)] title: Signal<Option<String>>,
    children: Children,
) -> impl IntoView {
    view! {
        <div class="pane" style=move || styles.with(|s| s.container_style())>
            <Show when=move || title.with(|t| t.is_some()) fallback=|| ().into_view()>
                <div class="pane-background" style=move || styles.with(|s| s.background_style())>
                    <h2 class="pane-title">{move || title.get().unwrap_or_default()}</h2>
                </div>
            </Show>
            <div class="pane-foreground" style=move || styles.with(|s| s.foreground_style())>
                {children()}
            </div>
        </div>
    }
}
