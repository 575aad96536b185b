mod app;
mod layout;
mod notes;
mod stack;

use app::App;

fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
