use crate::state::CounterState;
use statehouse::StoreSubscriber;

/// Console view - prints a line for every state it receives
pub struct ConsoleView;

impl StoreSubscriber<CounterState> for ConsoleView {
    fn new_state(&self, state: &CounterState) {
        println!("{}", render(state));
    }
}

/// Render the state as one status line
pub fn render(state: &CounterState) -> String {
    let status = if state.loading { " (loading...)" } else { "" };
    format!("counter = {}{}", state.counter, status)
}
