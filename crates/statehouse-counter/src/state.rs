/// Counter application state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterState {
    pub counter: i64,
    /// A fetch is in flight
    pub loading: bool,
    /// The bootstrap action has run
    pub bootstrapped: bool,
}
