use strum::EnumString;

/// Actions represent all possible state changes of the counter.
///
/// Commands given on the command line are parsed into actions by their
/// kebab-case name (`increment`, `fetch-broken`, ...).
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Action {
    /// Dispatched once while the store is built
    #[strum(disabled)]
    Bootstrap,

    /// ## Local counter actions
    Increment,
    Decrement,
    Reset,

    /// ## Remote counter actions
    /// Load the remote value (resolves to SetValue)
    Fetch,
    /// Load from a remote that always fails (the failure is only logged)
    FetchBroken,
    /// Remote value arrived
    #[strum(disabled)]
    SetValue(i64),
}
