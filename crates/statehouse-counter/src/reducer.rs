use crate::actions::Action;
use crate::environment::CounterEnvironment;
use crate::state::CounterState;
use statehouse::{effect, EffectJob};

/// Reducer - updates the counter state in place for one action
///
/// Remote loads are returned as effect jobs; their result comes back as
/// another action.
pub fn reduce(
    state: &mut CounterState,
    action: Action,
    env: &mut CounterEnvironment,
) -> Option<EffectJob<Action>> {
    match action {
        Action::Bootstrap => {
            state.bootstrapped = true;
            None
        }
        Action::Increment => {
            state.counter += 1;
            None
        }
        Action::Decrement => {
            state.counter -= 1;
            None
        }
        Action::Reset => {
            state.counter = 0;
            None
        }
        Action::Fetch => {
            state.loading = true;
            let delay = env.fetch_delay;
            let value = env.remote_value;
            Some(effect(async move {
                tokio::time::sleep(delay).await;
                Ok::<_, anyhow::Error>(Action::SetValue(value))
            }))
        }
        Action::FetchBroken => {
            let delay = env.fetch_delay;
            Some(effect(async move {
                tokio::time::sleep(delay).await;
                Err::<Action, _>(anyhow::anyhow!("remote counter unavailable"))
            }))
        }
        Action::SetValue(value) => {
            log::debug!("Remote counter loaded: {}", value);
            state.counter = value;
            state.loading = false;
            None
        }
    }
}
