use anyhow::{Context, Result};
use statehouse::{intercept, LoggingMiddleware, Store, StoreConfig};
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::LocalSet;

mod actions;
mod environment;
mod logger;
mod middleware;
mod reducer;
mod state;
mod view;

use actions::Action;
use environment::CounterEnvironment;
use middleware::BoundsMiddleware;
use state::CounterState;
use view::ConsoleView;

/// How long to wait for outstanding effects before cancelling them
const EFFECT_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let log_file = logger::init()?;
    let config = StoreConfig::load();
    logger::apply_level(&config.log_level);

    log::info!("Starting statehouse-counter");

    let actions = parse_actions(std::env::args().skip(1))?;
    LocalSet::new().run_until(run(&config, actions)).await;

    log::info!("Exiting statehouse-counter");
    println!("log written to {}", log_file.display());
    Ok(())
}

/// Parse command line commands; no commands runs a short default script
fn parse_actions(args: impl Iterator<Item = String>) -> Result<Vec<Action>> {
    let actions = args
        .map(|arg| Action::from_str(&arg).with_context(|| format!("Unknown command: {}", arg)))
        .collect::<Result<Vec<_>>>()?;

    if actions.is_empty() {
        return Ok(vec![
            Action::Increment,
            Action::Increment,
            Action::Decrement,
            Action::Fetch,
            Action::FetchBroken,
        ]);
    }
    Ok(actions)
}

fn build_store(config: &StoreConfig) -> Store<CounterState, Action, CounterEnvironment> {
    let mut builder = Store::builder(reducer::reduce, CounterEnvironment::default())
        .config(config)
        .bootstrap(Action::Bootstrap);

    // Add middleware in order (they execute in this order)
    if config.log_actions {
        builder = builder.middleware(LoggingMiddleware::new());
    }
    builder.middleware(intercept(BoundsMiddleware::new())).build()
}

async fn run(config: &StoreConfig, actions: Vec<Action>) {
    let store = build_store(config);
    let view = Rc::new(ConsoleView);
    store.subscribe(&view);

    for action in actions {
        store.dispatch(action);
    }

    let settled = tokio::time::timeout(EFFECT_TIMEOUT, async {
        while store.pending_jobs() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    if settled.is_err() {
        log::warn!("Effects still pending after {:?}", EFFECT_TIMEOUT);
        store.shutdown();
    }
}
