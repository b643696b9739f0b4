use chrono::Utc;

use clusterlib::kubectl::Kubectl;
use clusterlib::signal::Signals;
use clusterlib::util::random_suffix;

use silencer::silence::{self, Invocation};
use silencer::Args;

#[tokio::main]
async fn main() {
    let Args {
        silence: silence_args,
        kubectl,
        logging,
    } = clusterlib::parse_args();
    logging.init();

    let cluster = Kubectl::new(kubectl);
    let invocation = match Invocation::resolve(&cluster, silence_args).await {
        Ok(invocation) => invocation,
        Err(error) => clusterlib::die(&error),
    };

    let mut signals = match Signals::register() {
        Ok(signals) => signals,
        Err(error) => clusterlib::die(&error.into()),
    };

    match silence::silence(
        &cluster,
        &invocation,
        &random_suffix(),
        Utc::now(),
        signals.recv(),
    )
    .await
    {
        Ok(silence_id) => println!(
            "{}",
            silence::success_message(
                &invocation.alert,
                invocation.duration,
                silence_id.as_deref()
            )
        ),
        Err(error) => clusterlib::die(&error),
    }
}
