use std::time::Duration;

use clusterlib::kubectl::Kubectl;
use clusterlib::signal::Signals;
use clusterlib::util::random_suffix;

use nodeshell::shell::{self, Invocation};
use nodeshell::Args;

#[tokio::main]
async fn main() {
    let Args {
        namespace,
        image,
        timeout,
        kubectl,
        logging,
        node,
        command,
    } = clusterlib::parse_args();
    logging.init();

    let cluster = Kubectl::new(kubectl);
    let invocation = match Invocation::resolve(
        &cluster,
        node,
        namespace,
        image,
        Duration::from_secs(timeout),
        command,
    )
    .await
    {
        Ok(invocation) => invocation,
        Err(error) => clusterlib::die(&error),
    };

    let mut signals = match Signals::register() {
        Ok(signals) => signals,
        Err(error) => clusterlib::die(&error.into()),
    };

    if let Err(error) = shell::open(&cluster, &invocation, &random_suffix(), signals.recv()).await {
        clusterlib::die(&error);
    }
}
