#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::wildcard_imports)]

pub mod cluster;
pub mod error;
pub mod kubectl;
pub mod lifecycle;
pub mod logging;
pub mod resources;
pub mod signal;
pub mod util;
pub mod validate;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use std::ffi::OsString;
use std::process;

use crate::error::Error;

/// Exit code for every kind of failure, including usage errors.
pub static EXIT_CODE_FAILURE: i32 = 1;

/// Parse command-line arguments or die.
///
/// `--help` and `--version` exit with 0.  Usage errors print the problem and
/// usage to stderr and exit with `EXIT_CODE_FAILURE`, rather than clap's
/// default of 2.
pub fn parse_args<P: clap::Parser>() -> P {
    parse_args_from(std::env::args_os())
}

/// Like `parse_args`, but from an explicit argument list.
pub fn parse_args_from<P, I, T>(args: I) -> P
where
    P: clap::Parser,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match P::try_parse_from(args) {
        Ok(parsed) => parsed,
        Err(error) => {
            let _ = error.print();
            if error.use_stderr() {
                process::exit(EXIT_CODE_FAILURE);
            } else {
                process::exit(0);
            }
        }
    }
}

/// Report a fatal error and terminate.
pub fn die(error: &Error) -> ! {
    tracing::error!(%error, "terminating...");
    process::exit(EXIT_CODE_FAILURE);
}
