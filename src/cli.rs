// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    anyhow::{anyhow, Result},
    clap::{Arg, ArgMatches, Command, ErrorKind},
    debroot::sysroot::{BootstrapEvent, BootstrapEventCallback, BootstrapRequest, Bootstrapper},
    std::path::PathBuf,
};

const ABOUT: &str = "\
Bootstrap a minimal Debian-flavored sysroot.

debroot populates a directory with packages from an Ubuntu binary package
repository, suitable for use as a cross-compilation sysroot or chroot base.
Repository metadata is verified against the distribution's archive signing
keyring, every package is SHA-256 verified, and absolute symlinks inside the
tree are rewritten to relative form so the result is relocatable.

By default the suite's `Priority: required` package set is installed.
";

fn command() -> Command<'static> {
    Command::new("debroot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Bootstrap minimal Debian-flavored sysroots")
        .long_about(ABOUT)
        .arg(
            Arg::new("arch")
                .long("arch")
                .takes_value(true)
                .value_name("ARCH")
                .help("Target architecture (default: the host architecture)"),
        )
        .arg(
            Arg::new("include")
                .long("include")
                .takes_value(true)
                .multiple_occurrences(true)
                .value_name("PKG,PKG,...")
                .help("Additional packages to install (comma separated, repeatable)"),
        )
        .arg(
            Arg::new("exclude-required")
                .long("exclude-required")
                .help("Do not install the Priority: required base set"),
        )
        .arg(
            Arg::new("suite")
                .required(true)
                .help("Distribution release to install from (e.g. jammy)"),
        )
        .arg(
            Arg::new("target")
                .required(true)
                .help("Directory to populate"),
        )
}

/// Map the host machine to its Debian architecture name.
fn host_architecture() -> Result<&'static str> {
    match std::env::consts::ARCH {
        "x86_64" => Ok("amd64"),
        "x86" => Ok("i386"),
        "aarch64" => Ok("arm64"),
        "arm" => Ok("armhf"),
        "powerpc64" => Ok("ppc64el"),
        "riscv64" => Ok("riscv64"),
        "s390x" => Ok("s390x"),
        arch => Err(anyhow!("unknown host architecture: {}", arch)),
    }
}

fn request_from_matches(matches: &ArgMatches, scratch: PathBuf) -> Result<BootstrapRequest> {
    let architecture = match matches.value_of("arch") {
        Some(arch) => arch.to_string(),
        None => host_architecture()?.to_string(),
    };

    let includes = matches
        .values_of("include")
        .into_iter()
        .flatten()
        .flat_map(|v| v.split(','))
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect::<Vec<_>>();

    Ok(BootstrapRequest {
        suite: matches
            .value_of("suite")
            .expect("suite is a required argument")
            .to_string(),
        architecture,
        target: PathBuf::from(
            matches
                .value_of("target")
                .expect("target is a required argument"),
        ),
        scratch,
        includes,
        exclude_required: matches.is_present("exclude-required"),
    })
}

/// Run the CLI, returning the process exit code.
pub fn run() -> Result<i32> {
    let matches = match command().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => {
            // clap writes --help to stdout and argument errors (with usage)
            // to stderr.
            err.print()?;

            return Ok(match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            });
        }
    };

    // Scratch space for this run. Removed when dropped, after the sysroot
    // is finalized.
    let scratch = tempfile::Builder::new().prefix("debroot-").tempdir()?;

    let request = request_from_matches(&matches, scratch.path().to_path_buf())?;

    let bootstrapper = Bootstrapper::new(request)?;

    let cb: BootstrapEventCallback = Box::new(|event: BootstrapEvent| {
        println!("[+] {}", event);
    });

    bootstrapper.run(&Some(cb))?;

    Ok(0)
}
