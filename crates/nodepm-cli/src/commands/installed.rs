use super::{fail, print_json, Project};
use miette::Result;
use nodepm_core::pm::{DetectedVersion, PackageManagerName, SystemCommandRunner};
use nodepm_core::version::SCHEMA_VERSION;
use nodepm_core::{Config, FeatureFlags, PackageManagerResolver};
use serde::Serialize;

#[derive(Serialize)]
struct InstalledOutput<'a> {
    schema_version: u32,
    ok: bool,
    name: PackageManagerName,
    installed_version: &'a DetectedVersion,
}

/// Probe the version of `name` installed on this host.
pub fn run(
    config: &Config,
    flags: &dyn FeatureFlags,
    name: PackageManagerName,
    json: bool,
) -> Result<()> {
    let project = Project::load(config).unwrap_or_else(|e| fail(&e, json));
    let runner = SystemCommandRunner::from_config(config, flags);
    let resolver =
        PackageManagerResolver::new(&project.manifest, &project.lockfiles, &runner, flags);

    let installed = resolver.installed(name).unwrap_or_else(|e| fail(&e, json));

    if json {
        print_json(&InstalledOutput {
            schema_version: SCHEMA_VERSION,
            ok: true,
            name,
            installed_version: &installed,
        })
    } else {
        println!("{} ({})", installed.version, installed.source);
        Ok(())
    }
}
