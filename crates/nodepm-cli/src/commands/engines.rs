use super::{fail, print_json, w, Project};
use miette::Result;
use nodepm_core::pm::{PackageManagerName, Requirement, SystemCommandRunner};
use nodepm_core::version::SCHEMA_VERSION;
use nodepm_core::{Config, FeatureFlags, PackageManagerResolver};
use serde::Serialize;
use std::io;

#[derive(Serialize)]
struct EnginesOutput<'a> {
    schema_version: u32,
    ok: bool,
    name: PackageManagerName,
    /// Raw `engines` entry, if any.
    constraint: Option<&'a str>,
    requirement: Option<&'a Requirement>,
    clauses: Vec<ClauseOutput<'a>>,
}

#[derive(Serialize)]
struct ClauseOutput<'a> {
    op: &'static str,
    version: &'a str,
}

/// Print the `engines` requirement declared for `name`.
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
    let requirement = resolver.find_engine_constraints_as_requirement(name);

    if json {
        let clauses = requirement
            .iter()
            .flat_map(Requirement::clauses)
            .map(|c| ClauseOutput {
                op: c.op.as_str(),
                version: &c.version,
            })
            .collect();
        return print_json(&EnginesOutput {
            schema_version: SCHEMA_VERSION,
            ok: true,
            name,
            constraint: project.manifest.engine(name),
            requirement: requirement.as_ref(),
            clauses,
        });
    }

    let mut out = io::stdout().lock();
    match requirement {
        Some(requirement) => w(&mut out, &format!("{requirement}\n")),
        None => {
            tracing::info!(package_manager = %name, "no engines requirement");
            Ok(())
        }
    }
}
