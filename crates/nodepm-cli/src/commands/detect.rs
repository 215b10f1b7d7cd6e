use super::{fail, print_json, w, Project};
use miette::Result;
use nodepm_core::pm::{PackageManager, Selection, SystemCommandRunner};
use nodepm_core::version::SCHEMA_VERSION;
use nodepm_core::{Config, FeatureFlags, PackageManagerResolver};
use serde::Serialize;
use std::io;

#[derive(Serialize)]
struct DetectOutput<'a> {
    schema_version: u32,
    ok: bool,
    package_manager: &'a PackageManager,
    selected_by: Selection,
    version_mismatch: bool,
}

/// Run the detect command.
///
/// With `installed`, the host's version is probed and compared against the
/// detected one.
pub fn run(config: &Config, flags: &dyn FeatureFlags, installed: bool, json: bool) -> Result<()> {
    let project = Project::load(config).unwrap_or_else(|e| fail(&e, json));
    let runner = SystemCommandRunner::from_config(config, flags);
    let resolver =
        PackageManagerResolver::new(&project.manifest, &project.lockfiles, &runner, flags);

    let (_, selection) = resolver.select();
    let pm = if installed {
        resolver
            .resolve_with_installed()
            .unwrap_or_else(|e| fail(&e, json))
    } else {
        resolver.resolve()
    };

    if pm.has_version_mismatch() {
        tracing::warn!(
            package_manager = %pm.name(),
            detected = pm.version().unwrap_or_default(),
            installed = pm.installed_version().map(|d| d.version.as_str()).unwrap_or_default(),
            "installed version does not match the project"
        );
    }

    if json {
        print_json(&DetectOutput {
            schema_version: SCHEMA_VERSION,
            ok: true,
            package_manager: &pm,
            selected_by: selection,
            version_mismatch: pm.has_version_mismatch(),
        })
    } else {
        print_human(&pm, selection)
    }
}

fn print_human(pm: &PackageManager, selection: Selection) -> Result<()> {
    let mut out = io::stdout().lock();

    w(&mut out, "\x1b[1m## Package manager\x1b[0m\n")?;
    w(&mut out, &format!("  Name:           {}\n", pm.name()))?;
    w(&mut out, &format!("  Selected by:    {}\n", selection.as_str()))?;
    let version = pm
        .detected_version()
        .map_or_else(|| "unknown".to_string(), |d| format!("{} ({})", d.version, d.source));
    w(&mut out, &format!("  Version:        {version}\n"))?;
    if let Some(installed) = pm.installed_version() {
        w(
            &mut out,
            &format!("  Installed:      {} ({})\n", installed.version, installed.source),
        )?;
    }
    let requirement = pm
        .requirement()
        .map_or_else(|| "none".to_string(), ToString::to_string);
    w(&mut out, &format!("  Requirement:    {requirement}\n"))?;
    w(&mut out, &format!("  Status:         {}\n", status(pm)))?;

    if pm.has_version_mismatch() {
        w(&mut out, "\n")?;
        w(
            &mut out,
            "  ! installed major differs from the version this project expects\n",
        )?;
    }

    Ok(())
}

fn status(pm: &PackageManager) -> &'static str {
    if pm.is_unsupported() {
        "unsupported"
    } else if pm.is_deprecated() {
        "deprecated"
    } else if pm.is_supported() {
        "supported"
    } else {
        "unknown"
    }
}
