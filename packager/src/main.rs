//! SpatiaLite AAR packager CLI entrypoint.
//!
//! This binary builds the SpatiaLite native libraries for Android, packages
//! them as an AAR, and publishes the AAR to a Maven repository.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use spatialite_aar::cli::{Cli, Command};
use spatialite_aar::config::{BuildPlan, DEFAULT_CONFIG_FILE, PackagerConfig};
use spatialite_aar::error::{PackagerError, Result};
use spatialite_aar::executor::SystemCommandExecutor;
use spatialite_aar::lock::WorkDirLock;
use spatialite_aar::ndk::NdkSearch;
use spatialite_aar::output::{DryRunInfo, write_line};
use spatialite_aar::pipeline::{
    BuildEnvironment, Progress, Stage, build_pipeline, planned_commands, planned_static_commands,
    publish_pipeline, static_libs_pipeline,
};
use spatialite_aar::publish::http::Credentials;
use spatialite_aar::publish::metadata::timestamp_now;
use spatialite_aar::publish::repository::open_repository;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.global.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let project_root = resolve_project_root(cli.global.project_root.clone())?;
    let config = load_config(cli, &project_root)?;

    // Validate everything before printing or running anything.
    let plan = config.resolve(&project_root)?;

    if cli.command == Command::ShowConfig {
        write_line(stdout, config.to_toml()?.trim_end());
        return Ok(());
    }

    let ndk = NdkSearch::from_env(cli.global.ndk_home.clone()).locate(&plan.ndk_version)?;
    let executor = SystemCommandExecutor;
    let env = BuildEnvironment {
        plan: &plan,
        ndk: &ndk,
        executor: &executor,
        jobs: cli.global.jobs,
    };

    if cli.global.dry_run {
        if cli.command == Command::Publish {
            open_repository(&plan.repository, &plan.project_root, None)?;
        }
        print_dry_run_info(cli.command, env, stderr);
        return Ok(());
    }

    let _lock = WorkDirLock::acquire(&plan.work_dir)?;
    let mut progress = Progress::new(stderr, cli.global.quiet);
    match cli.command {
        Command::StaticLibs => {
            static_libs_pipeline(env).run((), &mut progress)?;
        }
        Command::Build => {
            build_pipeline(env).run((), &mut progress)?;
        }
        Command::Publish => publish(&plan, env, &mut progress)?,
        Command::ShowConfig => {}
    }
    Ok(())
}

fn publish(
    plan: &BuildPlan,
    env: BuildEnvironment<'_>,
    progress: &mut Progress<'_>,
) -> Result<()> {
    let repository = open_repository(
        &plan.repository,
        &plan.project_root,
        Credentials::from_env(),
    )?;
    publish_pipeline(env, repository.as_ref(), timestamp_now()).run((), progress)?;
    Ok(())
}

/// Uses the given root or the current directory.
fn resolve_project_root(explicit: Option<Utf8PathBuf>) -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| PackagerError::NonUtf8Path {
        path: e.into_path_buf().display().to_string(),
    })?;
    Ok(match explicit {
        Some(root) => cwd.join(root),
        None => cwd,
    })
}

/// Loads the named description (which must exist) or the optional default.
fn load_config(cli: &Cli, project_root: &Utf8Path) -> Result<PackagerConfig> {
    let (path, required) = match &cli.global.config {
        Some(path) => (project_root.join(path), true),
        None => (project_root.join(DEFAULT_CONFIG_FILE), false),
    };
    Ok(PackagerConfig::load(&path, required)?.with_overrides(&cli.global.overrides()))
}

fn print_dry_run_info(command: Command, env: BuildEnvironment<'_>, stderr: &mut dyn Write) {
    let commands = match command {
        Command::StaticLibs => planned_static_commands(env),
        _ => planned_commands(env),
    };
    let info = DryRunInfo {
        plan: env.plan,
        ndk_root: env.ndk.root(),
        last_stage: command.last_stage(),
        commands: &commands,
    };
    write_line(stderr, info.display_text());
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_line(stderr, format!("error: {err}"));
            let mut rendered = err.to_string();
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                let text = cause.to_string();
                if !rendered.contains(&text) {
                    write_line(stderr, format!("  caused by: {text}"));
                    rendered.push_str(&text);
                }
                source = cause.source();
            }
            1
        }
    }
}
