//! Command-line interface for the userscript bundler.
//!
//! The CLI builds the project's userscript (once or in watch mode), prints
//! the generated metadata header, and reports the script directories of known
//! userscript managers.

use std::{
    env,
    path::{Path, PathBuf},
    process,
    time::Duration,
};

use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;
use userscript_bundler::{
    BuildConfig, BuildOutcome, EsbuildBundler, Error, UserscriptManager, load_config,
    load_manifest, parse_meta_overrides, render_header, resolve_metadata, run_build,
};

/// Command line interface for packaging userscripts.
#[derive(Debug, Parser,)]
#[command(
    name = "userscript-bundler",
    version,
    about = "Bundle a script entry point into a userscript",
    args_conflicts_with_subcommands = true
)]
/// Top-level CLI options parsed from user input.
struct Cli
{
    #[command(subcommand)]
    command: Option<Command,>,

    /// Build options used when no subcommand is given.
    #[command(flatten)]
    build: BuildArgs,
}

#[derive(Debug, Subcommand,)]
/// Supported commands exposed by the CLI.
enum Command
{
    /// Bundle the entry file into `<name>.user.js`.
    Build(BuildArgs,),
    /// Print the generated userscript header without bundling.
    Header(HeaderArgs,),
    /// Print the script directory of a userscript manager.
    #[command(name = "manager-dir")]
    ManagerDir(ManagerDirArgs,),
}

/// Options shared by configuration-aware commands.
#[derive(Debug, Args, Default, Clone,)]
struct ProjectArgs
{
    /// Project root containing package.json; defaults to the working
    /// directory.
    #[arg(long = "root", value_name = "DIR")]
    root: Option<PathBuf,>,

    /// YAML build configuration; defaults to `<root>/userscript.yaml` when
    /// present.
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf,>,

    /// Header override, repeatable; repeating a key produces a list.
    #[arg(long = "meta", value_name = "KEY=VALUE")]
    meta: Vec<String,>,
}

/// Arguments accepted by the `build` subcommand.
#[derive(Debug, Args, Default, Clone,)]
struct BuildArgs
{
    #[command(flatten)]
    project: ProjectArgs,

    /// Entry file to bundle.
    #[arg(long = "input", short = 'i', value_name = "PATH")]
    input: Option<PathBuf,>,

    /// Output directory for `<name>.user.js`.
    #[arg(long = "out-dir", short = 'o', value_name = "DIR")]
    out_dir: Option<PathBuf,>,

    /// Directory receiving a ` (Local)` copy after each build; repeatable.
    #[arg(long = "mirror", value_name = "DIR")]
    mirror: Vec<PathBuf,>,

    /// Userscript manager whose script directory receives a copy;
    /// repeatable.
    #[arg(long = "manager", value_name = "MANAGER")]
    manager: Vec<UserscriptManager,>,

    /// Keep rebuilding when sources change.
    #[arg(long = "watch", short = 'w', action = ArgAction::SetTrue)]
    watch: bool,

    /// esbuild executable to run instead of the project or PATH copy.
    #[arg(long = "esbuild", value_name = "PATH", env = "ESBUILD_BINARY_PATH")]
    esbuild: Option<PathBuf,>,
}

#[derive(Debug, Args,)]
struct HeaderArgs
{
    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Debug, Args,)]
struct ManagerDirArgs
{
    /// Userscript manager to look up.
    #[arg(value_name = "MANAGER")]
    manager: UserscriptManager,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    init_tracing();

    if let Err(error,) = run().await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_tracing()
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),);
    tracing_subscriber::fmt().with_env_filter(filter,).with_writer(std::io::stderr,).init();
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates configuration, bundler, and artifact errors.
async fn run() -> Result<(), Error,>
{
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Build(args,),) => run_build_command(args,).await,
        Some(Command::Header(args,),) => run_header(&args.project,),
        Some(Command::ManagerDir(args,),) => run_manager_dir(&args,),
        None => run_build_command(cli.build,).await,
    }
}

async fn run_build_command(args: BuildArgs,) -> Result<(), Error,>
{
    let root = resolve_root(args.project.root.as_deref(),)?;
    let mut config = load_project_config(&root, &args.project,)?;
    apply_build_args(&mut config, &args,)?;

    let esbuild = config.esbuild.clone();
    let request = config.into_request(root.clone(), dirs::home_dir().as_deref(),)?;
    let bundler = EsbuildBundler::locate(esbuild.as_deref(), &root,)?;

    if request.watch {
        if let BuildOutcome::Watching(handle,) = run_build(&request, &bundler,).await? {
            info!("Watching for changes, press Ctrl+C to stop");
            handle.wait().await?;
        }
        return Ok((),);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.yellow} [{elapsed_precise}] {msg}",)
            .expect("valid template",),
    );
    spinner.set_message(format!("Bundling {}...", request.input.display()),);
    spinner.enable_steady_tick(Duration::from_millis(100,),);

    let outcome = run_build(&request, &bundler,).await;
    spinner.finish_and_clear();

    if let BuildOutcome::Completed(report,) = outcome? {
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }
        println!("{}", report.outfile.display());
    }

    Ok((),)
}

fn run_header(args: &ProjectArgs,) -> Result<(), Error,>
{
    let root = resolve_root(args.root.as_deref(),)?;
    println!("{}", project_header(&root, args)?);
    Ok((),)
}

fn run_manager_dir(args: &ManagerDirArgs,) -> Result<(), Error,>
{
    let home = dirs::home_dir()
        .ok_or_else(|| Error::validation("cannot determine the home directory",),)?;
    println!("{}", args.manager.scripts_dir(&home).display());
    Ok((),)
}

/// Renders the header the build would use for the project at `root`.
fn project_header(root: &Path, args: &ProjectArgs,) -> Result<String, Error,>
{
    let mut config = load_project_config(root, args,)?;
    config.metadata.merge(&parse_meta_overrides(&args.meta,)?,);

    let manifest = load_manifest(root,)?;
    let resolved = resolve_metadata(&manifest, &config.metadata,)?;
    Ok(render_header(&resolved.record,),)
}

/// Absolute project root: `--root` against the working directory, or the
/// working directory itself.
fn resolve_root(root: Option<&Path,>,) -> Result<PathBuf, Error,>
{
    match root {
        Some(root,) => std::path::absolute(root,).map_err(|error| {
            Error::validation(format!("cannot resolve project root {}: {error}", root.display()),)
        },),
        None => env::current_dir().map_err(|error| {
            Error::validation(format!("cannot determine the working directory: {error}"),)
        },),
    }
}

fn load_project_config(root: &Path, args: &ProjectArgs,) -> Result<BuildConfig, Error,>
{
    match args.config.as_deref() {
        Some(path,) if path.is_absolute() => load_config(path,),
        Some(path,) => load_config(&root.join(path,),),
        None => BuildConfig::discover(root,),
    }
}

/// Layers command-line values over the configuration file.
fn apply_build_args(config: &mut BuildConfig, args: &BuildArgs,) -> Result<(), Error,>
{
    if let Some(input,) = args.input.as_ref() {
        config.input = Some(input.clone(),);
    }
    if let Some(out_dir,) = args.out_dir.as_ref() {
        config.out_dir = Some(out_dir.clone(),);
    }
    if let Some(esbuild,) = args.esbuild.as_ref() {
        config.esbuild = Some(esbuild.clone(),);
    }
    config.mirror_dirs.extend(args.mirror.iter().cloned(),);
    for manager in &args.manager {
        if !config.mirror_managers.contains(manager,) {
            config.mirror_managers.push(*manager,);
        }
    }
    config.watch |= args.watch;
    config.metadata.merge(&parse_meta_overrides(&args.project.meta,)?,);
    Ok((),)
}
