use std::env;
use std::process;

use clankercage::logging::{default_log_path, init_file_logging, prune_logs, KEPT_LOGS};
use clankercage::{Args, LaunchError, Launcher};
use clap::Parser;
use instance_store::InstanceId;

fn main() {
    let args = Args::parse();
    let code = match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            1
        }
    };
    process::exit(code);
}

fn run(args: Args) -> Result<i32, LaunchError> {
    let project_dir = env::current_dir()
        .and_then(|dir| dir.canonicalize())
        .map_err(LaunchError::ProjectDir)?;
    let request = args.into_request(project_dir);
    let launcher = Launcher::from_env()?;

    let id = InstanceId::generate();
    let log_path = match &request.log_file {
        Some(path) => path.clone(),
        None => {
            let path = default_log_path(&launcher.cache_root, &id);
            if let Some(dir) = path.parent() {
                // Runs before the new log exists, so the limit counts earlier launches only.
                if let Err(err) = prune_logs(dir, KEPT_LOGS) {
                    eprintln!("warning: could not prune old logs in {}: {err}", dir.display());
                }
            }
            path
        }
    };
    if let Err(err) = init_file_logging(&log_path) {
        eprintln!("warning: logging to {} disabled: {err}", log_path.display());
    }

    launcher.launch(&request, id)
}
