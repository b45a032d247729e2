use crate::DeployArgs;
use colored::Colorize;
use nsdeploy::DeployOutcome;
use nsdeploy_config::{DeployConfig, FileSpec};

pub async fn handle(args: DeployArgs) -> anyhow::Result<()> {
    let loaded = super::load_config(args.config.as_deref())?.unwrap_or_default();
    let config = apply_args(loaded, args);

    println!(
        "{}",
        format!(
            "Deploying to {} with {}...",
            display_or_unset(&config.environment),
            display_or_unset(&config.method)
        )
        .blue()
        .bold()
    );

    let outcome = nsdeploy::deploy(&config).await?;
    print_outcome(&outcome);

    println!(
        "{} {}",
        "Finished".green().bold(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}

/// Command-line values win over the config file
fn apply_args(mut config: DeployConfig, args: DeployArgs) -> DeployConfig {
    let strings = [
        (args.method, &mut config.method),
        (args.environment, &mut config.environment),
        (args.account, &mut config.account),
        (args.email, &mut config.email),
        (args.password, &mut config.password),
        (args.role, &mut config.role),
    ];
    for (value, target) in strings {
        if let Some(value) = value {
            *target = value;
        }
    }

    if !args.files.is_empty() {
        config.file = FileSpec::Many(args.files);
    }
    if let Some(project) = args.project {
        config.file = FileSpec::One(project);
    }
    if let Some(base) = args.base {
        config.base = Some(base);
    }
    if let Some(path) = args.path {
        config.path = Some(path);
    }
    if let Some(cache_file) = args.cache_file {
        config.cache_file = cache_file;
    }
    config.strict_exit |= args.strict_exit;

    config
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() { "(unset)" } else { value }
}

fn print_outcome(outcome: &DeployOutcome) {
    match outcome {
        DeployOutcome::Uploaded(files) => {
            println!();
            println!("{}", format!("Uploaded {} file(s):", files.len()).bold());
            for file in files {
                println!(
                    "  {} {} -> {} ({})",
                    "✓".green(),
                    file.local.display(),
                    file.remote_path.to_string().cyan(),
                    file.file_id
                );
            }
        }
        DeployOutcome::Deployed(result) => {
            println!();
            match result.exit_code {
                Some(0) => println!("{}", "sdfcli finished".green()),
                Some(code) => println!(
                    "{}",
                    format!("sdfcli exited with status {}", code).yellow()
                ),
                None => println!("{}", "sdfcli was terminated by a signal".yellow()),
            }
        }
    }
}
