use anyhow::{Result, anyhow};

#[cfg(feature = "completions")]
pub fn generate(shell: Option<String>) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::Shell;

    let shell_name = match shell {
        Some(s) => s,
        None => std::env::var("SHELL")
            .unwrap_or_else(|_| "bash".to_string())
            .rsplit('/')
            .next()
            .unwrap_or("bash")
            .to_string(),
    };

    let shell = match shell_name.as_str() {
        "pwsh" => Shell::PowerShell,
        other => other
            .parse::<Shell>()
            .map_err(|_| anyhow!("Unsupported shell: {}", other))?,
    };

    let mut cmd = crate::cli::Cli::command();
    clap_complete::generate(shell, &mut cmd, "vlesslinker", &mut std::io::stdout());

    Ok(())
}

#[cfg(not(feature = "completions"))]
pub fn generate(_shell: Option<String>) -> Result<()> {
    Err(anyhow!(
        "Completions feature not enabled at compile time. Rebuild with --features completions"
    ))
}
