use std::io;

/// Open `url` in the user's default browser without blocking on the
/// spawned process.
pub async fn open_browser(url: &str) -> io::Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        let mut cmd = tokio::process::Command::new("open");
        cmd.arg(url);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = tokio::process::Command::new("cmd");
        cmd.args(["/C", "start", "", url]);
        cmd
    } else {
        let mut cmd = tokio::process::Command::new("xdg-open");
        cmd.arg(url);
        cmd
    };

    let status = command
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await?;

    if !status.success() {
        return Err(io::Error::other(format!(
            "browser launcher exited with {status}"
        )));
    }

    Ok(())
}
