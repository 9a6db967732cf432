use std::process::Command;

/// Exposes build metadata to the binary as `BUILD_DATE`, `BUILD_COMMIT` and
/// `BUILD_BRANCH`. Outside a git checkout the git values read `unknown`.
fn main() {
    emit("BUILD_DATE", chrono::Utc::now().to_rfc3339());
    emit("BUILD_COMMIT", git(&["rev-parse", "--short", "HEAD"]));
    emit("BUILD_BRANCH", git(&["rev-parse", "--abbrev-ref", "HEAD"]));

    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=migrations");
}

fn emit(key: &str, value: String) {
    println!("cargo:rustc-env={key}={value}");
}

fn git(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|out| out.trim().to_owned())
        .filter(|out| !out.is_empty())
        .unwrap_or_else(|| "unknown".to_owned())
}
