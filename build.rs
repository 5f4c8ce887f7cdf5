use std::process::Command;

fn main() {
    let version = get_version_from_git();
    println!("cargo:rustc-env=PBDECRYPT_VERSION={}", version);

    if std::path::Path::new(".git").exists() {
        println!("cargo:rerun-if-changed=.git/HEAD");
        println!("cargo:rerun-if-changed=.git/refs");
    }
}

fn get_version_from_git() -> String {
    let package_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into());

    if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
    {
        if output.status.success() {
            let describe = String::from_utf8_lossy(&output.stdout).trim().to_string();
            // Tagged builds report the tag, everything else is a dev build of the package version.
            if describe.starts_with('v') && !describe.contains("-g") {
                return describe;
            }
            return format!("{}-dev+{}", package_version, describe);
        }
    }

    if let Ok(commit) = std::env::var("GIT_COMMIT") {
        if !commit.is_empty() {
            return format!("{}-dev+{}", package_version, commit);
        }
    }

    package_version
}
