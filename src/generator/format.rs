use std::path::Path;
use std::process::Command;

/// Run `rustfmt` over a generated module in place.
pub fn format_module(path: &Path) -> anyhow::Result<()> {
    // Allow tests to override the rustfmt binary path without mutating PATH
    let rustfmt_bin =
        std::env::var("HATYPER_RUSTFMT_BIN").unwrap_or_else(|_| "rustfmt".to_string());

    let status = Command::new(&rustfmt_bin)
        .arg("--edition")
        .arg("2021")
        .arg(path)
        .status()
        .map_err(|e| anyhow::anyhow!("failed to run {rustfmt_bin}: {e}"))?;
    if !status.success() {
        anyhow::bail!("rustfmt failed on {}", path.display());
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::{Mutex, OnceLock};

    // Serialize environment mutations to avoid test races
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn with_stub(exit_code: i32) -> anyhow::Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let stub = dir.path().join("rustfmt");
        fs::write(&stub, format!("#!/bin/sh\nexit {exit_code}\n")).unwrap();
        let mut perms = fs::metadata(&stub).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&stub, perms).unwrap();
        let module = dir.path().join("hapt.rs");
        fs::write(&module, "pub struct A;\n").unwrap();

        let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        let old_bin = env::var("HATYPER_RUSTFMT_BIN").ok();
        env::set_var("HATYPER_RUSTFMT_BIN", &stub);
        let res = format_module(&module);
        match old_bin {
            Some(v) => env::set_var("HATYPER_RUSTFMT_BIN", v),
            None => env::remove_var("HATYPER_RUSTFMT_BIN"),
        }
        res
    }

    #[test]
    fn test_format_module_success() {
        assert!(with_stub(0).is_ok());
    }

    #[test]
    fn test_format_module_failure() {
        let err = with_stub(1).unwrap_err();
        assert!(err.to_string().contains("rustfmt failed"));
    }
}
